// ==========================================
// 石材加工生产追踪系统 - 工序准入解析器
// ==========================================
// 职责: 根据荒料作业历史判定可进入的工序（纯函数，不写库）
// 规则按工序逐级评估，每级只看各前置工序的"最新"作业:
// - 切割: 入口工序，始终可入
// - 磨抛: 最新切割作业 COMPLETED
// - 化学转化 / 环氧: 磨抛 COMPLETED 或 SKIPPED（相互独立的可选工序）
// - 抛光: 磨抛 COMPLETED/SKIPPED，且化学与环氧各自"未做过/COMPLETED/SKIPPED"
// 红线: DEFECTIVE 不解锁下游；所有判定必须输出 reason
// ==========================================

use crate::domain::job::ProductionJob;
use crate::domain::types::{JobStatus, Stage};
use std::collections::HashMap;

// ==========================================
// EligibilityDecision - 准入判定结果
// ==========================================

/// 准入判定结果（带可解释原因）
#[derive(Debug, Clone)]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub reasons: Vec<String>,
}

impl EligibilityDecision {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            eligible: true,
            reasons: vec![reason.into()],
        }
    }

    fn deny(reasons: Vec<String>) -> Self {
        Self {
            eligible: false,
            reasons,
        }
    }
}

// ==========================================
// EligibilityResolver - 工序准入解析器
// ==========================================
// 纯静态函数集合
pub struct EligibilityResolver;

impl EligibilityResolver {
    /// 从作业历史提取各工序的最新作业状态
    ///
    /// 作业历史按创建时间升序传入（JobRepository::list_by_block 保证），
    /// 后写覆盖前写即得最新
    pub fn latest_status_by_stage(jobs: &[ProductionJob]) -> HashMap<Stage, JobStatus> {
        let mut latest = HashMap::new();
        for job in jobs {
            latest.insert(job.stage, job.status);
        }
        latest
    }

    /// 判定目标工序是否可创建新作业（仅前置工序规则）
    ///
    /// 同工序活动作业的占用由账本层的原子槽位检查负责，
    /// 此处不重复判定（两类拒绝需要区分错误码）
    pub fn resolve_stage(
        stage: Stage,
        latest: &HashMap<Stage, JobStatus>,
    ) -> EligibilityDecision {
        match stage {
            Stage::Cutting => EligibilityDecision::allow("OK: 入口工序"),

            Stage::Grinding => match latest.get(&Stage::Cutting) {
                Some(JobStatus::Completed) => EligibilityDecision::allow("OK: 切割已完成"),
                Some(status) => EligibilityDecision::deny(vec![format!(
                    "BLOCKED: 最新切割作业未完成 (status={status})"
                )]),
                None => EligibilityDecision::deny(vec![
                    "BLOCKED: 尚无切割作业".to_string(),
                ]),
            },

            Stage::ChemicalConversion | Stage::Epoxy => {
                match latest.get(&Stage::Grinding) {
                    Some(status) if status.satisfies_downstream() => {
                        EligibilityDecision::allow(format!("OK: 磨抛已达终态 (status={status})"))
                    }
                    Some(status) => EligibilityDecision::deny(vec![format!(
                        "BLOCKED: 最新磨抛作业未达 COMPLETED/SKIPPED (status={status})"
                    )]),
                    None => EligibilityDecision::deny(vec![
                        "BLOCKED: 尚无磨抛作业".to_string(),
                    ]),
                }
            }

            Stage::Polishing => {
                let mut reasons = Vec::new();

                match latest.get(&Stage::Grinding) {
                    Some(status) if status.satisfies_downstream() => {}
                    Some(status) => reasons.push(format!(
                        "BLOCKED: 最新磨抛作业未达 COMPLETED/SKIPPED (status={status})"
                    )),
                    None => reasons.push("BLOCKED: 尚无磨抛作业".to_string()),
                }

                // 可选前置工序: 未做过不阻塞，做过则须达到非阻塞终态
                for optional in [Stage::ChemicalConversion, Stage::Epoxy] {
                    if let Some(status) = latest.get(&optional) {
                        if !status.satisfies_downstream() {
                            reasons.push(format!(
                                "BLOCKED: {optional} 未达 COMPLETED/SKIPPED (status={status})"
                            ));
                        }
                    }
                }

                if reasons.is_empty() {
                    EligibilityDecision::allow("OK: 全部前置工序已达非阻塞终态")
                } else {
                    EligibilityDecision::deny(reasons)
                }
            }
        }
    }

    /// 目标工序是否存在活动（非终态）作业
    pub fn has_active_job(stage: Stage, latest: &HashMap<Stage, JobStatus>) -> bool {
        latest.get(&stage).is_some_and(|status| status.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::ProductionJob;

    fn job(block_id: &str, stage: Stage, status: JobStatus) -> ProductionJob {
        let mut j = ProductionJob::new(block_id, stage);
        j.status = status;
        j
    }

    fn latest_of(jobs: &[ProductionJob]) -> HashMap<Stage, JobStatus> {
        EligibilityResolver::latest_status_by_stage(jobs)
    }

    #[test]
    fn test_cutting_always_eligible() {
        let decision = EligibilityResolver::resolve_stage(Stage::Cutting, &HashMap::new());
        assert!(decision.eligible);
    }

    #[test]
    fn test_grinding_requires_completed_cutting() {
        // 无切割作业 → 不可入
        let decision = EligibilityResolver::resolve_stage(Stage::Grinding, &HashMap::new());
        assert!(!decision.eligible);

        // 切割进行中 → 不可入
        let jobs = [job("B1", Stage::Cutting, JobStatus::InProgress)];
        let decision = EligibilityResolver::resolve_stage(Stage::Grinding, &latest_of(&jobs));
        assert!(!decision.eligible);

        // 切割完成 → 可入
        let jobs = [job("B1", Stage::Cutting, JobStatus::Completed)];
        let decision = EligibilityResolver::resolve_stage(Stage::Grinding, &latest_of(&jobs));
        assert!(decision.eligible);

        // 切割 SKIPPED 不等于 COMPLETED → 磨抛仍不可入
        let jobs = [job("B1", Stage::Cutting, JobStatus::Skipped)];
        let decision = EligibilityResolver::resolve_stage(Stage::Grinding, &latest_of(&jobs));
        assert!(!decision.eligible);
    }

    #[test]
    fn test_chemical_and_epoxy_accept_skipped_grinding() {
        let jobs = [
            job("B1", Stage::Cutting, JobStatus::Completed),
            job("B1", Stage::Grinding, JobStatus::Skipped),
        ];
        let latest = latest_of(&jobs);
        assert!(EligibilityResolver::resolve_stage(Stage::ChemicalConversion, &latest).eligible);
        assert!(EligibilityResolver::resolve_stage(Stage::Epoxy, &latest).eligible);
    }

    #[test]
    fn test_polishing_optional_stages_absent_do_not_block() {
        // 场景: 磨抛 SKIPPED，化学 COMPLETED，环氧未做过 → 抛光可入
        let jobs = [
            job("B2", Stage::Cutting, JobStatus::Completed),
            job("B2", Stage::Grinding, JobStatus::Skipped),
            job("B2", Stage::ChemicalConversion, JobStatus::Completed),
        ];
        let decision = EligibilityResolver::resolve_stage(Stage::Polishing, &latest_of(&jobs));
        assert!(decision.eligible, "环氧缺席不应阻塞抛光: {:?}", decision.reasons);
    }

    #[test]
    fn test_polishing_blocked_by_active_chemical() {
        let jobs = [
            job("B1", Stage::Cutting, JobStatus::Completed),
            job("B1", Stage::Grinding, JobStatus::Completed),
            job("B1", Stage::ChemicalConversion, JobStatus::InProgress),
        ];
        let decision = EligibilityResolver::resolve_stage(Stage::Polishing, &latest_of(&jobs));
        assert!(!decision.eligible);
    }

    #[test]
    fn test_defective_does_not_unlock_downstream() {
        // 切割 DEFECTIVE → 磨抛不可入
        let jobs = [job("B1", Stage::Cutting, JobStatus::Defective)];
        let decision = EligibilityResolver::resolve_stage(Stage::Grinding, &latest_of(&jobs));
        assert!(!decision.eligible);

        // 磨抛 DEFECTIVE → 抛光不可入
        let jobs = [
            job("B1", Stage::Cutting, JobStatus::Completed),
            job("B1", Stage::Grinding, JobStatus::Defective),
        ];
        let decision = EligibilityResolver::resolve_stage(Stage::Polishing, &latest_of(&jobs));
        assert!(!decision.eligible);

        // 重试作业完成后解锁
        let jobs = [
            job("B1", Stage::Cutting, JobStatus::Completed),
            job("B1", Stage::Grinding, JobStatus::Defective),
            job("B1", Stage::Grinding, JobStatus::Completed),
        ];
        let decision = EligibilityResolver::resolve_stage(Stage::Polishing, &latest_of(&jobs));
        assert!(decision.eligible);
    }

    #[test]
    fn test_monotonicity_terminal_state_keeps_downstream_unlocked() {
        // 切割完成后，追加下游作业不会让磨抛回退为不可入
        let mut jobs = vec![job("B1", Stage::Cutting, JobStatus::Completed)];
        assert!(
            EligibilityResolver::resolve_stage(Stage::Grinding, &latest_of(&jobs)).eligible
        );

        jobs.push(job("B1", Stage::Grinding, JobStatus::Completed));
        jobs.push(job("B1", Stage::ChemicalConversion, JobStatus::Completed));
        assert!(
            EligibilityResolver::resolve_stage(Stage::Grinding, &latest_of(&jobs)).eligible
        );
    }

    #[test]
    fn test_has_active_job() {
        let jobs = [job("B1", Stage::Cutting, JobStatus::Paused)];
        let latest = latest_of(&jobs);
        assert!(EligibilityResolver::has_active_job(Stage::Cutting, &latest));
        assert!(!EligibilityResolver::has_active_job(Stage::Grinding, &latest));
    }
}
