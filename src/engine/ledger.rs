// ==========================================
// 石材加工生产追踪系统 - 生产作业账本
// ==========================================
// 职责: 持有逐荒料逐工序作业记录的权威集合，执行状态流转
// 状态机: PENDING → IN_PROGRESS → {COMPLETED|SKIPPED|DEFECTIVE|CANCELLED}
//         IN_PROGRESS ⇄ PAUSED；终态对该作业实例永久
// 红线: 建单前先过准入解析器；槽位唯一性与插入在同一原子单元内；
//       抛光完工触发货架入库是账本唯一的跨组件副作用
// ==========================================

use crate::domain::block::Block;
use crate::domain::inventory::FinishedGood;
use crate::domain::job::{ProductionJob, StageMeasurement};
use crate::domain::types::{BlockStatus, JobStatus, Stage};
use crate::engine::allocator::StandAllocator;
use crate::engine::eligibility::EligibilityResolver;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::measurement::MeasurementCalculator;
use crate::repository::{BlockRepository, JobRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// 请求结构
// ==========================================

/// 建单请求
#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    pub block_id: String,
    pub stage: Stage,
    pub start_time: Option<DateTime<Utc>>, // 提供则直接 IN_PROGRESS，否则 PENDING
    pub measurement: Option<StageMeasurement>,
    pub comment: Option<String>,
}

/// 作业更新补丁（None 字段保持原值）
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub measurement: Option<StageMeasurement>,
    pub comment: Option<String>,
    pub slab_count: Option<i64>,
}

// ==========================================
// ProductionLedger - 生产作业账本
// ==========================================

/// 生产作业账本
pub struct ProductionLedger {
    block_repo: Arc<BlockRepository>,
    job_repo: Arc<JobRepository>,
    allocator: Arc<StandAllocator>,
}

impl ProductionLedger {
    /// 创建新的账本实例
    pub fn new(
        block_repo: Arc<BlockRepository>,
        job_repo: Arc<JobRepository>,
        allocator: Arc<StandAllocator>,
    ) -> Self {
        Self {
            block_repo,
            job_repo,
            allocator,
        }
    }

    /// 状态转换合法性
    fn transition_allowed(from: JobStatus, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (from, to),
            (Pending, InProgress)
                | (Pending, Cancelled)
                | (Pending, Skipped)
                | (InProgress, Paused)
                | (InProgress, Completed)
                | (InProgress, Skipped)
                | (InProgress, Defective)
                | (InProgress, Cancelled)
                | (Paused, InProgress)
                | (Paused, Cancelled)
        )
    }

    /// 切割面积抄传
    ///
    /// 化学/环氧读取该荒料最近一次已完成切割作业的权威面积；
    /// 无已完成切割作业时为空（依赖比率降级为空，不报错）
    fn propagated_area(&self, block_id: &str, stage: Stage) -> EngineResult<Option<f64>> {
        if !matches!(stage, Stage::ChemicalConversion | Stage::Epoxy) {
            return Ok(None);
        }

        let area = self
            .job_repo
            .find_latest_completed(block_id, Stage::Cutting)?
            .and_then(|job| match job.measurement {
                Some(StageMeasurement::Cutting(m)) => Some(m.total_area_sqft),
                _ => None,
            });

        Ok(area)
    }

    /// 查询可进入指定工序的荒料列表
    ///
    /// 准入规则通过且该工序无活动作业的荒料（已完结荒料不参与）
    pub fn list_eligible_blocks(&self, stage: Stage) -> EngineResult<Vec<Block>> {
        let blocks = self.block_repo.list_all()?;
        let mut eligible = Vec::new();

        for block in blocks {
            if block.status == BlockStatus::Completed {
                continue;
            }

            let jobs = self.job_repo.list_by_block(&block.block_id)?;
            let latest = EligibilityResolver::latest_status_by_stage(&jobs);

            if EligibilityResolver::resolve_stage(stage, &latest).eligible
                && !EligibilityResolver::has_active_job(stage, &latest)
            {
                eligible.push(block);
            }
        }

        Ok(eligible)
    }

    /// 创建作业
    ///
    /// # 失败
    /// - IneligibleStage: 准入解析器拒绝（附原因）
    /// - ActiveJobExists: 该槽位已有非终态作业（事务内原子判定）
    #[instrument(skip(self, request), fields(block_id = %request.block_id, stage = %request.stage))]
    pub fn create_job(&self, request: CreateJobRequest) -> EngineResult<ProductionJob> {
        let block = self
            .block_repo
            .find_by_id(&request.block_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Block".to_string(),
                id: request.block_id.clone(),
            })?;

        // 准入判定（前置工序规则）
        let jobs = self.job_repo.list_by_block(&request.block_id)?;
        let latest = EligibilityResolver::latest_status_by_stage(&jobs);
        let decision = EligibilityResolver::resolve_stage(request.stage, &latest);
        if !decision.eligible {
            return Err(EngineError::IneligibleStage {
                block_id: request.block_id.clone(),
                stage: request.stage.to_db_str().to_string(),
                reasons: decision.reasons,
            });
        }

        // 计量负载工序一致性 + 派生
        let measurement = match &request.measurement {
            Some(m) => {
                if m.stage() != request.stage {
                    return Err(EngineError::Validation(format!(
                        "计量负载工序不匹配: payload={}, job={}",
                        m.stage(),
                        request.stage
                    )));
                }
                let propagated = self.propagated_area(&request.block_id, request.stage)?;
                let (derived, warnings) =
                    MeasurementCalculator::derive(m, request.start_time, None, propagated)?;
                for w in warnings {
                    warn!(block_id = %request.block_id, stage = %request.stage, "{w}");
                }
                Some(derived)
            }
            None => None,
        };

        let mut job = ProductionJob::new(&request.block_id, request.stage);
        job.status = if request.start_time.is_some() {
            JobStatus::InProgress
        } else {
            JobStatus::Pending
        };
        job.start_time = request.start_time;
        job.measurement = measurement;
        job.comment = request.comment;

        // 槽位检查与插入在同一事务内（ActiveSlotOccupied → ActiveJobExists）
        self.job_repo.insert_with_slot_check(&job)?;

        // 首个作业将荒料推入加工中
        if block.status == BlockStatus::InStock {
            self.block_repo
                .update_status(&block.block_id, BlockStatus::Processing)?;
        }

        info!(job_id = %job.job_id, status = %job.status, "作业已创建");

        Ok(job)
    }

    /// 更新作业
    ///
    /// # 失败
    /// - InvalidTransition: 从终态迁出或非法转换边
    /// - ValidationError: 完成缺 end_time / 跳过缺原因 / 计量字段非法
    /// - EndBeforeStart: 结束时间早于开始时间
    #[instrument(skip(self, patch), fields(job_id = %job_id))]
    pub fn update_job(&self, job_id: &str, patch: JobUpdate) -> EngineResult<ProductionJob> {
        let job = self
            .job_repo
            .find_by_id(job_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "ProductionJob".to_string(),
                id: job_id.to_string(),
            })?;

        // 终态作业只读：状态迁出是 InvalidTransition，其余字段修改一律拒绝
        if job.status.is_terminal() {
            if let Some(new_status) = patch.status {
                if new_status != job.status {
                    return Err(EngineError::InvalidTransition {
                        from: job.status.to_db_str().to_string(),
                        to: new_status.to_db_str().to_string(),
                    });
                }
            }
            let has_field_edit = patch.start_time.is_some()
                || patch.end_time.is_some()
                || patch.measurement.is_some()
                || patch.comment.is_some()
                || patch.slab_count.is_some();
            if has_field_edit {
                return Err(EngineError::Validation(format!(
                    "终态作业不可修改: status={}",
                    job.status
                )));
            }
            return Ok(job);
        }

        let mut updated = job.clone();

        // 状态流转校验
        if let Some(new_status) = patch.status {
            if new_status != job.status {
                if !Self::transition_allowed(job.status, new_status) {
                    return Err(EngineError::InvalidTransition {
                        from: job.status.to_db_str().to_string(),
                        to: new_status.to_db_str().to_string(),
                    });
                }
                updated.status = new_status;
            }
        }

        if let Some(start) = patch.start_time {
            updated.start_time = Some(start);
        }
        if let Some(end) = patch.end_time {
            updated.end_time = Some(end);
        }

        // 时间一致性（完成与否均不允许倒序）
        MeasurementCalculator::duration_minutes("end_time", updated.start_time, updated.end_time)?;

        if updated.status == JobStatus::Completed && updated.end_time.is_none() {
            return Err(EngineError::Validation(
                "转入 COMPLETED 必须提供 end_time".to_string(),
            ));
        }

        if let Some(comment) = patch.comment {
            updated.comment = Some(comment);
        }

        if updated.status == JobStatus::Skipped {
            // 跳过需操作员说明原因；计量置空（区别于"测得为零"）
            let has_reason = updated
                .comment
                .as_deref()
                .map(|c| !c.trim().is_empty())
                .unwrap_or(false);
            if !has_reason {
                return Err(EngineError::Validation(
                    "转入 SKIPPED 必须提供跳过原因 (comment)".to_string(),
                ));
            }
            updated.measurement = None;
        } else {
            // 提交新计量或对既有计量重新派生（抄传面积随最新状态刷新）
            let source = patch.measurement.or_else(|| job.measurement.clone());
            if let Some(m) = source {
                if m.stage() != job.stage {
                    return Err(EngineError::Validation(format!(
                        "计量负载工序不匹配: payload={}, job={}",
                        m.stage(),
                        job.stage
                    )));
                }
                let propagated = self.propagated_area(&job.block_id, job.stage)?;
                let (derived, warnings) = MeasurementCalculator::derive(
                    &m,
                    updated.start_time,
                    updated.end_time,
                    propagated,
                )?;
                for w in warnings {
                    warn!(job_id = %job.job_id, stage = %job.stage, "{w}");
                }
                updated.measurement = Some(derived);
            }
        }

        if let Some(count) = patch.slab_count {
            if count < 0 {
                return Err(EngineError::Validation(format!(
                    "大板数不能为负: {count}"
                )));
            }
            updated.slab_count = Some(count);
        }

        self.job_repo.update(&updated)?;

        info!(status = %updated.status, "作业已更新");

        Ok(updated)
    }

    /// 抛光完工并入库
    ///
    /// 账本唯一的跨组件副作用：先过货架容量校验，校验失败作业保持原状；
    /// 入库成功后作业转入 COMPLETED
    #[instrument(skip(self), fields(job_id = %job_id, stand_id = %stand_id))]
    pub fn complete_polishing(
        &self,
        job_id: &str,
        slab_count: i64,
        stand_id: &str,
    ) -> EngineResult<(ProductionJob, FinishedGood)> {
        let job = self
            .job_repo
            .find_by_id(job_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "ProductionJob".to_string(),
                id: job_id.to_string(),
            })?;

        if job.stage != Stage::Polishing {
            return Err(EngineError::Validation(format!(
                "仅抛光作业可入库完工: job stage={}",
                job.stage
            )));
        }

        if !Self::transition_allowed(job.status, JobStatus::Completed) {
            return Err(EngineError::InvalidTransition {
                from: job.status.to_db_str().to_string(),
                to: JobStatus::Completed.to_db_str().to_string(),
            });
        }

        if slab_count <= 0 {
            return Err(EngineError::Validation(format!(
                "入库板数必须为正: {slab_count}"
            )));
        }

        let block = self
            .block_repo
            .find_by_id(&job.block_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Block".to_string(),
                id: job.block_id.clone(),
            })?;

        // 完工时间确定后先重派生计量（时长等随终止时间刷新），
        // 派生失败时作业与库存均保持原状
        let end_time = job.end_time.unwrap_or_else(Utc::now);
        let measurement = match &job.measurement {
            Some(m) => {
                let (derived, warnings) =
                    MeasurementCalculator::derive(m, job.start_time, Some(end_time), None)?;
                for w in warnings {
                    warn!(job_id = %job.job_id, "{w}");
                }
                Some(derived)
            }
            None => None,
        };

        // 容量校验失败则此处直接返回，作业状态不动
        let good =
            self.allocator
                .check_in(stand_id, &job.block_id, block.color.clone(), slab_count)?;

        let mut updated = job;
        updated.status = JobStatus::Completed;
        updated.end_time = Some(end_time);
        updated.slab_count = Some(slab_count);
        updated.measurement = measurement;
        if let Some(StageMeasurement::Polishing(ref mut m)) = updated.measurement {
            m.slab_count = Some(slab_count);
        }

        // 入库与完工分属两个原子单元，后者失败时撤销前者的入库记录，
        // 避免货架占用与作业状态出现不一致
        if let Err(err) = self.job_repo.update(&updated) {
            warn!(good_id = %good.good_id, "作业完工写入失败，撤销本次入库");
            if let Err(revoke_err) = self.allocator.revoke_check_in(&good.good_id) {
                warn!(good_id = %good.good_id, %revoke_err, "入库补偿失败");
            }
            return Err(err.into());
        }

        info!(good_id = %good.good_id, slab_count, "抛光完工并入库");

        Ok((updated, good))
    }

    /// 按 ID 查询作业
    pub fn get_job(&self, job_id: &str) -> EngineResult<Option<ProductionJob>> {
        Ok(self.job_repo.find_by_id(job_id)?)
    }

    /// 查询荒料的作业历史
    pub fn list_jobs_for_block(&self, block_id: &str) -> EngineResult<Vec<ProductionJob>> {
        Ok(self.job_repo.list_by_block(block_id)?)
    }
}
