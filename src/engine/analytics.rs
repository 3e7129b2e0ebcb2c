// ==========================================
// 石材加工生产追踪系统 - 聚合统计
// ==========================================
// 职责: 只读滚动汇总（吞吐、完成率、平均周期），按需重算，不落缓存
// 红线: 绝不持锁、绝不写库；共享连接串行化保证读到一致快照
// 口径: 全局完成率取各工序完成率的等权平均（避免大工序吞掉头条数字）
// ==========================================

use crate::domain::types::{JobStatus, Stage};
use crate::engine::allocator::good_area_sqft;
use crate::engine::error::EngineResult;
use crate::repository::{BlockRepository, FinishedGoodRepository, JobRepository, StandRepository};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

// ==========================================
// 统计结构
// ==========================================

/// 单工序统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageStat {
    pub stage: Stage,
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub in_progress_jobs: i64,
    pub completion_rate: f64, // total 为 0 时为 0，绝不除零
    pub average_processing_minutes: Option<f64>, // 仅统计两端时间齐备的已完成作业
    pub total_slabs: i64,
}

/// 全局汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total_active_jobs: i64,
    pub total_completed_jobs: i64,
    pub overall_completion_rate: f64, // 各工序完成率等权平均
}

/// 工序统计响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageAnalytics {
    pub stages: Vec<StageStat>,
    pub summary: PipelineSummary,
}

/// 库存汇总响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_area_sqft: f64,
    pub occupied_stands: i64,
    pub total_stands: i64,
    pub quality_distribution: BTreeMap<String, i64>, // 颜色/品级 → 剩余板数
}

// ==========================================
// AnalyticsAggregator - 聚合统计器
// ==========================================

/// 聚合统计器
pub struct AnalyticsAggregator {
    job_repo: Arc<JobRepository>,
    stand_repo: Arc<StandRepository>,
    good_repo: Arc<FinishedGoodRepository>,
    block_repo: Arc<BlockRepository>,
}

impl AnalyticsAggregator {
    /// 创建新的聚合统计器实例
    pub fn new(
        job_repo: Arc<JobRepository>,
        stand_repo: Arc<StandRepository>,
        good_repo: Arc<FinishedGoodRepository>,
        block_repo: Arc<BlockRepository>,
    ) -> Self {
        Self {
            job_repo,
            stand_repo,
            good_repo,
            block_repo,
        }
    }

    /// 各工序吞吐统计 + 全局汇总
    pub fn get_stage_analytics(&self) -> EngineResult<StageAnalytics> {
        let jobs = self.job_repo.list_all()?;

        let mut stages = Vec::with_capacity(Stage::ALL.len());
        for stage in Stage::ALL {
            let stage_jobs: Vec<_> = jobs.iter().filter(|j| j.stage == stage).collect();

            let total_jobs = stage_jobs.len() as i64;
            let completed_jobs = stage_jobs
                .iter()
                .filter(|j| j.status == JobStatus::Completed)
                .count() as i64;
            let in_progress_jobs = stage_jobs
                .iter()
                .filter(|j| j.status == JobStatus::InProgress)
                .count() as i64;

            let completion_rate = if total_jobs > 0 {
                completed_jobs as f64 / total_jobs as f64
            } else {
                0.0
            };

            // 平均处理时长: 已完成且两端时间齐备的作业
            let durations: Vec<i64> = stage_jobs
                .iter()
                .filter(|j| j.status == JobStatus::Completed)
                .filter_map(|j| match (j.start_time, j.end_time) {
                    (Some(s), Some(e)) => Some((e - s).num_minutes()),
                    _ => None,
                })
                .collect();
            let average_processing_minutes = if durations.is_empty() {
                None
            } else {
                Some(durations.iter().sum::<i64>() as f64 / durations.len() as f64)
            };

            let total_slabs = stage_jobs.iter().filter_map(|j| j.slab_count).sum();

            stages.push(StageStat {
                stage,
                total_jobs,
                completed_jobs,
                in_progress_jobs,
                completion_rate,
                average_processing_minutes,
                total_slabs,
            });
        }

        let total_active_jobs = stages.iter().map(|s| s.in_progress_jobs).sum();
        let total_completed_jobs = stages.iter().map(|s| s.completed_jobs).sum();
        let overall_completion_rate =
            stages.iter().map(|s| s.completion_rate).sum::<f64>() / stages.len() as f64;

        Ok(StageAnalytics {
            stages,
            summary: PipelineSummary {
                total_active_jobs,
                total_completed_jobs,
                overall_completion_rate,
            },
        })
    }

    /// 库存汇总: 在库总面积、货架占用、品级分布
    ///
    /// 仅统计剩余板数 > 0 的成品记录（清零记录已逻辑移除）
    pub fn get_inventory_summary(&self) -> EngineResult<InventorySummary> {
        let goods = self.good_repo.list_live()?;
        let total_stands = self.stand_repo.count()?;
        let occupied_stands = self.good_repo.occupied_stand_count()?;

        // 荒料尺寸查一次复用（同一荒料多批成品常见）
        let mut block_cache = HashMap::new();

        let mut total_area_sqft = 0.0;
        let mut quality_distribution: BTreeMap<String, i64> = BTreeMap::new();

        for good in &goods {
            if !block_cache.contains_key(&good.block_id) {
                let block = self.block_repo.find_by_id(&good.block_id)?;
                block_cache.insert(good.block_id.clone(), block);
            }

            if let Some(block) = &block_cache[&good.block_id] {
                if let Some(area) = good_area_sqft(block, good.slab_count) {
                    total_area_sqft += area;
                }
            }

            let grade = good
                .color_grade
                .clone()
                .unwrap_or_else(|| "UNGRADED".to_string());
            *quality_distribution.entry(grade).or_insert(0) += good.slab_count;
        }

        Ok(InventorySummary {
            total_area_sqft,
            occupied_stands,
            total_stands,
            quality_distribution,
        })
    }
}
