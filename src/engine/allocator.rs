// ==========================================
// 石材加工生产追踪系统 - 货架容量分配器
// ==========================================
// 职责: 在并发入库/出库下维持货架容量不变量
// 不变量: 任意货架 sum(finished_good.slab_count) ≤ max_capacity
//         任意成品 slab_count ≥ 0
// 并发: 校验与写入由仓储层在单个 BEGIN IMMEDIATE 事务内完成，
//       绝不跨两次往返做"先读后写"
// ==========================================

use crate::domain::block::Block;
use crate::domain::inventory::{FinishedGood, Shipment};
use crate::domain::types::{BlockStatus, JobStatus, Stage};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{BlockRepository, FinishedGoodRepository, JobRepository, StandRepository};
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// 面积换算（纯函数）
// ==========================================
// 英寸按四分之一英寸取整后换算为英尺；
// 面积 = 长(ft) × 高(ft) × 板数。入库汇报与聚合汇报复用同一函数

/// 英寸 → 英尺（四分之一英寸档取整）
pub fn inches_to_feet(inches: f64) -> f64 {
    let quarter_rounded = (inches * 4.0).round() / 4.0;
    quarter_rounded / 12.0
}

/// 成品面积（平方英尺）= 长(ft) × 高(ft) × 板数
pub fn slab_area_sqft(length_in: f64, height_in: f64, slab_count: i64) -> f64 {
    inches_to_feet(length_in) * inches_to_feet(height_in) * slab_count as f64
}

/// 按荒料尺寸计算成品面积；尺寸缺失时无定义
pub fn good_area_sqft(block: &Block, slab_count: i64) -> Option<f64> {
    match (block.length_in, block.height_in) {
        (Some(length), Some(height)) => Some(slab_area_sqft(length, height, slab_count)),
        _ => None,
    }
}

// ==========================================
// StandAllocator - 货架容量分配器
// ==========================================

/// 货架容量分配器
///
/// 入库入口有两个：抛光完工（账本层触发）与人工入库（API 层），
/// 两者都经由 check_in 走同一条原子校验路径
pub struct StandAllocator {
    stand_repo: Arc<StandRepository>,
    good_repo: Arc<FinishedGoodRepository>,
    block_repo: Arc<BlockRepository>,
    job_repo: Arc<JobRepository>,
}

impl StandAllocator {
    /// 创建新的分配器实例
    pub fn new(
        stand_repo: Arc<StandRepository>,
        good_repo: Arc<FinishedGoodRepository>,
        block_repo: Arc<BlockRepository>,
        job_repo: Arc<JobRepository>,
    ) -> Self {
        Self {
            stand_repo,
            good_repo,
            block_repo,
            job_repo,
        }
    }

    /// 成品入库
    ///
    /// # 参数
    /// - stand_id: 目标货架
    /// - block_id: 来源荒料
    /// - color_grade: 颜色/品级
    /// - slab_count: 入库板数（>0）
    ///
    /// # 返回
    /// - Ok(FinishedGood): 入库记录
    /// - Err(CapacityExceeded): 占用 + 入库 > 容量上限（附当前占用）
    #[instrument(skip(self), fields(stand_id = %stand_id, block_id = %block_id))]
    pub fn check_in(
        &self,
        stand_id: &str,
        block_id: &str,
        color_grade: Option<String>,
        slab_count: i64,
    ) -> EngineResult<FinishedGood> {
        if slab_count <= 0 {
            return Err(EngineError::Validation(format!(
                "入库板数必须为正: {slab_count}"
            )));
        }

        let stand = self
            .stand_repo
            .find_by_id(stand_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Stand".to_string(),
                id: stand_id.to_string(),
            })?;

        self.block_repo
            .find_by_id(block_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Block".to_string(),
                id: block_id.to_string(),
            })?;

        let good = FinishedGood::new(stand_id, block_id, color_grade, slab_count);

        // 容量校验与插入在仓储层同一事务内完成
        self.good_repo.check_in(&good, stand.max_capacity)?;

        info!(
            good_id = %good.good_id,
            slab_count,
            "成品入库"
        );

        Ok(good)
    }

    /// 成品出库
    ///
    /// # 参数
    /// - good_id: 成品记录
    /// - slabs_to_ship: 出库板数（>0）
    /// - shipping_company: 承运公司
    ///
    /// # 返回
    /// - Ok(Shipment): 不可变出库记录
    /// - Err(InsufficientStock): 剩余不足（附当前剩余）
    #[instrument(skip(self), fields(good_id = %good_id))]
    pub fn ship(
        &self,
        good_id: &str,
        slabs_to_ship: i64,
        shipping_company: Option<String>,
    ) -> EngineResult<Shipment> {
        if slabs_to_ship <= 0 {
            return Err(EngineError::Validation(format!(
                "出库板数必须为正: {slabs_to_ship}"
            )));
        }

        let shipment = Shipment::new(good_id, slabs_to_ship, shipping_company);

        // 库存校验、递减、出库记录追加在仓储层同一事务内完成
        let remaining = self.good_repo.ship(&shipment)?;

        info!(
            shipment_id = %shipment.shipment_id,
            slabs_to_ship,
            remaining,
            "成品出库"
        );

        // 该批清零后检查荒料是否可完结
        if remaining == 0 {
            if let Some(good) = self.good_repo.find_by_id(good_id)? {
                self.maybe_finalize_block(&good.block_id)?;
            }
        }

        Ok(shipment)
    }

    /// 入库补偿：下游写入失败时撤销刚插入的入库记录
    pub(crate) fn revoke_check_in(&self, good_id: &str) -> EngineResult<()> {
        self.good_repo.revoke_check_in(good_id)?;
        Ok(())
    }

    /// 荒料完结检查
    ///
    /// 最新抛光作业已完成且该荒料全部成品出库后，荒料到达终态 COMPLETED
    fn maybe_finalize_block(&self, block_id: &str) -> EngineResult<()> {
        let remaining = self.good_repo.remaining_for_block(block_id)?;
        if remaining > 0 {
            return Ok(());
        }

        let polishing_done = self
            .job_repo
            .find_latest(block_id, Stage::Polishing)?
            .map(|job| job.status == JobStatus::Completed)
            .unwrap_or(false);

        if polishing_done {
            self.block_repo
                .update_status(block_id, BlockStatus::Completed)?;
            info!(block_id, "荒料成品全部出库，状态置为 COMPLETED");
        }

        Ok(())
    }

    /// 查询货架当前占用（实时求和，不缓存）
    pub fn occupancy(&self, stand_id: &str) -> EngineResult<i64> {
        Ok(self.good_repo.occupancy(stand_id)?)
    }

    /// 成品面积汇报（平方英尺）
    ///
    /// 按来源荒料的长/高与剩余板数换算；荒料尺寸不全时为空
    pub fn good_area(&self, good: &FinishedGood) -> EngineResult<Option<f64>> {
        let block = self
            .block_repo
            .find_by_id(&good.block_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Block".to_string(),
                id: good.block_id.clone(),
            })?;
        Ok(good_area_sqft(&block, good.slab_count))
    }
}
