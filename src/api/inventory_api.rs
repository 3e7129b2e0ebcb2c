// ==========================================
// 石材加工生产追踪系统 - 库存 API
// ==========================================
// 职责: 货架配置、成品入库/出库、库存查询的对外入口
// 红线: 货架占用永远实时求和，API 层绝不缓存占用数字
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::inventory::{FinishedGood, Shipment, Stand};
use crate::engine::allocator::StandAllocator;
use crate::repository::inventory_repo::{FinishedGoodRepository, StandRepository};

// ==========================================
// 展示结构
// ==========================================

/// 货架 + 实时占用（前端货架总览用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandWithOccupancy {
    pub stand_id: String,
    pub row_no: String,
    pub position_no: i64,
    pub max_capacity: i64,
    pub occupancy: i64,
}

/// 成品记录 + 换算面积
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodWithArea {
    #[serde(flatten)]
    pub good: FinishedGood,
    pub area_sqft: Option<f64>, // 来源荒料尺寸不全时为空
}

// ==========================================
// InventoryApi - 库存 API
// ==========================================

/// 库存API
///
/// 职责：
/// 1. 货架配置与占用查询
/// 2. 人工成品入库（抛光完工入库走生产 API）
/// 3. 成品出库与出库历史
pub struct InventoryApi {
    stand_repo: Arc<StandRepository>,
    good_repo: Arc<FinishedGoodRepository>,
    allocator: Arc<StandAllocator>,
}

impl InventoryApi {
    /// 创建新的InventoryApi实例
    pub fn new(
        stand_repo: Arc<StandRepository>,
        good_repo: Arc<FinishedGoodRepository>,
        allocator: Arc<StandAllocator>,
    ) -> Self {
        Self {
            stand_repo,
            good_repo,
            allocator,
        }
    }

    // ==========================================
    // 货架接口
    // ==========================================

    /// 配置新货架
    ///
    /// # 失败
    /// - InvalidInput: 编号为空 / 容量非正
    /// - ValidationError: 行/位组合重复
    pub fn create_stand(
        &self,
        stand_id: &str,
        row_no: &str,
        position_no: i64,
        max_capacity: i64,
    ) -> ApiResult<Stand> {
        if stand_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("货架编号不能为空".to_string()));
        }
        if max_capacity <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "货架容量必须为正: {max_capacity}"
            )));
        }

        let stand = Stand {
            stand_id: stand_id.trim().to_string(),
            row_no: row_no.trim().to_string(),
            position_no,
            max_capacity,
            created_at: chrono::Utc::now(),
        };

        self.stand_repo.insert(&stand)?;

        debug!(stand_id = %stand.stand_id, max_capacity, "货架已配置");

        Ok(stand)
    }

    /// 查询全部货架及实时占用
    pub fn list_stands(&self) -> ApiResult<Vec<StandWithOccupancy>> {
        let stands = self.stand_repo.list_all()?;
        let mut result = Vec::with_capacity(stands.len());
        for stand in stands {
            let occupancy = self.good_repo.occupancy(&stand.stand_id)?;
            result.push(StandWithOccupancy {
                stand_id: stand.stand_id,
                row_no: stand.row_no,
                position_no: stand.position_no,
                max_capacity: stand.max_capacity,
                occupancy,
            });
        }
        Ok(result)
    }

    /// 查询货架当前占用
    pub fn get_occupancy(&self, stand_id: &str) -> ApiResult<i64> {
        self.stand_repo
            .find_by_id(stand_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "Stand".to_string(),
                id: stand_id.to_string(),
            })?;
        Ok(self.allocator.occupancy(stand_id)?)
    }

    // ==========================================
    // 成品接口
    // ==========================================

    /// 人工成品入库
    pub fn check_in_finished_goods(
        &self,
        stand_id: &str,
        block_id: &str,
        color_grade: Option<String>,
        slab_count: i64,
    ) -> ApiResult<FinishedGood> {
        if stand_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("货架编号不能为空".to_string()));
        }
        if block_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("荒料编号不能为空".to_string()));
        }

        Ok(self
            .allocator
            .check_in(stand_id, block_id, color_grade, slab_count)?)
    }

    /// 成品出库
    ///
    /// # 失败
    /// - InsufficientStock: 剩余不足（附剩余数）
    pub fn ship_goods(
        &self,
        good_id: &str,
        slabs_to_ship: i64,
        shipping_company: Option<String>,
    ) -> ApiResult<Shipment> {
        if good_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("成品记录 ID 不能为空".to_string()));
        }

        Ok(self.allocator.ship(good_id, slabs_to_ship, shipping_company)?)
    }

    /// 查询货架上的成品（含换算面积）
    pub fn list_goods_on_stand(&self, stand_id: &str) -> ApiResult<Vec<GoodWithArea>> {
        let goods = self.good_repo.list_by_stand(stand_id)?;
        let mut result = Vec::with_capacity(goods.len());
        for good in goods {
            let area_sqft = self.allocator.good_area(&good)?;
            result.push(GoodWithArea { good, area_sqft });
        }
        Ok(result)
    }

    /// 查询成品的出库历史（时间升序）
    pub fn list_shipments(&self, good_id: &str) -> ApiResult<Vec<Shipment>> {
        self.good_repo
            .find_by_id(good_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "FinishedGood".to_string(),
                id: good_id.to_string(),
            })?;
        Ok(self.good_repo.list_shipments(good_id)?)
    }
}
