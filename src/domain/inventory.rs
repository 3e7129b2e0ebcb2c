// ==========================================
// 石材加工生产追踪系统 - 成品库存领域模型
// ==========================================
// Stand: 固定容量的成品货架（行/位定位，建厂时静态配置）
// FinishedGood: 某荒料某色级的一批大板在某货架上的入库记录
// Shipment: 出库记录，创建后不可变
// 红线: 货架占用永远由 finished_good 实时求和派生，绝不独立缓存
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Stand - 成品货架
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stand {
    pub stand_id: String,          // 货架编号（如 "A-01"）
    pub row_no: String,            // 行号
    pub position_no: i64,          // 位号
    pub max_capacity: i64,         // 最大容量（大板数）
    pub created_at: DateTime<Utc>, // 配置时间
}

// ==========================================
// FinishedGood - 成品入库记录
// ==========================================
// slab_count 为当前剩余板数，随发货递减，≥0 不变量由仓储层事务保证
// 剩余为 0 的记录逻辑移除（不计占用、不入汇总），保留行用于追溯
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedGood {
    pub good_id: String,             // 成品记录 ID（UUID）
    pub stand_id: String,            // 所在货架（FK）
    pub block_id: String,            // 来源荒料（FK）
    pub color_grade: Option<String>, // 颜色/品级
    pub slab_count: i64,             // 当前剩余板数
    pub initial_count: i64,          // 入库板数（不变，用于对账）
    pub stocked_at: DateTime<Utc>,   // 入库时间
    pub updated_at: DateTime<Utc>,   // 最后更新时间
}

impl FinishedGood {
    /// 创建入库记录
    pub fn new(
        stand_id: impl Into<String>,
        block_id: impl Into<String>,
        color_grade: Option<String>,
        slab_count: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            good_id: uuid::Uuid::new_v4().to_string(),
            stand_id: stand_id.into(),
            block_id: block_id.into(),
            color_grade,
            slab_count,
            initial_count: slab_count,
            stocked_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// Shipment - 出库记录
// ==========================================
// 创建后不可变：任何修正通过补偿记录表达，历史数量不回改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: String,              // 出库记录 ID（UUID）
    pub good_id: String,                  // 关联成品记录（FK）
    pub slabs_shipped: i64,               // 出库板数
    pub shipping_company: Option<String>, // 承运公司
    pub shipped_at: DateTime<Utc>,        // 出库时间
}

impl Shipment {
    /// 创建出库记录
    pub fn new(
        good_id: impl Into<String>,
        slabs_shipped: i64,
        shipping_company: Option<String>,
    ) -> Self {
        Self {
            shipment_id: uuid::Uuid::new_v4().to_string(),
            good_id: good_id.into(),
            slabs_shipped,
            shipping_company,
            shipped_at: Utc::now(),
        }
    }
}
