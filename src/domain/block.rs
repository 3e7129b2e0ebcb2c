// ==========================================
// 石材加工生产追踪系统 - 荒料领域模型
// ==========================================
// 荒料 (Block): 进料登记的原石单位
// 红线: 荒料只改不删，COMPLETED 仅在成品全部出库后到达
// ==========================================

use crate::domain::types::BlockStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Block - 荒料主数据
// ==========================================
// 用途: 进料登记写入，引擎层读取尺寸/颜色，状态随流水线推进
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    // ===== 主键 =====
    pub block_id: String, // 荒料编号（厂内唯一）

    // ===== 尺寸（英寸）=====
    pub length_in: Option<f64>, // 长
    pub width_in: Option<f64>,  // 宽
    pub height_in: Option<f64>, // 高

    // ===== 物理属性 =====
    pub density: Option<f64>,        // 密度
    pub gross_weight_t: Option<f64>, // 毛重（吨）
    pub net_weight_t: Option<f64>,   // 净重（吨）

    // ===== 物料信息 =====
    pub material_type: Option<String>, // 石种
    pub color: Option<String>,         // 颜色
    pub mine_name: Option<String>,     // 矿山来源
    pub vehicle_no: Option<String>,    // 进料车辆

    // ===== 状态 =====
    pub status: BlockStatus, // 生命周期状态

    // ===== 时间信息 =====
    pub received_at: DateTime<Utc>, // 进料时间

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

impl Block {
    /// 创建新荒料（进料登记）
    pub fn new(block_id: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            block_id: block_id.into(),
            length_in: None,
            width_in: None,
            height_in: None,
            density: None,
            gross_weight_t: None,
            net_weight_t: None,
            material_type: None,
            color: None,
            mine_name: None,
            vehicle_no: None,
            status: BlockStatus::InStock,
            received_at,
            created_at: now,
            updated_at: now,
        }
    }
}
