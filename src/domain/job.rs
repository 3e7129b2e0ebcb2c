// ==========================================
// 石材加工生产追踪系统 - 生产作业领域模型
// ==========================================
// ProductionJob: 某荒料在某工序上的一次尝试
// 红线: 同一荒料同一工序同时至多一个非终态作业；历史作业可多条（重试）
// 计量负载按工序强类型分支（tagged union），计算器穷尽分派
// ==========================================

use crate::domain::types::{JobStatus, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// StoppageRecord - 停机记录
// ==========================================
// 停机时长与作业时长相互独立，仅在停机原因存在且两端时间齐备时派生
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoppageRecord {
    pub reason: Option<String>,               // 停机原因（None 或 "NONE" 视为无停机）
    pub start_time: Option<DateTime<Utc>>,    // 停机开始
    pub end_time: Option<DateTime<Utc>>,      // 停机结束
    pub minutes: Option<i64>,                 // 停机时长（分钟，派生）
}

impl StoppageRecord {
    /// 是否记录了实际停机原因
    pub fn has_reason(&self) -> bool {
        match &self.reason {
            Some(r) => !r.trim().is_empty() && !r.trim().eq_ignore_ascii_case("none"),
            None => false,
        }
    }
}

// ==========================================
// 各工序计量结构
// ==========================================

/// 切割计量
///
/// total_area_sqft 为操作员录入的权威值（平方英尺），
/// 后续工序从最近一次已完成切割作业"抄传"，绝不重算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingMeasurement {
    pub total_area_sqft: f64,            // 切割总面积（权威值）
    pub machine_no: Option<String>,      // 切机编号
    pub blade_count: Option<i64>,        // 刀头数
    pub cutting_minutes: Option<i64>,    // 切割时长（分钟，派生）
    #[serde(default)]
    pub stoppage: StoppageRecord,        // 停机记录
}

/// 磨抛计量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrindingMeasurement {
    pub line_no: Option<String>,         // 磨抛线编号
    pub abrasive_grade: Option<String>,  // 磨料目数
    pub grinding_minutes: Option<i64>,   // 磨抛时长（分钟，派生）
    #[serde(default)]
    pub stoppage: StoppageRecord,
}

/// 化学转化计量
///
/// net = issue − return；退料超发料的负净耗不拒绝，但记异常
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalMeasurement {
    pub chemical_name: String,                // 药剂名称（必填）
    pub issue_quantity_kg: f64,               // 发料量（kg，≥0）
    pub return_quantity_kg: f64,              // 退料量（kg，≥0）
    pub net_quantity_kg: f64,                 // 净耗量（派生）
    pub total_area_sqft: Option<f64>,         // 总面积（自切割工序抄传）
    pub coverage_sqft_per_kg: Option<f64>,    // 覆盖率 = 面积 ÷ 净耗（派生，可缺）
    pub chemical_minutes: Option<i64>,        // 转化时长（分钟，派生）
    #[serde(default)]
    pub stoppage: StoppageRecord,
}

/// 环氧补胶计量
///
/// 派生规则与化学转化一致（独立的可选并行工序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpoxyMeasurement {
    pub resin_name: Option<String>,           // 树脂牌号
    pub issue_quantity_kg: f64,               // 发料量（kg，≥0）
    pub return_quantity_kg: f64,              // 退料量（kg，≥0）
    pub net_quantity_kg: f64,                 // 净耗量（派生）
    pub total_area_sqft: Option<f64>,         // 总面积（自切割工序抄传）
    pub coverage_sqft_per_kg: Option<f64>,    // 覆盖率（派生，可缺）
    pub epoxy_minutes: Option<i64>,           // 补胶时长（分钟，派生）
    #[serde(default)]
    pub stoppage: StoppageRecord,
}

/// 抛光计量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolishingMeasurement {
    pub line_no: Option<String>,         // 抛光线编号
    pub slab_count: Option<i64>,         // 产出大板数
    pub polishing_minutes: Option<i64>,  // 抛光时长（分钟，派生）
    #[serde(default)]
    pub stoppage: StoppageRecord,
}

// ==========================================
// StageMeasurement - 工序计量负载（tagged union）
// ==========================================
// 序列化时以 "stage" 字段区分分支，与 production_job.stage 列一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage")]
pub enum StageMeasurement {
    #[serde(rename = "CUTTING")]
    Cutting(CuttingMeasurement),
    #[serde(rename = "GRINDING")]
    Grinding(GrindingMeasurement),
    #[serde(rename = "CHEMICAL_CONVERSION")]
    ChemicalConversion(ChemicalMeasurement),
    #[serde(rename = "EPOXY")]
    Epoxy(EpoxyMeasurement),
    #[serde(rename = "POLISHING")]
    Polishing(PolishingMeasurement),
}

impl StageMeasurement {
    /// 该计量负载所属的工序
    pub fn stage(&self) -> Stage {
        match self {
            StageMeasurement::Cutting(_) => Stage::Cutting,
            StageMeasurement::Grinding(_) => Stage::Grinding,
            StageMeasurement::ChemicalConversion(_) => Stage::ChemicalConversion,
            StageMeasurement::Epoxy(_) => Stage::Epoxy,
            StageMeasurement::Polishing(_) => Stage::Polishing,
        }
    }
}

// ==========================================
// ProductionJob - 生产作业
// ==========================================
// 对齐: production_job 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionJob {
    // ===== 主键与关联 =====
    pub job_id: String,   // 作业 ID（UUID）
    pub block_id: String, // 关联荒料（FK）

    // ===== 工序与状态 =====
    pub stage: Stage,      // 工序
    pub status: JobStatus, // 状态

    // ===== 时间信息 =====
    pub start_time: Option<DateTime<Utc>>, // 开工时间
    pub end_time: Option<DateTime<Utc>>,   // 完工时间

    // ===== 计量负载 =====
    // SKIPPED 作业置空（区别于"测得为零"），其余按工序分支
    pub measurement: Option<StageMeasurement>,

    // ===== 备注 =====
    pub comment: Option<String>, // 自由备注；SKIPPED 时为必填的跳过原因

    // ===== 派生 =====
    pub slab_count: Option<i64>, // 本作业产出大板数（抛光完工时写入）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

impl ProductionJob {
    /// 创建新作业（初始 PENDING）
    pub fn new(block_id: impl Into<String>, stage: Stage) -> Self {
        let now = Utc::now();
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            block_id: block_id.into(),
            stage,
            status: JobStatus::Pending,
            start_time: None,
            end_time: None,
            measurement: None,
            comment: None,
            slab_count: None,
            created_at: now,
            updated_at: now,
        }
    }
}
