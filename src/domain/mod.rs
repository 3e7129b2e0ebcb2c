// ==========================================
// 石材加工生产追踪系统 - 领域层
// ==========================================
// 职责: 实体与类型定义，不含持久化与业务流程
// ==========================================

pub mod block;
pub mod inventory;
pub mod job;
pub mod types;

// 重导出核心实体
pub use block::Block;
pub use inventory::{FinishedGood, Shipment, Stand};
pub use job::{
    ChemicalMeasurement, CuttingMeasurement, EpoxyMeasurement, GrindingMeasurement,
    PolishingMeasurement, ProductionJob, StageMeasurement, StoppageRecord,
};
pub use types::{BlockStatus, JobStatus, Stage};
