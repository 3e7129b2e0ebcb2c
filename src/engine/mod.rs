// ==========================================
// 石材加工生产追踪系统 - 引擎层
// ==========================================
// 职责: 实现业务规则（准入、计量派生、状态流转、容量分配、聚合）
// 红线: 所有规则必须输出 reason; Engine 不在调用点拼 SQL
// ==========================================

pub mod allocator;
pub mod analytics;
pub mod eligibility;
pub mod error;
pub mod ledger;
pub mod measurement;

// 重导出核心引擎
pub use allocator::{good_area_sqft, inches_to_feet, slab_area_sqft, StandAllocator};
pub use analytics::{
    AnalyticsAggregator, InventorySummary, PipelineSummary, StageAnalytics, StageStat,
};
pub use eligibility::{EligibilityDecision, EligibilityResolver};
pub use error::{EngineError, EngineResult};
pub use ledger::{CreateJobRequest, JobUpdate, ProductionLedger};
pub use measurement::{MeasurementCalculator, MeasurementError, MeasurementResult};
