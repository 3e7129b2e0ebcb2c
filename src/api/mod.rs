// ==========================================
// 石材加工生产追踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，做输入校验与错误转换
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod inventory_api;
pub mod production_api;

// 重导出核心类型
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use inventory_api::{GoodWithArea, InventoryApi, StandWithOccupancy};
pub use production_api::{
    CreateJobParams, ProductionApi, RegisterBlockRequest, UpdateJobParams,
};
