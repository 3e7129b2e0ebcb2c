// ==========================================
// 石材加工生产追踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 生产阶段流水线与库存容量引擎 (记账与校验层)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BlockStatus, JobStatus, Stage};

// 领域实体
pub use domain::{Block, FinishedGood, ProductionJob, Shipment, StageMeasurement, Stand};

// 引擎
pub use engine::{
    AnalyticsAggregator, EngineError, EngineResult, ProductionLedger, StandAllocator,
};

// API
pub use api::{DashboardApi, InventoryApi, ProductionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "石材加工生产追踪系统";

// ==========================================
// 预编译检查
// ==========================================
