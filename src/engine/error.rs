// ==========================================
// 石材加工生产追踪系统 - 引擎层错误类型
// ==========================================
// 职责: 业务规则违反的显式错误分类
// 红线: 所有拒绝必须带可解释的原因；引擎内部不做自动重试
// ==========================================

use crate::engine::measurement::MeasurementError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 业务规则错误 =====
    #[error("荒料不满足工序准入: block_id={block_id}, stage={stage}, 原因={reasons:?}")]
    IneligibleStage {
        block_id: String,
        stage: String,
        reasons: Vec<String>,
    },

    #[error("该工序已存在活动作业: block_id={block_id}, stage={stage}")]
    ActiveJobExists { block_id: String, stage: String },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransition { from: String, to: String },

    // ===== 库存约束错误（附当前值，便于调用方调整请求）=====
    #[error("货架容量超限: stand_id={stand_id}, 当前占用={current}, 容量上限={max}, 本次入库={requested}")]
    CapacityExceeded {
        stand_id: String,
        current: i64,
        max: i64,
        requested: i64,
    },

    #[error("成品库存不足: good_id={good_id}, 剩余={available}, 本次出库={requested}")]
    InsufficientStock {
        good_id: String,
        available: i64,
        requested: i64,
    },

    // ===== 输入验证错误 =====
    #[error("数据验证失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    // ===== 数据访问错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("持久化失败: {0}")]
    Persistence(RepositoryError),
}

// 从 RepositoryError 转换
// 原子约束违反映射为对应的业务错误，其余归为持久化失败
impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ActiveSlotOccupied { block_id, stage } => {
                EngineError::ActiveJobExists { block_id, stage }
            }
            RepositoryError::CapacityExceeded {
                stand_id,
                current,
                max,
                requested,
            } => EngineError::CapacityExceeded {
                stand_id,
                current,
                max,
                requested,
            },
            RepositoryError::InsufficientStock {
                good_id,
                available,
                requested,
            } => EngineError::InsufficientStock {
                good_id,
                available,
                requested,
            },
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Persistence(other),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
