// ==========================================
// 石材加工生产追踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为用户友好的错误消息
// 红线: 所有错误信息必须包含显式原因（可解释性）
// ==========================================

use crate::engine::error::EngineError;
use crate::engine::measurement::MeasurementError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
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

    #[error("结束时间早于开始时间 (field={field})")]
    EndBeforeStart { field: String },

    // ==========================================
    // 库存约束错误（附当前值，便于前端提示可行量）
    // ==========================================
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

    // ==========================================
    // 输入与数据错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 EngineError 转换
// 目的: 将引擎层的业务拒绝按错误码透传给前端
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::IneligibleStage {
                block_id,
                stage,
                reasons,
            } => ApiError::IneligibleStage {
                block_id,
                stage,
                reasons,
            },
            EngineError::ActiveJobExists { block_id, stage } => {
                ApiError::ActiveJobExists { block_id, stage }
            }
            EngineError::InvalidTransition { from, to } => {
                ApiError::InvalidTransition { from, to }
            }
            EngineError::CapacityExceeded {
                stand_id,
                current,
                max,
                requested,
            } => ApiError::CapacityExceeded {
                stand_id,
                current,
                max,
                requested,
            },
            EngineError::InsufficientStock {
                good_id,
                available,
                requested,
            } => ApiError::InsufficientStock {
                good_id,
                available,
                requested,
            },
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::Measurement(MeasurementError::EndBeforeStart { field, .. }) => {
                ApiError::EndBeforeStart { field }
            }
            EngineError::Measurement(m) => ApiError::ValidationError(m.to_string()),
            EngineError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            EngineError::Persistence(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// API 层直查仓储（只读列表）时走此路径
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ActiveSlotOccupied { block_id, stage } => {
                ApiError::ActiveJobExists { block_id, stage }
            }
            RepositoryError::CapacityExceeded {
                stand_id,
                current,
                max,
                requested,
            } => ApiError::CapacityExceeded {
                stand_id,
                current,
                max,
                requested,
            },
            RepositoryError::InsufficientStock {
                good_id,
                available,
                requested,
            } => ApiError::InsufficientStock {
                good_id,
                available,
                requested,
            },
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("field={field}: {message}"))
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_engine_capacity_error_keeps_counts() {
        let err: ApiError = EngineError::CapacityExceeded {
            stand_id: "A-01".to_string(),
            current: 190,
            max: 200,
            requested: 15,
        }
        .into();

        match err {
            ApiError::CapacityExceeded { current, max, requested, .. } => {
                assert_eq!(current, 190);
                assert_eq!(max, 200);
                assert_eq!(requested, 15);
            }
            other => panic!("意外的错误类型: {other:?}"),
        }
    }

    #[test]
    fn test_end_before_start_maps_to_dedicated_variant() {
        let now = Utc::now();
        let err: ApiError = EngineError::Measurement(MeasurementError::EndBeforeStart {
            field: "end_time".to_string(),
            start: now,
            end: now - chrono::Duration::minutes(5),
        })
        .into();

        assert!(matches!(err, ApiError::EndBeforeStart { .. }));
    }
}
