// ==========================================
// 石材加工生产追踪系统 - 计量计算器
// ==========================================
// 职责: 将各工序的原始录入派生为完整计量记录（纯函数，无副作用）
// 派生规则:
// - 净耗 = 发料 − 退料（两项均 ≥0；负净耗接受但记异常，现场超退确实存在）
// - 切割面积为操作员权威录入，后续工序只抄传不重算
// - 时长 = 结束 − 开始（整分钟）；结束早于开始是验证错误，不静默截断
// - 其余派生字段缺数据时降级为 0/空，不拒绝整条记录（在制数据常不完整）
// 红线: 同一原始输入重复派生结果必须一致（幂等）
// ==========================================

use crate::domain::job::{StageMeasurement, StoppageRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

// ==========================================
// MeasurementError - 计量验证错误
// ==========================================

/// 计量验证错误（指明违规字段，调用方修正后可重新提交）
#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("字段值非法 (field={field}): {message}")]
    InvalidField { field: String, message: String },

    #[error("缺少必填字段: {field}")]
    MissingField { field: String },

    #[error("结束时间早于开始时间 (field={field}): start={start}, end={end}")]
    EndBeforeStart {
        field: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Result 类型别名
pub type MeasurementResult<T> = Result<T, MeasurementError>;

// ==========================================
// MeasurementCalculator - 计量计算器
// ==========================================
// 纯静态函数集合，不持有状态、不访问数据库
pub struct MeasurementCalculator;

impl MeasurementCalculator {
    /// 派生完整计量记录
    ///
    /// # 参数
    /// - measurement: 原始录入（派生字段值被忽略并重算）
    /// - start_time / end_time: 作业起止时间
    /// - propagated_area_sqft: 自最近已完成切割作业抄传的总面积
    ///   （仅化学/环氧工序使用；无已完成切割时为 None）
    ///
    /// # 返回
    /// - (StageMeasurement, Vec<String>): 派生后的记录与异常提示
    pub fn derive(
        measurement: &StageMeasurement,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        propagated_area_sqft: Option<f64>,
    ) -> MeasurementResult<(StageMeasurement, Vec<String>)> {
        let mut warnings = Vec::new();
        let job_minutes = Self::duration_minutes("end_time", start_time, end_time)?;

        let derived = match measurement {
            StageMeasurement::Cutting(m) => {
                Self::check_non_negative("total_area_sqft", m.total_area_sqft)?;
                let mut out = m.clone();
                out.cutting_minutes = job_minutes;
                out.stoppage = Self::derive_stoppage(&m.stoppage)?;
                StageMeasurement::Cutting(out)
            }

            StageMeasurement::Grinding(m) => {
                let mut out = m.clone();
                out.grinding_minutes = job_minutes;
                out.stoppage = Self::derive_stoppage(&m.stoppage)?;
                StageMeasurement::Grinding(out)
            }

            StageMeasurement::ChemicalConversion(m) => {
                if m.chemical_name.trim().is_empty() {
                    return Err(MeasurementError::MissingField {
                        field: "chemical_name".to_string(),
                    });
                }
                Self::check_non_negative("issue_quantity_kg", m.issue_quantity_kg)?;
                Self::check_non_negative("return_quantity_kg", m.return_quantity_kg)?;

                let net = m.issue_quantity_kg - m.return_quantity_kg;
                if net < 0.0 {
                    warnings.push(format!(
                        "ANOMALY: 退料超发料, issue={}, return={}, net={}",
                        m.issue_quantity_kg, m.return_quantity_kg, net
                    ));
                }

                let mut out = m.clone();
                out.net_quantity_kg = net;
                out.total_area_sqft = propagated_area_sqft;
                out.coverage_sqft_per_kg = Self::coverage(propagated_area_sqft, net);
                out.chemical_minutes = job_minutes;
                out.stoppage = Self::derive_stoppage(&m.stoppage)?;
                StageMeasurement::ChemicalConversion(out)
            }

            StageMeasurement::Epoxy(m) => {
                Self::check_non_negative("issue_quantity_kg", m.issue_quantity_kg)?;
                Self::check_non_negative("return_quantity_kg", m.return_quantity_kg)?;

                let net = m.issue_quantity_kg - m.return_quantity_kg;
                if net < 0.0 {
                    warnings.push(format!(
                        "ANOMALY: 退料超发料, issue={}, return={}, net={}",
                        m.issue_quantity_kg, m.return_quantity_kg, net
                    ));
                }

                let mut out = m.clone();
                out.net_quantity_kg = net;
                out.total_area_sqft = propagated_area_sqft;
                out.coverage_sqft_per_kg = Self::coverage(propagated_area_sqft, net);
                out.epoxy_minutes = job_minutes;
                out.stoppage = Self::derive_stoppage(&m.stoppage)?;
                StageMeasurement::Epoxy(out)
            }

            StageMeasurement::Polishing(m) => {
                if let Some(count) = m.slab_count {
                    if count < 0 {
                        return Err(MeasurementError::InvalidField {
                            field: "slab_count".to_string(),
                            message: format!("大板数不能为负: {count}"),
                        });
                    }
                }
                let mut out = m.clone();
                out.polishing_minutes = job_minutes;
                out.stoppage = Self::derive_stoppage(&m.stoppage)?;
                StageMeasurement::Polishing(out)
            }
        };

        Ok((derived, warnings))
    }

    /// 时长派生: 结束 − 开始（整分钟）
    ///
    /// 两端齐备才计算；结束早于开始返回验证错误，不截断
    pub fn duration_minutes(
        field: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> MeasurementResult<Option<i64>> {
        match (start, end) {
            (Some(s), Some(e)) => {
                if e < s {
                    return Err(MeasurementError::EndBeforeStart {
                        field: field.to_string(),
                        start: s,
                        end: e,
                    });
                }
                Ok(Some((e - s).num_minutes()))
            }
            _ => Ok(None),
        }
    }

    /// 停机时长派生
    ///
    /// 仅在停机原因存在（非 none）且两端时间齐备时计算，与作业时长独立
    fn derive_stoppage(stoppage: &StoppageRecord) -> MeasurementResult<StoppageRecord> {
        let mut out = stoppage.clone();
        out.minutes = if stoppage.has_reason() {
            Self::duration_minutes("stoppage_end_time", stoppage.start_time, stoppage.end_time)?
        } else {
            None
        };
        Ok(out)
    }

    /// 覆盖率 = 面积 ÷ 净耗
    ///
    /// 面积未抄传或净耗非正时无定义（返回空，不报错）
    fn coverage(area_sqft: Option<f64>, net_kg: f64) -> Option<f64> {
        match area_sqft {
            Some(area) if area > 0.0 && net_kg > 0.0 => Some(area / net_kg),
            _ => None,
        }
    }

    /// 数值字段校验: 有限且非负
    fn check_non_negative(field: &str, value: f64) -> MeasurementResult<()> {
        if !value.is_finite() {
            return Err(MeasurementError::InvalidField {
                field: field.to_string(),
                message: format!("数值非法: {value}"),
            });
        }
        if value < 0.0 {
            return Err(MeasurementError::InvalidField {
                field: field.to_string(),
                message: format!("数值不能为负: {value}"),
            });
        }
        Ok(())
    }
}
