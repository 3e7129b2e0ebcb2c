// ==========================================
// 石材加工生产追踪系统 - 领域类型定义
// ==========================================
// 五道工序: 切割 → 磨抛 → 化学转化 / 环氧 → 抛光
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 生产工序 (Production Stage)
// ==========================================
// 化学转化与环氧为可选并行工序，抛光前需全部达到终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Cutting,            // 切割
    Grinding,           // 磨抛
    ChemicalConversion, // 化学转化
    Epoxy,              // 环氧补胶
    Polishing,          // 抛光
}

impl Stage {
    /// 全部工序（流水线顺序），用于聚合统计遍历
    pub const ALL: [Stage; 5] = [
        Stage::Cutting,
        Stage::Grinding,
        Stage::ChemicalConversion,
        Stage::Epoxy,
        Stage::Polishing,
    ];

    /// 从字符串解析工序
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CUTTING" => Some(Stage::Cutting),
            "GRINDING" => Some(Stage::Grinding),
            "CHEMICAL_CONVERSION" => Some(Stage::ChemicalConversion),
            "EPOXY" => Some(Stage::Epoxy),
            "POLISHING" => Some(Stage::Polishing),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Stage::Cutting => "CUTTING",
            Stage::Grinding => "GRINDING",
            Stage::ChemicalConversion => "CHEMICAL_CONVERSION",
            Stage::Epoxy => "EPOXY",
            Stage::Polishing => "POLISHING",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 作业状态 (Job Status)
// ==========================================
// 状态机: PENDING → IN_PROGRESS → {COMPLETED|SKIPPED|DEFECTIVE|CANCELLED}
//         IN_PROGRESS ⇄ PAUSED
// 终态不可再变更；重试通过创建新作业实例实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,    // 待开工
    InProgress, // 进行中
    Completed,  // 已完成
    Skipped,    // 已跳过（需操作员说明原因）
    Defective,  // 缺陷（不解锁下游工序）
    Paused,     // 暂停
    Cancelled,  // 已取消
}

impl JobStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Skipped | JobStatus::Defective | JobStatus::Cancelled
        )
    }

    /// 是否为活动状态（占用 block+stage 槽位）
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// 是否满足下游工序准入
    ///
    /// DEFECTIVE 不满足：需重试作业达到 COMPLETED/SKIPPED 后下游才解锁
    pub fn satisfies_downstream(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Skipped)
    }

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(JobStatus::Pending),
            "IN_PROGRESS" => Some(JobStatus::InProgress),
            "COMPLETED" => Some(JobStatus::Completed),
            "SKIPPED" => Some(JobStatus::Skipped),
            "DEFECTIVE" => Some(JobStatus::Defective),
            "PAUSED" => Some(JobStatus::Paused),
            "CANCELLED" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Skipped => "SKIPPED",
            JobStatus::Defective => "DEFECTIVE",
            JobStatus::Paused => "PAUSED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 荒料状态 (Block Status)
// ==========================================
// 生命周期: IN_STOCK → PROCESSING → COMPLETED
// COMPLETED 为终态：所有下游成品全部发货后才到达
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockStatus {
    InStock,    // 在库（已进料，未加工）
    Processing, // 加工中
    Completed,  // 已完结（成品全部出库）
}

impl BlockStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IN_STOCK" => Some(BlockStatus::InStock),
            "PROCESSING" => Some(BlockStatus::Processing),
            "COMPLETED" => Some(BlockStatus::Completed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BlockStatus::InStock => "IN_STOCK",
            BlockStatus::Processing => "PROCESSING",
            BlockStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Skipped.is_terminal());
        assert!(JobStatus::Defective.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(!JobStatus::Paused.is_terminal());
    }

    #[test]
    fn test_defective_does_not_satisfy_downstream() {
        assert!(JobStatus::Completed.satisfies_downstream());
        assert!(JobStatus::Skipped.satisfies_downstream());
        assert!(!JobStatus::Defective.satisfies_downstream());
        assert!(!JobStatus::Cancelled.satisfies_downstream());
    }

    #[test]
    fn test_stage_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_str(stage.to_db_str()), Some(stage));
        }
    }
}
