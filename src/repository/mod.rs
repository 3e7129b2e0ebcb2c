// ==========================================
// 石材加工生产追踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod block_repo;
pub mod error;
pub mod inventory_repo;
pub mod job_repo;

// 重导出核心仓储
pub use block_repo::BlockRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::{FinishedGoodRepository, StandRepository};
pub use job_repo::JobRepository;

use rusqlite::Connection;

/// 在 BEGIN IMMEDIATE 事务内执行"检查即写入"操作
///
/// 失败时回滚，保证单荒料单工序槽位、货架容量、成品库存等
/// 约束的校验与写入在同一原子单元内完成
pub(crate) fn with_immediate_tx<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> RepositoryResult<T>,
) -> RepositoryResult<T> {
    conn.execute_batch("BEGIN IMMEDIATE")?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(err) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(err)
        }
    }
}
