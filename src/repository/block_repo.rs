// ==========================================
// 石材加工生产追踪系统 - 荒料数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::domain::block::Block;
use crate::domain::types::BlockStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// BlockRepository - 荒料仓储
// ==========================================

/// 荒料仓储
/// 职责: 管理 block 表的 CRUD 操作
pub struct BlockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BlockRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> SqliteResult<Block> {
        let status_str: String = row.get(11)?;
        let status = BlockStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                format!("非法荒料状态: {status_str}").into(),
            )
        })?;

        Ok(Block {
            block_id: row.get(0)?,
            length_in: row.get(1)?,
            width_in: row.get(2)?,
            height_in: row.get(3)?,
            density: row.get(4)?,
            gross_weight_t: row.get(5)?,
            net_weight_t: row.get(6)?,
            material_type: row.get(7)?,
            color: row.get(8)?,
            mine_name: row.get(9)?,
            vehicle_no: row.get(10)?,
            status,
            received_at: row.get::<_, DateTime<Utc>>(12)?,
            created_at: row.get::<_, DateTime<Utc>>(13)?,
            updated_at: row.get::<_, DateTime<Utc>>(14)?,
        })
    }

    const SELECT_COLS: &'static str = r#"
        block_id, length_in, width_in, height_in, density,
        gross_weight_t, net_weight_t, material_type, color,
        mine_name, vehicle_no, status, received_at, created_at, updated_at
    "#;

    /// 插入荒料（进料登记）
    pub fn insert(&self, block: &Block) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO block (
                block_id, length_in, width_in, height_in, density,
                gross_weight_t, net_weight_t, material_type, color,
                mine_name, vehicle_no, status, received_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                block.block_id,
                block.length_in,
                block.width_in,
                block.height_in,
                block.density,
                block.gross_weight_t,
                block.net_weight_t,
                block.material_type,
                block.color,
                block.mine_name,
                block.vehicle_no,
                block.status.to_db_str(),
                block.received_at,
                block.created_at,
                block.updated_at,
            ],
        )?;

        Ok(())
    }

    /// 更新荒料（编辑进料信息）
    pub fn update(&self, block: &Block) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE block SET
                length_in = ?2, width_in = ?3, height_in = ?4, density = ?5,
                gross_weight_t = ?6, net_weight_t = ?7, material_type = ?8,
                color = ?9, mine_name = ?10, vehicle_no = ?11, status = ?12,
                received_at = ?13, updated_at = ?14
            WHERE block_id = ?1
            "#,
            params![
                block.block_id,
                block.length_in,
                block.width_in,
                block.height_in,
                block.density,
                block.gross_weight_t,
                block.net_weight_t,
                block.material_type,
                block.color,
                block.mine_name,
                block.vehicle_no,
                block.status.to_db_str(),
                block.received_at,
                Utc::now(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Block".to_string(),
                id: block.block_id.clone(),
            });
        }

        Ok(())
    }

    /// 更新荒料生命周期状态
    pub fn update_status(&self, block_id: &str, status: BlockStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE block SET status = ?2, updated_at = ?3 WHERE block_id = ?1",
            params![block_id, status.to_db_str(), Utc::now()],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Block".to_string(),
                id: block_id.to_string(),
            });
        }

        Ok(())
    }

    /// 按 ID 查询荒料
    pub fn find_by_id(&self, block_id: &str) -> RepositoryResult<Option<Block>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM block WHERE block_id = ?1",
            Self::SELECT_COLS
        ))?;

        let block = stmt
            .query_row(params![block_id], Self::map_row)
            .optional()?;

        Ok(block)
    }

    /// 查询全部荒料
    pub fn list_all(&self) -> RepositoryResult<Vec<Block>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM block ORDER BY received_at DESC, block_id",
            Self::SELECT_COLS
        ))?;

        let blocks = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Block>>>()?;

        Ok(blocks)
    }

    /// 按状态查询荒料
    pub fn list_by_status(&self, status: BlockStatus) -> RepositoryResult<Vec<Block>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM block WHERE status = ?1 ORDER BY received_at DESC, block_id",
            Self::SELECT_COLS
        ))?;

        let blocks = stmt
            .query_map(params![status.to_db_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<Block>>>()?;

        Ok(blocks)
    }
}
