// ==========================================
// 石材加工生产追踪系统 - 成品库存数据仓储
// ==========================================
// 红线: 货架占用由 finished_good 实时 SUM 派生，绝不独立缓存
// 并发: 入库/出库在 BEGIN IMMEDIATE 事务内"重读-校验-写入"，
//       同一行的并发操作被线性化，杜绝陈旧读双双通过校验
// ==========================================

use crate::domain::inventory::{FinishedGood, Shipment, Stand};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::with_immediate_tx;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// StandRepository - 货架仓储
// ==========================================

/// 货架仓储
/// 职责: 管理 stand 表；货架为建厂静态配置，仅经配置接口录入
pub struct StandRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StandRepository {
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

    fn map_row(row: &Row<'_>) -> SqliteResult<Stand> {
        Ok(Stand {
            stand_id: row.get(0)?,
            row_no: row.get(1)?,
            position_no: row.get(2)?,
            max_capacity: row.get(3)?,
            created_at: row.get::<_, DateTime<Utc>>(4)?,
        })
    }

    /// 配置货架（建厂/扩容时的静态数据导入）
    pub fn insert(&self, stand: &Stand) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO stand (stand_id, row_no, position_no, max_capacity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                stand.stand_id,
                stand.row_no,
                stand.position_no,
                stand.max_capacity,
                stand.created_at,
            ],
        )?;

        Ok(())
    }

    /// 按 ID 查询货架
    pub fn find_by_id(&self, stand_id: &str) -> RepositoryResult<Option<Stand>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT stand_id, row_no, position_no, max_capacity, created_at FROM stand WHERE stand_id = ?1",
        )?;

        let stand = stmt.query_row(params![stand_id], Self::map_row).optional()?;

        Ok(stand)
    }

    /// 查询全部货架（按行/位排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Stand>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT stand_id, row_no, position_no, max_capacity, created_at FROM stand ORDER BY row_no, position_no",
        )?;

        let stands = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Stand>>>()?;

        Ok(stands)
    }

    /// 货架总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM stand", [], |row| row.get(0))?;
        Ok(count)
    }
}

// ==========================================
// FinishedGoodRepository - 成品入库/出库仓储
// ==========================================

/// 成品仓储
/// 职责: finished_good 与 shipment 表的数据访问，
///       以及容量/库存约束的原子"检查即写入"原语
pub struct FinishedGoodRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FinishedGoodRepository {
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

    const SELECT_COLS: &'static str = r#"
        good_id, stand_id, block_id, color_grade, slab_count,
        initial_count, stocked_at, updated_at
    "#;

    fn map_row(row: &Row<'_>) -> SqliteResult<FinishedGood> {
        Ok(FinishedGood {
            good_id: row.get(0)?,
            stand_id: row.get(1)?,
            block_id: row.get(2)?,
            color_grade: row.get(3)?,
            slab_count: row.get(4)?,
            initial_count: row.get(5)?,
            stocked_at: row.get::<_, DateTime<Utc>>(6)?,
            updated_at: row.get::<_, DateTime<Utc>>(7)?,
        })
    }

    fn map_shipment_row(row: &Row<'_>) -> SqliteResult<Shipment> {
        Ok(Shipment {
            shipment_id: row.get(0)?,
            good_id: row.get(1)?,
            slabs_shipped: row.get(2)?,
            shipping_company: row.get(3)?,
            shipped_at: row.get::<_, DateTime<Utc>>(4)?,
        })
    }

    /// 实时计算货架占用（剩余板数求和）
    fn occupancy_in(conn: &Connection, stand_id: &str) -> RepositoryResult<i64> {
        let sum: i64 = conn.query_row(
            "SELECT COALESCE(SUM(slab_count), 0) FROM finished_good WHERE stand_id = ?1",
            params![stand_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    /// 查询货架当前占用
    pub fn occupancy(&self, stand_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::occupancy_in(&conn, stand_id)
    }

    /// 原子入库：事务内重读占用并校验容量
    ///
    /// 占用 + 本次入库 > 容量上限时整体回滚，返回 CapacityExceeded
    pub fn check_in(&self, good: &FinishedGood, max_capacity: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        with_immediate_tx(&conn, |conn| {
            let current = Self::occupancy_in(conn, &good.stand_id)?;

            if current + good.slab_count > max_capacity {
                return Err(RepositoryError::CapacityExceeded {
                    stand_id: good.stand_id.clone(),
                    current,
                    max: max_capacity,
                    requested: good.slab_count,
                });
            }

            conn.execute(
                r#"
                INSERT INTO finished_good (
                    good_id, stand_id, block_id, color_grade, slab_count,
                    initial_count, stocked_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    good.good_id,
                    good.stand_id,
                    good.block_id,
                    good.color_grade,
                    good.slab_count,
                    good.initial_count,
                    good.stocked_at,
                    good.updated_at,
                ],
            )?;

            Ok(())
        })
    }

    /// 原子出库：事务内重读剩余板数并校验库存
    ///
    /// 剩余不足时整体回滚，返回 InsufficientStock；
    /// 成功则递减剩余板数、追加不可变 shipment 记录，并返回出库后剩余
    pub fn ship(&self, shipment: &Shipment) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        with_immediate_tx(&conn, |conn| {
            let available: i64 = conn
                .query_row(
                    "SELECT slab_count FROM finished_good WHERE good_id = ?1",
                    params![shipment.good_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: "FinishedGood".to_string(),
                    id: shipment.good_id.clone(),
                })?;

            if shipment.slabs_shipped > available {
                return Err(RepositoryError::InsufficientStock {
                    good_id: shipment.good_id.clone(),
                    available,
                    requested: shipment.slabs_shipped,
                });
            }

            conn.execute(
                "UPDATE finished_good SET slab_count = slab_count - ?2, updated_at = ?3 WHERE good_id = ?1",
                params![shipment.good_id, shipment.slabs_shipped, Utc::now()],
            )?;

            conn.execute(
                r#"
                INSERT INTO shipment (shipment_id, good_id, slabs_shipped, shipping_company, shipped_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    shipment.shipment_id,
                    shipment.good_id,
                    shipment.slabs_shipped,
                    shipment.shipping_company,
                    shipment.shipped_at,
                ],
            )?;

            Ok(available - shipment.slabs_shipped)
        })
    }

    /// 撤销入库记录
    ///
    /// 仅用于跨组件写入失败的补偿：删除刚插入、尚无出库历史的记录
    pub fn revoke_check_in(&self, good_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "DELETE FROM finished_good WHERE good_id = ?1",
            params![good_id],
        )?;

        Ok(())
    }

    /// 按 ID 查询成品记录
    pub fn find_by_id(&self, good_id: &str) -> RepositoryResult<Option<FinishedGood>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM finished_good WHERE good_id = ?1",
            Self::SELECT_COLS
        ))?;

        let good = stmt.query_row(params![good_id], Self::map_row).optional()?;

        Ok(good)
    }

    /// 查询货架上的成品记录
    pub fn list_by_stand(&self, stand_id: &str) -> RepositoryResult<Vec<FinishedGood>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM finished_good WHERE stand_id = ?1 ORDER BY stocked_at, good_id",
            Self::SELECT_COLS
        ))?;

        let goods = stmt
            .query_map(params![stand_id], Self::map_row)?
            .collect::<SqliteResult<Vec<FinishedGood>>>()?;

        Ok(goods)
    }

    /// 查询在库成品（剩余板数 > 0，已清零记录逻辑移除）
    pub fn list_live(&self) -> RepositoryResult<Vec<FinishedGood>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM finished_good WHERE slab_count > 0 ORDER BY stand_id, stocked_at",
            Self::SELECT_COLS
        ))?;

        let goods = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<FinishedGood>>>()?;

        Ok(goods)
    }

    /// 查询某荒料的成品剩余总板数
    pub fn remaining_for_block(&self, block_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let sum: i64 = conn.query_row(
            "SELECT COALESCE(SUM(slab_count), 0) FROM finished_good WHERE block_id = ?1",
            params![block_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    /// 有在库成品的货架数
    pub fn occupied_stand_count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT stand_id) FROM finished_good WHERE slab_count > 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 查询某成品记录的出库历史
    pub fn list_shipments(&self, good_id: &str) -> RepositoryResult<Vec<Shipment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT shipment_id, good_id, slabs_shipped, shipping_company, shipped_at
            FROM shipment WHERE good_id = ?1 ORDER BY shipped_at, shipment_id
            "#,
        )?;

        let shipments = stmt
            .query_map(params![good_id], Self::map_shipment_row)?
            .collect::<SqliteResult<Vec<Shipment>>>()?;

        Ok(shipments)
    }
}
