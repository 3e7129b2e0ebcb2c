// ==========================================
// 石材加工生产追踪系统 - 生产作业数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 槽位唯一性: 部分唯一索引 + 事务内显式检查双重保障，
//            防止两个并发建单请求同时通过陈旧读
// ==========================================

use crate::domain::job::{ProductionJob, StageMeasurement};
use crate::domain::types::{JobStatus, Stage};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::with_immediate_tx;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// JobRepository - 生产作业仓储
// ==========================================

/// 生产作业仓储
/// 职责: 管理 production_job 表的 CRUD 操作
pub struct JobRepository {
    conn: Arc<Mutex<Connection>>,
}

impl JobRepository {
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
        job_id, block_id, stage, status, start_time, end_time,
        measurement_json, comment, slab_count, created_at, updated_at
    "#;

    /// 行映射
    fn map_row(row: &Row<'_>) -> SqliteResult<ProductionJob> {
        let stage_str: String = row.get(2)?;
        let stage = Stage::from_str(&stage_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("非法工序: {stage_str}").into(),
            )
        })?;

        let status_str: String = row.get(3)?;
        let status = JobStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("非法作业状态: {status_str}").into(),
            )
        })?;

        let measurement_json: Option<String> = row.get(6)?;
        let measurement = match measurement_json {
            Some(json) => Some(serde_json::from_str::<StageMeasurement>(&json).map_err(
                |e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        format!("计量负载反序列化失败: {e}").into(),
                    )
                },
            )?),
            None => None,
        };

        Ok(ProductionJob {
            job_id: row.get(0)?,
            block_id: row.get(1)?,
            stage,
            status,
            start_time: row.get::<_, Option<DateTime<Utc>>>(4)?,
            end_time: row.get::<_, Option<DateTime<Utc>>>(5)?,
            measurement,
            comment: row.get(7)?,
            slab_count: row.get(8)?,
            created_at: row.get::<_, DateTime<Utc>>(9)?,
            updated_at: row.get::<_, DateTime<Utc>>(10)?,
        })
    }

    /// 计量负载序列化
    fn measurement_to_json(
        measurement: &Option<StageMeasurement>,
    ) -> RepositoryResult<Option<String>> {
        match measurement {
            Some(m) => Ok(Some(serde_json::to_string(m)?)),
            None => Ok(None),
        }
    }

    /// 事务内插入作业并检查槽位占用
    ///
    /// BEGIN IMMEDIATE 事务内重读非终态作业数并插入，与部分唯一索引
    /// idx_job_active_slot 双重保障"单荒料单工序至多一个活动作业"
    pub fn insert_with_slot_check(&self, job: &ProductionJob) -> RepositoryResult<()> {
        let measurement_json = Self::measurement_to_json(&job.measurement)?;
        let conn = self.get_conn()?;

        with_immediate_tx(&conn, |conn| {
            let active_count: i64 = conn.query_row(
                r#"
                SELECT COUNT(*) FROM production_job
                WHERE block_id = ?1 AND stage = ?2
                  AND status IN ('PENDING', 'IN_PROGRESS', 'PAUSED')
                "#,
                params![job.block_id, job.stage.to_db_str()],
                |row| row.get(0),
            )?;

            if active_count > 0 {
                return Err(RepositoryError::ActiveSlotOccupied {
                    block_id: job.block_id.clone(),
                    stage: job.stage.to_db_str().to_string(),
                });
            }

            conn.execute(
                r#"
                INSERT INTO production_job (
                    job_id, block_id, stage, status, start_time, end_time,
                    measurement_json, comment, slab_count, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    job.job_id,
                    job.block_id,
                    job.stage.to_db_str(),
                    job.status.to_db_str(),
                    job.start_time,
                    job.end_time,
                    measurement_json,
                    job.comment,
                    job.slab_count,
                    job.created_at,
                    job.updated_at,
                ],
            )
            .map_err(|e| match e {
                // 并发插入穿过显式检查时由部分唯一索引兜底
                rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg.contains("UNIQUE") => {
                    RepositoryError::ActiveSlotOccupied {
                        block_id: job.block_id.clone(),
                        stage: job.stage.to_db_str().to_string(),
                    }
                }
                other => other.into(),
            })?;

            Ok(())
        })
    }

    /// 更新作业（状态流转由引擎层校验后调用）
    pub fn update(&self, job: &ProductionJob) -> RepositoryResult<()> {
        let measurement_json = Self::measurement_to_json(&job.measurement)?;
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE production_job SET
                status = ?2, start_time = ?3, end_time = ?4,
                measurement_json = ?5, comment = ?6, slab_count = ?7, updated_at = ?8
            WHERE job_id = ?1
            "#,
            params![
                job.job_id,
                job.status.to_db_str(),
                job.start_time,
                job.end_time,
                measurement_json,
                job.comment,
                job.slab_count,
                Utc::now(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionJob".to_string(),
                id: job.job_id.clone(),
            });
        }

        Ok(())
    }

    /// 按 ID 查询作业
    pub fn find_by_id(&self, job_id: &str) -> RepositoryResult<Option<ProductionJob>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM production_job WHERE job_id = ?1",
            Self::SELECT_COLS
        ))?;

        let job = stmt.query_row(params![job_id], Self::map_row).optional()?;

        Ok(job)
    }

    /// 查询某荒料的全部作业历史（按创建时间升序）
    pub fn list_by_block(&self, block_id: &str) -> RepositoryResult<Vec<ProductionJob>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM production_job WHERE block_id = ?1 ORDER BY created_at, job_id",
            Self::SELECT_COLS
        ))?;

        let jobs = stmt
            .query_map(params![block_id], Self::map_row)?
            .collect::<SqliteResult<Vec<ProductionJob>>>()?;

        Ok(jobs)
    }

    /// 查询某荒料某工序的最新作业
    pub fn find_latest(
        &self,
        block_id: &str,
        stage: Stage,
    ) -> RepositoryResult<Option<ProductionJob>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM production_job
            WHERE block_id = ?1 AND stage = ?2
            ORDER BY created_at DESC, job_id DESC
            LIMIT 1
            "#,
            Self::SELECT_COLS
        ))?;

        let job = stmt
            .query_row(params![block_id, stage.to_db_str()], Self::map_row)
            .optional()?;

        Ok(job)
    }

    /// 查询某荒料某工序最近一次"已完成"的作业
    ///
    /// 用于切割面积抄传：化学/环氧工序读取最近完成的切割作业面积
    pub fn find_latest_completed(
        &self,
        block_id: &str,
        stage: Stage,
    ) -> RepositoryResult<Option<ProductionJob>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM production_job
            WHERE block_id = ?1 AND stage = ?2 AND status = 'COMPLETED'
            ORDER BY created_at DESC, job_id DESC
            LIMIT 1
            "#,
            Self::SELECT_COLS
        ))?;

        let job = stmt
            .query_row(params![block_id, stage.to_db_str()], Self::map_row)
            .optional()?;

        Ok(job)
    }

    /// 查询全部作业（聚合统计用）
    pub fn list_all(&self) -> RepositoryResult<Vec<ProductionJob>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM production_job ORDER BY created_at, job_id",
            Self::SELECT_COLS
        ))?;

        let jobs = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<ProductionJob>>>()?;

        Ok(jobs)
    }
}
