// ==========================================
// 石材加工生产追踪系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供统一建表入口，测试与宿主初始化共用同一份 schema
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 约束说明：
/// - production_job 上的部分唯一索引保证同一荒料同一工序同时只有一个
///   非终态作业（与应用层检查配合，见 JobRepository::insert_with_slot_check）
/// - finished_good.slab_count 的 CHECK 约束兜底"剩余板数非负"不变量
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS block (
            block_id TEXT PRIMARY KEY,
            length_in REAL,
            width_in REAL,
            height_in REAL,
            density REAL,
            gross_weight_t REAL,
            net_weight_t REAL,
            material_type TEXT,
            color TEXT,
            mine_name TEXT,
            vehicle_no TEXT,
            status TEXT NOT NULL DEFAULT 'IN_STOCK',
            received_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_job (
            job_id TEXT PRIMARY KEY,
            block_id TEXT NOT NULL REFERENCES block(block_id),
            stage TEXT NOT NULL,
            status TEXT NOT NULL,
            start_time TEXT,
            end_time TEXT,
            measurement_json TEXT,
            comment TEXT,
            slab_count INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_job_block_stage
            ON production_job(block_id, stage, created_at);

        CREATE UNIQUE INDEX IF NOT EXISTS idx_job_active_slot
            ON production_job(block_id, stage)
            WHERE status IN ('PENDING', 'IN_PROGRESS', 'PAUSED');

        CREATE TABLE IF NOT EXISTS stand (
            stand_id TEXT PRIMARY KEY,
            row_no TEXT NOT NULL,
            position_no INTEGER NOT NULL,
            max_capacity INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(row_no, position_no)
        );

        CREATE TABLE IF NOT EXISTS finished_good (
            good_id TEXT PRIMARY KEY,
            stand_id TEXT NOT NULL REFERENCES stand(stand_id),
            block_id TEXT NOT NULL REFERENCES block(block_id),
            color_grade TEXT,
            slab_count INTEGER NOT NULL CHECK (slab_count >= 0),
            initial_count INTEGER NOT NULL,
            stocked_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_finished_good_stand
            ON finished_good(stand_id);

        CREATE TABLE IF NOT EXISTS shipment (
            shipment_id TEXT PRIMARY KEY,
            good_id TEXT NOT NULL REFERENCES finished_good(good_id),
            slabs_shipped INTEGER NOT NULL,
            shipping_company TEXT,
            shipped_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}
