// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、组件装配、测试数据生成
// ==========================================

use std::error::Error;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use tempfile::NamedTempFile;

use stone_mes::api::{DashboardApi, InventoryApi, ProductionApi, RegisterBlockRequest};
use stone_mes::db;
use stone_mes::domain::job::{
    CuttingMeasurement, PolishingMeasurement, StageMeasurement, StoppageRecord,
};
use stone_mes::engine::{AnalyticsAggregator, ProductionLedger, StandAllocator};
use stone_mes::repository::{
    BlockRepository, FinishedGoodRepository, JobRepository, StandRepository,
};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 完整测试环境（全部组件共享同一个连接）
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub conn: Arc<Mutex<Connection>>,
    pub block_repo: Arc<BlockRepository>,
    pub job_repo: Arc<JobRepository>,
    pub stand_repo: Arc<StandRepository>,
    pub good_repo: Arc<FinishedGoodRepository>,
    pub allocator: Arc<StandAllocator>,
    pub ledger: Arc<ProductionLedger>,
    pub production_api: Arc<ProductionApi>,
    pub inventory_api: Arc<InventoryApi>,
    pub dashboard_api: Arc<DashboardApi>,
}

/// 装配测试环境
pub fn setup_test_env() -> TestEnv {
    stone_mes::logging::init_test();

    let (temp_file, db_path) = create_test_db().unwrap();

    let conn = Arc::new(Mutex::new(db::open_sqlite_connection(&db_path).unwrap()));

    let block_repo = Arc::new(BlockRepository::new(conn.clone()));
    let job_repo = Arc::new(JobRepository::new(conn.clone()));
    let stand_repo = Arc::new(StandRepository::new(conn.clone()));
    let good_repo = Arc::new(FinishedGoodRepository::new(conn.clone()));

    let allocator = Arc::new(StandAllocator::new(
        stand_repo.clone(),
        good_repo.clone(),
        block_repo.clone(),
        job_repo.clone(),
    ));
    let ledger = Arc::new(ProductionLedger::new(
        block_repo.clone(),
        job_repo.clone(),
        allocator.clone(),
    ));
    let aggregator = Arc::new(AnalyticsAggregator::new(
        job_repo.clone(),
        stand_repo.clone(),
        good_repo.clone(),
        block_repo.clone(),
    ));

    let production_api = Arc::new(ProductionApi::new(block_repo.clone(), ledger.clone()));
    let inventory_api = Arc::new(InventoryApi::new(
        stand_repo.clone(),
        good_repo.clone(),
        allocator.clone(),
    ));
    let dashboard_api = Arc::new(DashboardApi::new(aggregator));

    TestEnv {
        _temp_file: temp_file,
        conn,
        block_repo,
        job_repo,
        stand_repo,
        good_repo,
        allocator,
        ledger,
        production_api,
        inventory_api,
        dashboard_api,
    }
}

/// 进料登记一块测试荒料（120in × 60in × 72in）
pub fn seed_block(env: &TestEnv, block_id: &str) {
    env.production_api
        .register_block(RegisterBlockRequest {
            block_id: block_id.to_string(),
            length_in: Some(120.0),
            width_in: Some(60.0),
            height_in: Some(72.0),
            density: Some(2.7),
            gross_weight_t: Some(22.0),
            net_weight_t: Some(20.5),
            material_type: Some("花岗岩".to_string()),
            color: Some("芝麻白".to_string()),
            mine_name: Some("麻城矿区".to_string()),
            vehicle_no: Some("鄂A·12345".to_string()),
            received_at: None,
        })
        .unwrap();
}

/// 配置一个测试货架（A 行）
pub fn seed_stand(env: &TestEnv, stand_id: &str, position_no: i64, max_capacity: i64) {
    env.inventory_api
        .create_stand(stand_id, "A", position_no, max_capacity)
        .unwrap();
}

/// 切割计量负载（操作员录入的权威面积）
pub fn cutting_measurement(total_area_sqft: f64) -> StageMeasurement {
    StageMeasurement::Cutting(CuttingMeasurement {
        total_area_sqft,
        machine_no: Some("QJ-01".to_string()),
        blade_count: Some(60),
        cutting_minutes: None,
        stoppage: StoppageRecord::default(),
    })
}

/// 抛光计量负载
pub fn polishing_measurement() -> StageMeasurement {
    StageMeasurement::Polishing(PolishingMeasurement {
        line_no: Some("PL-02".to_string()),
        slab_count: None,
        polishing_minutes: None,
        stoppage: StoppageRecord::default(),
    })
}

/// 便捷时间: 以一天前为基准偏移 minutes 分钟
///
/// 基准取过去，保证"完工时间缺省取当前时刻"的路径永远晚于作业开工时间
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(1) + Duration::minutes(minutes)
}
