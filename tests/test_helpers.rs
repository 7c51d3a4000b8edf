// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、组件装配、
//       测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use batch_aps_core::api::{BlockApi, CalendarApi, CodeApi, ConflictApi, ReactorApi};
use batch_aps_core::config::{ConfigManager, KEY_BATCH_SPLIT_LIMIT, KEY_BUSINESS_UTC_OFFSET_MINUTES};
use batch_aps_core::engine::{
    BatchSplitter, BlockLifecycleEngine, CodeAllocator, ConflictEngine,
};
use batch_aps_core::engine::lifecycle::NewBlock;
use batch_aps_core::repository::{
    BlockRepository, HolidayRepository, MaintenanceWindowRepository, ReactorRepository,
    SequenceRepository,
};
use batch_aps_core::BusinessDay;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("路径非UTF-8")?.to_string();

    let conn = batch_aps_core::db::open_sqlite_connection(&db_path)?;
    batch_aps_core::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(batch_aps_core::db::open_sqlite_connection(db_path)?)
}

/// 写入测试配置（拆分上限 2000 / 业务时区 UTC+1）
pub fn insert_test_config(conn: &Connection) -> Result<(), Box<dyn Error>> {
    for (key, value) in [
        (KEY_BATCH_SPLIT_LIMIT, "2000"),
        (KEY_BUSINESS_UTC_OFFSET_MINUTES, "60"),
    ] {
        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value)
               VALUES ('global', ?1, ?2)
               ON CONFLICT (scope_id, key) DO UPDATE SET value = excluded.value"#,
            rusqlite::params![key, value],
        )?;
    }
    Ok(())
}

// ==========================================
// CoreStack - 组件装配
// ==========================================
// 所有仓储/引擎/API 共享同一个连接
pub struct CoreStack {
    pub conn: Arc<Mutex<Connection>>,
    pub block_repo: Arc<BlockRepository>,
    pub holiday_repo: Arc<HolidayRepository>,
    pub window_repo: Arc<MaintenanceWindowRepository>,
    pub reactor_repo: Arc<ReactorRepository>,
    pub seq_repo: Arc<SequenceRepository>,
    pub config: Arc<ConfigManager>,
    pub lifecycle: Arc<BlockLifecycleEngine>,
    pub splitter: Arc<BatchSplitter>,
    pub conflict_engine: Arc<ConflictEngine>,
    pub allocator: Arc<CodeAllocator>,
    pub block_api: BlockApi,
    pub code_api: CodeApi,
    pub conflict_api: ConflictApi,
    pub reactor_api: ReactorApi,
    pub calendar_api: CalendarApi,
}

/// 在测试数据库上装配完整组件栈
pub fn build_stack(db_path: &str) -> CoreStack {
    let conn = open_test_connection(db_path).expect("打开数据库失败");
    insert_test_config(&conn).expect("插入配置失败");
    let conn = Arc::new(Mutex::new(conn));

    let block_repo = Arc::new(BlockRepository::new(conn.clone()));
    let holiday_repo = Arc::new(HolidayRepository::new(conn.clone()));
    let window_repo = Arc::new(MaintenanceWindowRepository::new(conn.clone()));
    let reactor_repo = Arc::new(ReactorRepository::new(conn.clone()));
    let seq_repo = Arc::new(SequenceRepository::new(conn.clone()));
    let config =
        Arc::new(ConfigManager::from_connection(conn.clone()).expect("创建 ConfigManager 失败"));

    let lifecycle = Arc::new(BlockLifecycleEngine::new(
        block_repo.clone(),
        holiday_repo.clone(),
    ));
    let splitter = Arc::new(BatchSplitter::new(block_repo.clone(), config.clone()));
    let conflict_engine = Arc::new(ConflictEngine::new(
        block_repo.clone(),
        holiday_repo.clone(),
    ));
    let allocator = Arc::new(CodeAllocator::new(seq_repo.clone(), config.clone()));

    let block_api = BlockApi::new(lifecycle.clone(), splitter.clone(), block_repo.clone());
    let code_api = CodeApi::new(allocator.clone());
    let conflict_api = ConflictApi::new(conflict_engine.clone());
    let reactor_api = ReactorApi::new(reactor_repo.clone());
    let calendar_api = CalendarApi::new(holiday_repo.clone(), window_repo.clone());

    CoreStack {
        conn,
        block_repo,
        holiday_repo,
        window_repo,
        reactor_repo,
        seq_repo,
        config,
        lifecycle,
        splitter,
        conflict_engine,
        allocator,
        block_api,
        code_api,
        conflict_api,
        reactor_api,
        calendar_api,
    }
}

/// 生成批次创建入参（units 可指定，其余为演示值）
pub fn new_block_fields(units: i64, erp_id: Option<&str>) -> NewBlock {
    NewBlock {
        erp_id: erp_id.map(|s| s.to_string()),
        article_code: "RESIN-A".to_string(),
        article_desc: Some("测试树脂".to_string()),
        client_name: Some("测试客户".to_string()),
        order_no: Some("PO-T-001".to_string()),
        qty_ordered: units,
        qty_served: 0,
        qty_pending: units,
        deadline: BusinessDay::parse("2026-06-30"),
        order_date: BusinessDay::parse("2026-01-02"),
        units,
    }
}
