// ==========================================
// 生产批次排产核心 - 演示库重建与造数脚本
// ==========================================
// 用法: reset_and_seed_demo_db [db_path]
// 效果: 备份旧库 -> 重建 schema -> 写入演示配置/
//       反应釜/节假日/批次
// ==========================================

use chrono::Local;
use rusqlite::params;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use batch_aps_core::config::{KEY_BATCH_SPLIT_LIMIT, KEY_BUSINESS_UTC_OFFSET_MINUTES};
use batch_aps_core::db::{init_schema, open_sqlite_connection};
use batch_aps_core::domain::types::ShiftCode;
use batch_aps_core::engine::lifecycle::NewBlock;
use batch_aps_core::engine::BlockLifecycleEngine;
use batch_aps_core::repository::{BlockRepository, HolidayRepository};
use batch_aps_core::BusinessDay;

const DEFAULT_DB_PATH: &str = "batch_aps_demo.db";

fn main() -> Result<(), Box<dyn Error>> {
    batch_aps_core::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    seed_config(&conn)?;
    seed_reactors(&conn)?;

    let conn = Arc::new(Mutex::new(conn));
    let block_repo = Arc::new(BlockRepository::new(conn.clone()));
    let holiday_repo = Arc::new(HolidayRepository::new(conn.clone()));

    seed_holidays(&holiday_repo)?;
    seed_blocks(&block_repo, &holiday_repo)?;

    print_quick_counts(&conn)?;

    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak_{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;
    println!("旧库已备份至 {}", backup_path);

    Ok(())
}

fn seed_config(conn: &rusqlite::Connection) -> Result<(), Box<dyn Error>> {
    for (key, value) in [
        (KEY_BATCH_SPLIT_LIMIT, "2000"),
        (KEY_BUSINESS_UTC_OFFSET_MINUTES, "60"),
    ] {
        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value)
               VALUES ('global', ?1, ?2)
               ON CONFLICT (scope_id, key) DO UPDATE SET value = excluded.value"#,
            params![key, value],
        )?;
    }
    Ok(())
}

fn seed_reactors(conn: &rusqlite::Connection) -> Result<(), Box<dyn Error>> {
    let now = chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    for (name, plant, capacity, target) in [
        ("R-01", "PLANT-A", 2000.0, 4000.0),
        ("R-02", "PLANT-A", 1500.0, 3000.0),
        ("R-03", "PLANT-B", 3000.0, 3000.0),
    ] {
        conn.execute(
            r#"INSERT INTO reactor (
                reactor_name, plant, capacity_kg, daily_target_kg, active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, 1, ?, ?)"#,
            params![name, plant, capacity, target, &now, &now],
        )?;
    }
    Ok(())
}

fn seed_holidays(holiday_repo: &HolidayRepository) -> Result<(), Box<dyn Error>> {
    for (date, desc) in [
        ("2026-01-01", "元旦"),
        ("2026-01-06", "主显节"),
        ("2026-05-01", "劳动节"),
    ] {
        let day = BusinessDay::parse(date).ok_or("节假日日期格式错误")?;
        holiday_repo.upsert(day, Some(desc))?;
    }
    Ok(())
}

fn seed_blocks(
    block_repo: &Arc<BlockRepository>,
    holiday_repo: &Arc<HolidayRepository>,
) -> Result<(), Box<dyn Error>> {
    let lifecycle = BlockLifecycleEngine::new(block_repo.clone(), holiday_repo.clone());

    // 一个超限批次(可演示拆分)
    lifecycle.create_block(NewBlock {
        erp_id: Some("ERP-1001".to_string()),
        article_code: "RESIN-A".to_string(),
        article_desc: Some("演示树脂A".to_string()),
        client_name: Some("演示客户".to_string()),
        order_no: Some("PO-2026-001".to_string()),
        qty_ordered: 4500,
        qty_served: 0,
        qty_pending: 4500,
        deadline: BusinessDay::parse("2026-04-01"),
        order_date: BusinessDay::parse("2026-03-01"),
        units: 4500,
    })?;

    // 一个排在节假日的批次(可演示冲突检测)
    let conflicted = lifecycle.create_block(NewBlock {
        erp_id: Some("ERP-1002".to_string()),
        article_code: "RESIN-B".to_string(),
        article_desc: Some("演示树脂B".to_string()),
        client_name: Some("演示客户".to_string()),
        order_no: Some("PO-2026-002".to_string()),
        qty_ordered: 800,
        qty_served: 0,
        qty_pending: 800,
        deadline: BusinessDay::parse("2026-02-01"),
        order_date: BusinessDay::parse("2026-01-02"),
        units: 800,
    })?;
    let day = BusinessDay::parse("2026-01-06").ok_or("日期格式错误")?;
    lifecycle.plan_block(&conflicted.block_id, day, "R-01", ShiftCode::Morning)?;

    Ok(())
}

fn print_quick_counts(
    conn: &Arc<Mutex<rusqlite::Connection>>,
) -> Result<(), Box<dyn Error>> {
    let conn = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

    for table in ["production_block", "reactor", "holiday"] {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table),
            [],
            |row| row.get(0),
        )?;
        println!("{}: {} 行", table, count);
    }

    Ok(())
}
