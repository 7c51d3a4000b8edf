// ==========================================
// 生产批次排产核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 约束: 拆分上限等配置在使用时即时读取,不做进程内缓存
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 批次拆分上限的配置键
pub const KEY_BATCH_SPLIT_LIMIT: &str = "batch_split_limit";
/// 业务时区偏移(分钟)的配置键
pub const KEY_BUSINESS_UTC_OFFSET_MINUTES: &str = "business_utc_offset_minutes";

/// 批次拆分上限默认值
pub const DEFAULT_BATCH_SPLIT_LIMIT: i64 = 2000;
/// 业务时区偏移默认值(分钟, UTC+1)
pub const DEFAULT_BUSINESS_UTC_OFFSET_MINUTES: i32 = 60;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES ('global', ?1, ?2, datetime('now'))
               ON CONFLICT (scope_id, key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 批次拆分上限（每次拆分时即时读取）
    ///
    /// # 返回
    /// - 配置值,缺省 2000；配置非法(<=0 或非数字)时回落默认值
    pub fn get_batch_split_limit(&self) -> Result<i64, Box<dyn Error>> {
        let raw = match self.get_config_value(KEY_BATCH_SPLIT_LIMIT)? {
            Some(v) => v,
            None => return Ok(DEFAULT_BATCH_SPLIT_LIMIT),
        };

        match raw.trim().parse::<i64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                tracing::warn!(raw = %raw, "batch_split_limit 配置非法,回落默认值");
                Ok(DEFAULT_BATCH_SPLIT_LIMIT)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 审计与问题回溯: 记录某次拆分/取号发生时的配置全貌
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 业务时区相对 UTC 的偏移(分钟)
    pub fn get_business_utc_offset_minutes(&self) -> Result<i32, Box<dyn Error>> {
        let raw = match self.get_config_value(KEY_BUSINESS_UTC_OFFSET_MINUTES)? {
            Some(v) => v,
            None => return Ok(DEFAULT_BUSINESS_UTC_OFFSET_MINUTES),
        };

        match raw.trim().parse::<i32>() {
            // 合法偏移: 与 chrono FixedOffset 同界 (±24h 开区间)
            Ok(v) if v.abs() < 24 * 60 => Ok(v),
            _ => {
                tracing::warn!(raw = %raw, "business_utc_offset_minutes 配置非法,回落默认值");
                Ok(DEFAULT_BUSINESS_UTC_OFFSET_MINUTES)
            }
        }
    }
}
