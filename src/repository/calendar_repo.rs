// ==========================================
// 生产批次排产核心 - 工厂日历仓储
// ==========================================
// 节假日与检修窗口的数据访问
// 日期一律以 BusinessDay 的 YYYY-MM-DD 形式存储
// ==========================================

use crate::domain::calendar::{BusinessDay, Holiday, MaintenanceWindow};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// HolidayRepository - 节假日仓储
// ==========================================
pub struct HolidayRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HolidayRepository {
    /// 创建新的HolidayRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记节假日(同日重复登记只覆盖说明文字)
    pub fn upsert(&self, day: BusinessDay, description: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO holiday (holiday_date, description)
               VALUES (?, ?)
               ON CONFLICT (holiday_date) DO UPDATE SET
                   description = excluded.description"#,
            params![day.to_db_str(), description],
        )?;

        Ok(())
    }

    /// 移除节假日
    pub fn delete(&self, day: BusinessDay) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "DELETE FROM holiday WHERE holiday_date = ?",
            params![day.to_db_str()],
        )?;

        Ok(rows > 0)
    }

    /// 查询全部节假日,按日期排序
    pub fn list_all(&self) -> RepositoryResult<Vec<Holiday>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT holiday_date, description, created_at FROM holiday ORDER BY holiday_date",
        )?;

        let holidays = stmt
            .query_map([], |row| {
                Ok(Holiday {
                    holiday_date: parse_day(0, &row.get::<_, String>(0)?)?,
                    description: row.get(1)?,
                    created_at: parse_ts(2, &row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(holidays)
    }

    /// 查询全部节假日日期(冲突检测输入)
    pub fn list_dates(&self) -> RepositoryResult<Vec<BusinessDay>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare("SELECT holiday_date FROM holiday")?;

        let dates = stmt
            .query_map([], |row| parse_day(0, &row.get::<_, String>(0)?))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dates)
    }
}

// ==========================================
// MaintenanceWindowRepository - 检修窗口仓储
// ==========================================
// 只作为参考数据维护,冲突引擎当前不消费
pub struct MaintenanceWindowRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaintenanceWindowRepository {
    /// 创建新的MaintenanceWindowRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建检修窗口
    pub fn create(&self, window: &MaintenanceWindow) -> RepositoryResult<String> {
        if window.start_date > window.end_date {
            return Err(RepositoryError::ValidationError(format!(
                "检修窗口起止颠倒: {} > {}",
                window.start_date, window.end_date
            )));
        }

        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO maintenance_window (
                window_id, reactor_name, start_date, end_date, reason, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &window.window_id,
                &window.reactor_name,
                window.start_date.to_db_str(),
                window.end_date.to_db_str(),
                &window.reason,
                window.created_at.format(TS_FMT).to_string(),
            ],
        )?;

        Ok(window.window_id.clone())
    }

    /// 查询全部检修窗口
    pub fn list_all(&self) -> RepositoryResult<Vec<MaintenanceWindow>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT window_id, reactor_name, start_date, end_date, reason, created_at
               FROM maintenance_window ORDER BY start_date, reactor_name"#,
        )?;

        let windows = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(windows)
    }

    /// 按反应釜查询检修窗口
    pub fn list_by_reactor(&self, reactor_name: &str) -> RepositoryResult<Vec<MaintenanceWindow>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT window_id, reactor_name, start_date, end_date, reason, created_at
               FROM maintenance_window WHERE reactor_name = ? ORDER BY start_date"#,
        )?;

        let windows = stmt
            .query_map(params![reactor_name], |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(windows)
    }

    /// 删除检修窗口
    pub fn delete(&self, window_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "DELETE FROM maintenance_window WHERE window_id = ?",
            params![window_id],
        )?;

        Ok(rows > 0)
    }

    /// 映射数据库行到MaintenanceWindow对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<MaintenanceWindow> {
        Ok(MaintenanceWindow {
            window_id: row.get(0)?,
            reactor_name: row.get(1)?,
            start_date: parse_day(2, &row.get::<_, String>(2)?)?,
            end_date: parse_day(3, &row.get::<_, String>(3)?)?,
            reason: row.get(4)?,
            created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
        })
    }
}

// ==========================================
// 行解析辅助函数
// ==========================================

fn parse_day(idx: usize, raw: &str) -> rusqlite::Result<BusinessDay> {
    BusinessDay::parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("日期格式错误: {}", raw).into(),
        )
    })
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
