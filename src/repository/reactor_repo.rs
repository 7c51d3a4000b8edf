// ==========================================
// 生产批次排产核心 - 反应釜仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::reactor::Reactor;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ReactorRepository - 反应釜仓储
// ==========================================
pub struct ReactorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReactorRepository {
    /// 创建新的ReactorRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建或整体覆盖反应釜(按名称 UPSERT)
    pub fn upsert(&self, reactor: &Reactor) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO reactor (
                reactor_name, plant, capacity_kg, daily_target_kg, active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (reactor_name) DO UPDATE SET
                plant = excluded.plant,
                capacity_kg = excluded.capacity_kg,
                daily_target_kg = excluded.daily_target_kg,
                active = excluded.active,
                updated_at = excluded.updated_at"#,
            params![
                &reactor.reactor_name,
                &reactor.plant,
                reactor.capacity_kg,
                reactor.daily_target_kg,
                reactor.active,
                reactor.created_at.format(TS_FMT).to_string(),
                reactor.updated_at.format(TS_FMT).to_string(),
            ],
        )?;

        Ok(())
    }

    /// 按名称查询反应釜
    pub fn find_by_name(&self, reactor_name: &str) -> RepositoryResult<Option<Reactor>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT reactor_name, plant, capacity_kg, daily_target_kg, active,
                      created_at, updated_at
               FROM reactor WHERE reactor_name = ?"#,
            params![reactor_name],
            |row| Self::map_row(row),
        ) {
            Ok(reactor) => Ok(Some(reactor)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询所有反应釜,按名称排序
    pub fn list_all(&self) -> RepositoryResult<Vec<Reactor>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT reactor_name, plant, capacity_kg, daily_target_kg, active,
                      created_at, updated_at
               FROM reactor ORDER BY reactor_name"#,
        )?;

        let reactors = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reactors)
    }

    /// 查询在役反应釜
    pub fn list_active(&self) -> RepositoryResult<Vec<Reactor>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT reactor_name, plant, capacity_kg, daily_target_kg, active,
                      created_at, updated_at
               FROM reactor WHERE active = 1 ORDER BY reactor_name"#,
        )?;

        let reactors = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reactors)
    }

    /// 删除反应釜
    ///
    /// 历史批次对反应釜是软引用,删除不影响既有批次
    pub fn delete(&self, reactor_name: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "DELETE FROM reactor WHERE reactor_name = ?",
            params![reactor_name],
        )?;

        Ok(rows > 0)
    }

    /// 映射数据库行到Reactor对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Reactor> {
        Ok(Reactor {
            reactor_name: row.get(0)?,
            plant: row.get(1)?,
            capacity_kg: row.get(2)?,
            daily_target_kg: row.get(3)?,
            active: row.get(4)?,
            created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
            updated_at: parse_ts(6, &row.get::<_, String>(6)?)?,
        })
    }
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
