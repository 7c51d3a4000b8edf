// ==========================================
// 生产批次排产核心 - 编号序列仓储
// ==========================================
// 红线: 取号与登记必须在同一事务内原子完成,
//       禁止"先查最大值再应用层加一"的读写模式
// 计数器: code_sequence 表每 (prefix, year) 一行,
//         单条 UPSERT..RETURNING 原子递增
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex};

// ==========================================
// SequenceRepository - 编号序列仓储
// ==========================================
pub struct SequenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SequenceRepository {
    /// 创建新的SequenceRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 按数据库路径打开(每个实例独立连接)
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 原子取号并登记
    ///
    /// 计数器递增与 code_allocation 登记在同一事务内完成;
    /// 并发调用方绝不会拿到同一个号。
    ///
    /// # 参数
    /// - `prefix`: 编号前缀(如 "Q")
    /// - `year_2d`: 两位年份(如 25)
    ///
    /// # 返回
    /// - `Ok((code, seq_no))`: 完整编号与序号
    /// - `Err(UniqueConstraintViolation)`: 登记冲突(调用方可重试)
    pub fn allocate_code(&self, prefix: &str, year_2d: i32) -> RepositoryResult<(String, i64)> {
        let conn = self.get_conn()?;
        // BEGIN IMMEDIATE: 先占写锁,避免并发方在锁升级处互相卡死
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;

        let seq_no: i64 = tx.query_row(
            r#"INSERT INTO code_sequence (prefix, year_2d, next_seq)
               VALUES (?1, ?2, 1)
               ON CONFLICT (prefix, year_2d)
               DO UPDATE SET next_seq = next_seq + 1
               RETURNING next_seq"#,
            params![prefix, year_2d],
            |row| row.get(0),
        )?;

        let code = format!("{}{:02}{:04}", prefix, year_2d, seq_no);

        tx.execute(
            r#"INSERT INTO code_allocation (code, prefix, year_2d, seq_no)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![&code, prefix, year_2d, seq_no],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok((code, seq_no))
    }

    /// 原子分配修订号(0 起始,同 code 内连续)
    ///
    /// MAX(rev_no)+1 的计算与插入在同一事务内完成,
    /// (code, rev_no) 主键兜底并发冲突。
    ///
    /// # 返回
    /// - `Ok(rev_no)`: 新修订号
    /// - `Err(UniqueConstraintViolation)`: 修订号冲突(调用方可重试)
    pub fn next_revision(&self, code: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        // BEGIN IMMEDIATE: MAX+1 的读取必须在写锁内进行
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;

        let rev_no: i64 = tx.query_row(
            "SELECT COALESCE(MAX(rev_no) + 1, 0) FROM code_revision WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO code_revision (code, rev_no) VALUES (?1, ?2)",
            params![code, rev_no],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(rev_no)
    }

    /// 编号是否已登记
    pub fn code_exists(&self, code: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM code_allocation WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// 某 code 家族已发出的修订数
    pub fn revision_count(&self, code: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM code_revision WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// 某 (prefix, year) 已发出的全部序号(升序,测试与审计用)
    pub fn issued_seq_nos(&self, prefix: &str, year_2d: i32) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT seq_no FROM code_allocation
             WHERE prefix = ?1 AND year_2d = ?2
             ORDER BY seq_no",
        )?;

        let rows = stmt
            .query_map(params![prefix, year_2d], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(rows)
    }
}
