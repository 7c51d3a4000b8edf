// ==========================================
// 生产批次排产核心 - 生产批次仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 多行变更必须在单事务内完成
// ==========================================

use crate::domain::block::ProductionBlock;
use crate::domain::calendar::BusinessDay;
use crate::domain::types::{BlockStatus, ShiftCode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 时间戳存储格式
const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// SELECT 共用列清单(与 map_row 的列序一一对应)
const BLOCK_COLUMNS: &str = r#"block_id, erp_id, parent_id, batch_label,
    article_code, article_desc, client_name, order_no,
    qty_ordered, qty_served, qty_pending, deadline, order_date,
    units, status, planned_date, planned_reactor, planned_shift,
    real_kg, real_duration_h, operator_notes, created_at, updated_at"#;

// ==========================================
// BlockRepository - 生产批次仓储
// ==========================================
pub struct BlockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BlockRepository {
    /// 创建新的BlockRepository实例
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

    /// 创建批次
    ///
    /// # 返回
    /// - `Ok(block_id)`: 成功
    /// - `Err(UniqueConstraintViolation)`: erp_id 冲突
    pub fn create(&self, block: &ProductionBlock) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_on(&conn, block)?;
        Ok(block.block_id.clone())
    }

    /// 按block_id查询批次
    pub fn find_by_id(&self, block_id: &str) -> RepositoryResult<Option<ProductionBlock>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("SELECT {} FROM production_block WHERE block_id = ?", BLOCK_COLUMNS),
            params![block_id],
            |row| Self::map_row(row),
        ) {
            Ok(block) => Ok(Some(block)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按erp_id查询批次
    pub fn find_by_erp_id(&self, erp_id: &str) -> RepositoryResult<Option<ProductionBlock>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("SELECT {} FROM production_block WHERE erp_id = ?", BLOCK_COLUMNS),
            params![erp_id],
            |row| Self::map_row(row),
        ) {
            Ok(block) => Ok(Some(block)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询所有批次,按创建时间降序
    pub fn list_all(&self) -> RepositoryResult<Vec<ProductionBlock>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM production_block ORDER BY created_at DESC, block_id",
            BLOCK_COLUMNS
        ))?;

        let blocks = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(blocks)
    }

    /// 按状态查询批次
    pub fn list_by_status(&self, status: BlockStatus) -> RepositoryResult<Vec<ProductionBlock>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM production_block WHERE status = ? ORDER BY created_at DESC, block_id",
            BLOCK_COLUMNS
        ))?;

        let blocks = stmt
            .query_map(params![status.to_db_str()], |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(blocks)
    }

    /// 查询所有带计划日期的已排产批次(冲突检测输入)
    pub fn list_planned_with_date(&self) -> RepositoryResult<Vec<ProductionBlock>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM production_block
             WHERE status = 'PLANNED' AND planned_date IS NOT NULL
             ORDER BY planned_date, block_id",
            BLOCK_COLUMNS
        ))?;

        let blocks = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(blocks)
    }

    /// 全量更新批次
    ///
    /// # 返回
    /// - `Err(NotFound)`: block_id 不存在
    pub fn update(&self, block: &ProductionBlock) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            r#"UPDATE production_block
               SET erp_id = ?, parent_id = ?, batch_label = ?,
                   article_code = ?, article_desc = ?, client_name = ?, order_no = ?,
                   qty_ordered = ?, qty_served = ?, qty_pending = ?,
                   deadline = ?, order_date = ?, units = ?, status = ?,
                   planned_date = ?, planned_reactor = ?, planned_shift = ?,
                   real_kg = ?, real_duration_h = ?, operator_notes = ?,
                   updated_at = ?
               WHERE block_id = ?"#,
            params![
                &block.erp_id,
                &block.parent_id,
                &block.batch_label,
                &block.article_code,
                &block.article_desc,
                &block.client_name,
                &block.order_no,
                block.qty_ordered,
                block.qty_served,
                block.qty_pending,
                block.deadline.map(|d| d.to_db_str()),
                block.order_date.map(|d| d.to_db_str()),
                block.units,
                block.status.to_db_str(),
                block.planned_date.map(|d| d.to_db_str()),
                &block.planned_reactor,
                block.planned_shift.map(|s| s.to_db_str()),
                block.real_kg,
                block.real_duration_h,
                &block.operator_notes,
                block.updated_at.format(TS_FMT).to_string(),
                &block.block_id,
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionBlock".to_string(),
                id: block.block_id.clone(),
            });
        }

        Ok(())
    }

    /// 删除单个批次
    ///
    /// # 返回
    /// - `Ok(true)`: 已删除
    /// - `Ok(false)`: 批次不存在(删除天然幂等)
    pub fn delete(&self, block_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "DELETE FROM production_block WHERE block_id = ?",
            params![block_id],
        )?;

        Ok(rows > 0)
    }

    /// 按状态批量删除,返回删除行数
    pub fn delete_by_status(&self, status: BlockStatus) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "DELETE FROM production_block WHERE status = ?",
            params![status.to_db_str()],
        )?;

        Ok(rows)
    }

    /// 全量删除,返回删除行数
    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let rows = conn.execute("DELETE FROM production_block", [])?;

        Ok(rows)
    }

    /// 拆分落库: 插入全部子批次并删除源批次(单事务)
    ///
    /// 任一步失败整体回滚,不产生孤儿子批次
    pub fn replace_with_children(
        &self,
        source_id: &str,
        children: &[ProductionBlock],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        for child in children {
            Self::insert_on(&tx, child)?;
        }

        let rows = tx.execute(
            "DELETE FROM production_block WHERE block_id = ?",
            params![source_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionBlock".to_string(),
                id: source_id.to_string(),
            });
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(())
    }

    /// 批量撤排: PLANNED -> PENDING 并清空计划字段(单事务,全有或全无)
    ///
    /// # 语义
    /// - 未知 id: 整体失败 (NotFound)
    /// - PRODUCED/CANCELLED: 整体失败 (InvalidStateTransition)
    /// - 已是 PENDING: 容忍(撤排幂等),不计数
    ///
    /// # 返回
    /// - `Ok(count)`: 实际发生 PLANNED -> PENDING 迁移的行数
    pub fn bulk_unplan(&self, block_ids: &[String], now: NaiveDateTime) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        // BEGIN IMMEDIATE: 先查状态再更新,必须在写锁内进行
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;

        let mut count = 0usize;
        for block_id in block_ids {
            let status_raw: String = match tx.query_row(
                "SELECT status FROM production_block WHERE block_id = ?",
                params![block_id],
                |row| row.get(0),
            ) {
                Ok(s) => s,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(RepositoryError::NotFound {
                        entity: "ProductionBlock".to_string(),
                        id: block_id.clone(),
                    });
                }
                Err(e) => return Err(e.into()),
            };

            let status = BlockStatus::from_str(&status_raw).ok_or_else(|| {
                RepositoryError::ValidationError(format!(
                    "批次{}存在非法状态值: {}",
                    block_id, status_raw
                ))
            })?;

            match status {
                BlockStatus::Planned => {
                    tx.execute(
                        r#"UPDATE production_block
                           SET status = 'PENDING',
                               planned_date = NULL,
                               planned_reactor = NULL,
                               planned_shift = NULL,
                               updated_at = ?
                           WHERE block_id = ?"#,
                        params![now.format(TS_FMT).to_string(), block_id],
                    )?;
                    count += 1;
                }
                BlockStatus::Pending => {
                    // 撤排幂等: 已是 PENDING 直接跳过
                }
                other => {
                    return Err(RepositoryError::InvalidStateTransition {
                        from: other.to_db_str().to_string(),
                        to: "PENDING".to_string(),
                    });
                }
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(count)
    }

    /// 在指定连接/事务上插入一行
    fn insert_on(conn: &Connection, block: &ProductionBlock) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO production_block (
                block_id, erp_id, parent_id, batch_label,
                article_code, article_desc, client_name, order_no,
                qty_ordered, qty_served, qty_pending, deadline, order_date,
                units, status, planned_date, planned_reactor, planned_shift,
                real_kg, real_duration_h, operator_notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &block.block_id,
                &block.erp_id,
                &block.parent_id,
                &block.batch_label,
                &block.article_code,
                &block.article_desc,
                &block.client_name,
                &block.order_no,
                block.qty_ordered,
                block.qty_served,
                block.qty_pending,
                block.deadline.map(|d| d.to_db_str()),
                block.order_date.map(|d| d.to_db_str()),
                block.units,
                block.status.to_db_str(),
                block.planned_date.map(|d| d.to_db_str()),
                &block.planned_reactor,
                block.planned_shift.map(|s| s.to_db_str()),
                block.real_kg,
                block.real_duration_h,
                &block.operator_notes,
                block.created_at.format(TS_FMT).to_string(),
                block.updated_at.format(TS_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 映射数据库行到ProductionBlock对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ProductionBlock> {
        Ok(ProductionBlock {
            block_id: row.get(0)?,
            erp_id: row.get(1)?,
            parent_id: row.get(2)?,
            batch_label: row.get(3)?,
            article_code: row.get(4)?,
            article_desc: row.get(5)?,
            client_name: row.get(6)?,
            order_no: row.get(7)?,
            qty_ordered: row.get(8)?,
            qty_served: row.get(9)?,
            qty_pending: row.get(10)?,
            deadline: parse_day_opt(11, row.get(11)?)?,
            order_date: parse_day_opt(12, row.get(12)?)?,
            units: row.get(13)?,
            status: parse_status(14, &row.get::<_, String>(14)?)?,
            planned_date: parse_day_opt(15, row.get(15)?)?,
            planned_reactor: row.get(16)?,
            planned_shift: parse_shift_opt(17, row.get(17)?)?,
            real_kg: row.get(18)?,
            real_duration_h: row.get(19)?,
            operator_notes: row.get(20)?,
            created_at: parse_ts(21, &row.get::<_, String>(21)?)?,
            updated_at: parse_ts(22, &row.get::<_, String>(22)?)?,
        })
    }
}

// ==========================================
// 行解析辅助函数
// ==========================================

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        msg.into(),
    )
}

fn parse_status(idx: usize, raw: &str) -> rusqlite::Result<BlockStatus> {
    BlockStatus::from_str(raw).ok_or_else(|| conversion_error(idx, format!("未知批次状态: {}", raw)))
}

fn parse_shift_opt(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<ShiftCode>> {
    match raw {
        None => Ok(None),
        Some(s) => ShiftCode::from_str(&s)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, format!("未知班次: {}", s))),
    }
}

fn parse_day_opt(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<BusinessDay>> {
    match raw {
        None => Ok(None),
        Some(s) => BusinessDay::parse(&s)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, format!("日期格式错误: {}", s))),
    }
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FMT).map_err(|e| conversion_error(idx, e.to_string()))
}
