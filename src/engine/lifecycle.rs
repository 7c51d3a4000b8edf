// ==========================================
// 生产批次排产核心 - 批次生命周期引擎
// ==========================================
// 职责: 批次创建与状态迁移 (排产/实绩/撤排/取消)
// 红线: 状态迁移必须走 BlockStatus 迁移表
// 红线: 计划字段非空 当且仅当 PLANNED
// 说明: 排产落在周末/节假日只做软校验(告警不拦截),
//       事后由日历冲突引擎兜底
// ==========================================

use crate::domain::block::ProductionBlock;
use crate::domain::calendar::BusinessDay;
use crate::domain::types::{BlockStatus, ShiftCode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{BlockRepository, HolidayRepository};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// NewBlock - 批次创建入参
// ==========================================
// 外部订单导入协作方整理好的字段集
#[derive(Debug, Clone, Default)]
pub struct NewBlock {
    pub erp_id: Option<String>,
    pub article_code: String,
    pub article_desc: Option<String>,
    pub client_name: Option<String>,
    pub order_no: Option<String>,
    pub qty_ordered: i64,
    pub qty_served: i64,
    pub qty_pending: i64,
    pub deadline: Option<BusinessDay>,
    pub order_date: Option<BusinessDay>,
    pub units: i64,
}

// ==========================================
// BlockLifecycleEngine - 批次生命周期引擎
// ==========================================
pub struct BlockLifecycleEngine {
    block_repo: Arc<BlockRepository>,
    holiday_repo: Arc<HolidayRepository>,
}

impl BlockLifecycleEngine {
    /// 创建新的 BlockLifecycleEngine 实例
    pub fn new(block_repo: Arc<BlockRepository>, holiday_repo: Arc<HolidayRepository>) -> Self {
        Self {
            block_repo,
            holiday_repo,
        }
    }

    /// 创建批次(初始状态 PENDING)
    ///
    /// # 返回
    /// - `Err(ValidationError)`: units <= 0 或物料编码为空
    /// - `Err(UniqueConstraintViolation)`: erp_id 已存在
    #[instrument(skip(self, fields), fields(article_code = %fields.article_code))]
    pub fn create_block(&self, fields: NewBlock) -> RepositoryResult<ProductionBlock> {
        if fields.units <= 0 {
            return Err(RepositoryError::ValidationError(format!(
                "units 必须为正数: {}",
                fields.units
            )));
        }
        if fields.article_code.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "物料编码不能为空".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let block = ProductionBlock {
            block_id: uuid::Uuid::new_v4().to_string(),
            erp_id: fields.erp_id,
            parent_id: None,
            batch_label: None,
            article_code: fields.article_code,
            article_desc: fields.article_desc,
            client_name: fields.client_name,
            order_no: fields.order_no,
            qty_ordered: fields.qty_ordered,
            qty_served: fields.qty_served,
            qty_pending: fields.qty_pending,
            deadline: fields.deadline,
            order_date: fields.order_date,
            units: fields.units,
            status: BlockStatus::Pending,
            planned_date: None,
            planned_reactor: None,
            planned_shift: None,
            real_kg: None,
            real_duration_h: None,
            operator_notes: None,
            created_at: now,
            updated_at: now,
        };

        self.block_repo.create(&block)?;
        tracing::info!(block_id = %block.block_id, "批次已创建");

        Ok(block)
    }

    /// 指定计划: PENDING -> PLANNED
    ///
    /// 要求日期/反应釜/班次齐备;
    /// 周末/节假日只告警,不拦截
    #[instrument(skip(self))]
    pub fn plan_block(
        &self,
        block_id: &str,
        date: BusinessDay,
        reactor: &str,
        shift: ShiftCode,
    ) -> RepositoryResult<ProductionBlock> {
        if reactor.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "计划反应釜不能为空".to_string(),
            ));
        }

        let mut block = self.load(block_id)?;
        self.guard_transition(&block, BlockStatus::Planned)?;

        // 软校验: 非工作日排产只告警
        if date.is_weekend() {
            tracing::warn!(block_id, %date, "计划日落在周末");
        } else if self.holiday_repo.list_dates()?.contains(&date) {
            tracing::warn!(block_id, %date, "计划日落在节假日");
        }

        block.status = BlockStatus::Planned;
        block.planned_date = Some(date);
        block.planned_reactor = Some(reactor.trim().to_string());
        block.planned_shift = Some(shift);
        block.updated_at = Utc::now().naive_utc();

        self.block_repo.update(&block)?;
        Ok(block)
    }

    /// 记录生产实绩: PLANNED -> PRODUCED
    ///
    /// real_kg 与 real_duration_h 至少提供其一
    #[instrument(skip(self, operator_notes))]
    pub fn record_execution(
        &self,
        block_id: &str,
        real_kg: Option<f64>,
        real_duration_h: Option<f64>,
        operator_notes: Option<String>,
    ) -> RepositoryResult<ProductionBlock> {
        if real_kg.is_none() && real_duration_h.is_none() {
            return Err(RepositoryError::ValidationError(
                "实绩必须提供 real_kg 或 real_duration_h 之一".to_string(),
            ));
        }
        if real_kg.is_some_and(|v| v < 0.0) || real_duration_h.is_some_and(|v| v < 0.0) {
            return Err(RepositoryError::ValidationError(
                "实绩数值不能为负".to_string(),
            ));
        }

        let mut block = self.load(block_id)?;
        self.guard_transition(&block, BlockStatus::Produced)?;

        block.status = BlockStatus::Produced;
        block.real_kg = real_kg;
        block.real_duration_h = real_duration_h;
        block.operator_notes = operator_notes;
        block.updated_at = Utc::now().naive_utc();

        self.block_repo.update(&block)?;
        Ok(block)
    }

    /// 撤排: PLANNED -> PENDING,清空计划字段(幂等)
    #[instrument(skip(self))]
    pub fn unplan_block(&self, block_id: &str) -> RepositoryResult<ProductionBlock> {
        let mut block = self.load(block_id)?;

        // 已是 PENDING: 幂等返回,不落库
        if block.status == BlockStatus::Pending {
            return Ok(block);
        }

        self.guard_transition(&block, BlockStatus::Pending)?;

        block.status = BlockStatus::Pending;
        block.clear_planning_fields();
        block.updated_at = Utc::now().naive_utc();

        self.block_repo.update(&block)?;
        Ok(block)
    }

    /// 管理性取消: 任意状态 -> CANCELLED
    #[instrument(skip(self))]
    pub fn cancel_block(&self, block_id: &str) -> RepositoryResult<ProductionBlock> {
        let mut block = self.load(block_id)?;
        self.guard_transition(&block, BlockStatus::Cancelled)?;

        block.status = BlockStatus::Cancelled;
        block.clear_planning_fields();
        block.updated_at = Utc::now().naive_utc();

        self.block_repo.update(&block)?;
        tracing::info!(block_id, "批次已取消");
        Ok(block)
    }

    /// 加载批次,不存在即 NotFound
    fn load(&self, block_id: &str) -> RepositoryResult<ProductionBlock> {
        self.block_repo
            .find_by_id(block_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ProductionBlock".to_string(),
                id: block_id.to_string(),
            })
    }

    /// 迁移表门禁
    fn guard_transition(
        &self,
        block: &ProductionBlock,
        to: BlockStatus,
    ) -> RepositoryResult<()> {
        if !block.status.can_transition_to(to) {
            return Err(RepositoryError::InvalidStateTransition {
                from: block.status.to_db_str().to_string(),
                to: to.to_db_str().to_string(),
            });
        }
        Ok(())
    }
}
