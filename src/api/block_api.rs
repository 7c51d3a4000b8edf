// ==========================================
// 生产批次排产核心 - 生产批次 API
// ==========================================
// 职责: 批次创建/排产/实绩/拆分/取消/删除的对外入口
// 权限: 批量清除操作由调用方角色门禁
//       (角色由外部鉴权协作方解析后传入)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::block::ProductionBlock;
use crate::domain::types::{BlockStatus, CallerRole};
use crate::engine::lifecycle::NewBlock;
use crate::engine::{BatchSplitter, BlockLifecycleEngine};
use crate::repository::BlockRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// 请求/响应 DTO
// ==========================================

/// 批次创建请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBlockRequest {
    pub erp_id: Option<String>,
    pub article_code: String,
    pub article_desc: Option<String>,
    pub client_name: Option<String>,
    pub order_no: Option<String>,
    #[serde(default)]
    pub qty_ordered: i64,
    #[serde(default)]
    pub qty_served: i64,
    #[serde(default)]
    pub qty_pending: i64,
    pub deadline: Option<String>,    // YYYY-MM-DD
    pub order_date: Option<String>,  // YYYY-MM-DD
    pub units: i64,
}

/// 拆分响应
#[derive(Debug, Clone, Serialize)]
pub struct SplitBlockResponse {
    pub parts: usize,                     // 子批次数量
    pub new_blocks: Vec<ProductionBlock>, // 新生成的子批次
}

// ==========================================
// BlockApi - 生产批次接口
// ==========================================
pub struct BlockApi {
    lifecycle: Arc<BlockLifecycleEngine>,
    splitter: Arc<BatchSplitter>,
    block_repo: Arc<BlockRepository>,
}

impl BlockApi {
    /// 创建新的BlockApi实例
    pub fn new(
        lifecycle: Arc<BlockLifecycleEngine>,
        splitter: Arc<BatchSplitter>,
        block_repo: Arc<BlockRepository>,
    ) -> Self {
        Self {
            lifecycle,
            splitter,
            block_repo,
        }
    }

    /// 创建批次(初始状态 PENDING)
    pub fn create_block(&self, req: CreateBlockRequest) -> ApiResult<ProductionBlock> {
        validator::require_non_empty("article_code", &req.article_code)?;
        if req.units <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "units 必须为正数: {}",
                req.units
            )));
        }

        let fields = NewBlock {
            erp_id: req.erp_id.filter(|s| !s.trim().is_empty()),
            article_code: req.article_code.trim().to_string(),
            article_desc: req.article_desc,
            client_name: req.client_name,
            order_no: req.order_no,
            qty_ordered: req.qty_ordered,
            qty_served: req.qty_served,
            qty_pending: req.qty_pending,
            deadline: validator::parse_business_day_opt("deadline", req.deadline.as_deref())?,
            order_date: validator::parse_business_day_opt("order_date", req.order_date.as_deref())?,
            units: req.units,
        };

        let block = self.lifecycle.create_block(fields)?;
        Ok(block)
    }

    /// 指定计划: PENDING -> PLANNED
    ///
    /// # 参数
    /// - date: 计划生产日 (YYYY-MM-DD,业务日历日口径)
    /// - reactor: 计划反应釜名称
    /// - shift: 班次 (MORNING/AFTERNOON/NIGHT)
    pub fn plan_block(
        &self,
        block_id: &str,
        date: &str,
        reactor: &str,
        shift: &str,
    ) -> ApiResult<ProductionBlock> {
        validator::require_non_empty("block_id", block_id)?;
        validator::require_non_empty("reactor", reactor)?;
        let day = validator::parse_business_day("date", date)?;
        let shift = validator::parse_shift(shift)?;

        let block = self.lifecycle.plan_block(block_id, day, reactor, shift)?;
        Ok(block)
    }

    /// 记录生产实绩: PLANNED -> PRODUCED
    pub fn record_execution(
        &self,
        block_id: &str,
        real_kg: Option<f64>,
        real_duration_h: Option<f64>,
        operator_notes: Option<String>,
    ) -> ApiResult<ProductionBlock> {
        validator::require_non_empty("block_id", block_id)?;

        let block =
            self.lifecycle
                .record_execution(block_id, real_kg, real_duration_h, operator_notes)?;
        Ok(block)
    }

    /// 拆分批次
    ///
    /// # 返回
    /// - Err(NoSplitNeeded): units 未超上限,未发生任何变更
    pub fn split_block(&self, block_id: &str) -> ApiResult<SplitBlockResponse> {
        validator::require_non_empty("block_id", block_id)?;

        let outcome = self.splitter.split_block(block_id)?;
        Ok(SplitBlockResponse {
            parts: outcome.parts,
            new_blocks: outcome.new_blocks,
        })
    }

    /// 管理性取消: 任意状态 -> CANCELLED
    pub fn cancel_block(&self, block_id: &str) -> ApiResult<ProductionBlock> {
        validator::require_non_empty("block_id", block_id)?;

        let block = self.lifecycle.cancel_block(block_id)?;
        Ok(block)
    }

    /// 撤排: PLANNED -> PENDING (幂等)
    pub fn unplan_block(&self, block_id: &str) -> ApiResult<ProductionBlock> {
        validator::require_non_empty("block_id", block_id)?;

        let block = self.lifecycle.unplan_block(block_id)?;
        Ok(block)
    }

    /// 按id查询批次
    pub fn get_block(&self, block_id: &str) -> ApiResult<ProductionBlock> {
        validator::require_non_empty("block_id", block_id)?;

        self.block_repo
            .find_by_id(block_id)
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::NotFound(format!("ProductionBlock(id={})不存在", block_id)))
    }

    /// 查询批次列表(可按状态过滤)
    pub fn list_blocks(&self, status: Option<BlockStatus>) -> ApiResult<Vec<ProductionBlock>> {
        let blocks = match status {
            Some(s) => self.block_repo.list_by_status(s)?,
            None => self.block_repo.list_all()?,
        };
        Ok(blocks)
    }

    /// 删除单个批次(删除天然幂等)
    ///
    /// # 返回
    /// - Ok(true): 已删除; Ok(false): 批次本就不存在
    pub fn delete_block(&self, block_id: &str) -> ApiResult<bool> {
        validator::require_non_empty("block_id", block_id)?;

        let deleted = self.block_repo.delete(block_id)?;
        Ok(deleted)
    }

    /// 批量清除 PENDING 批次(尽力而为,返回删除数)
    ///
    /// # 权限
    /// - 要求 SCHEDULER 及以上角色
    pub fn clear_pending(&self, role: CallerRole) -> ApiResult<usize> {
        if !role.can_clear_pending() {
            return Err(ApiError::Forbidden(format!(
                "角色 {} 无权执行 clear_pending",
                role
            )));
        }

        let count = self.block_repo.delete_by_status(BlockStatus::Pending)?;
        tracing::info!(count, %role, "PENDING 批次已批量清除");
        Ok(count)
    }

    /// 全量清除批次(尽力而为,返回删除数)
    ///
    /// # 权限
    /// - 仅限 ADMIN 角色
    pub fn clear_all(&self, role: CallerRole) -> ApiResult<usize> {
        if !role.can_clear_all() {
            return Err(ApiError::Forbidden(format!(
                "角色 {} 无权执行 clear_all",
                role
            )));
        }

        let count = self.block_repo.delete_all()?;
        tracing::info!(count, %role, "全部批次已清除");
        Ok(count)
    }
}
