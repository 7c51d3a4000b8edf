// ==========================================
// 生产批次排产核心 - 日历冲突 API
// ==========================================
// 职责: 冲突检测与批量整改的对外入口
// ==========================================

use crate::api::error::ApiResult;
use crate::api::validator;
use crate::domain::types::ConflictReason;
use crate::engine::ConflictEngine;
use serde::Serialize;
use std::sync::Arc;

// ==========================================
// 响应 DTO
// ==========================================

/// 单条冲突明细
#[derive(Debug, Clone, Serialize)]
pub struct ConflictItem {
    pub block_id: String,              // 冲突批次ID
    pub reason: ConflictReason,        // 冲突原因 (weekend/holiday)
    pub planned_date: String,          // 计划日 (YYYY-MM-DD)
    pub planned_reactor: Option<String>, // 计划反应釜
}

/// 冲突检测报告
#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    pub count: usize,                // 冲突总数
    pub conflicts: Vec<ConflictItem>, // 冲突明细
}

/// 批量整改响应
#[derive(Debug, Clone, Serialize)]
pub struct ResolveConflictsResponse {
    pub resolved: usize, // 实际撤排的批次数
}

// ==========================================
// ConflictApi - 日历冲突接口
// ==========================================
pub struct ConflictApi {
    engine: Arc<ConflictEngine>,
}

impl ConflictApi {
    /// 创建新的ConflictApi实例
    pub fn new(engine: Arc<ConflictEngine>) -> Self {
        Self { engine }
    }

    /// 检测冲突(只读)
    pub fn detect_conflicts(&self) -> ApiResult<ConflictReport> {
        let conflicts = self.engine.detect_conflicts()?;

        let items = conflicts
            .into_iter()
            .map(|c| ConflictItem {
                block_id: c.block.block_id.clone(),
                reason: c.reason,
                planned_date: c
                    .block
                    .planned_date
                    .map(|d| d.to_db_str())
                    .unwrap_or_default(),
                planned_reactor: c.block.planned_reactor.clone(),
            })
            .collect::<Vec<_>>();

        Ok(ConflictReport {
            count: items.len(),
            conflicts: items,
        })
    }

    /// 批量整改(单事务全有或全无)
    pub fn resolve_conflicts(&self, block_ids: &[String]) -> ApiResult<ResolveConflictsResponse> {
        validator::require_non_empty_ids("block_ids", block_ids)?;

        let resolved = self.engine.resolve_conflicts(block_ids)?;
        Ok(ResolveConflictsResponse { resolved })
    }
}
