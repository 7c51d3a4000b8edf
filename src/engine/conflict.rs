// ==========================================
// 生产批次排产核心 - 日历冲突引擎
// ==========================================
// 职责: 找出计划日落在非工作日的 PLANNED 批次,
//       并提供批量整改(撤排)
// 口径: 周末与节假日的判定统一使用 BusinessDay,
//       同一批次只报告一个原因,周末优先
// 红线: 批量整改单事务全有或全无
// ==========================================

use crate::domain::block::ProductionBlock;
use crate::domain::types::ConflictReason;
use crate::repository::error::RepositoryResult;
use crate::repository::{BlockRepository, HolidayRepository};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

/// 单个排产冲突
#[derive(Debug, Clone)]
pub struct ScheduleConflict {
    pub block: ProductionBlock,     // 冲突批次
    pub reason: ConflictReason,     // 冲突原因
}

// ==========================================
// ConflictEngine - 日历冲突引擎
// ==========================================
pub struct ConflictEngine {
    block_repo: Arc<BlockRepository>,
    holiday_repo: Arc<HolidayRepository>,
}

impl ConflictEngine {
    /// 创建新的 ConflictEngine 实例
    pub fn new(block_repo: Arc<BlockRepository>, holiday_repo: Arc<HolidayRepository>) -> Self {
        Self {
            block_repo,
            holiday_repo,
        }
    }

    /// 检测冲突: 全部带计划日期的 PLANNED 批次 vs 节假日集合
    ///
    /// 只读操作,不做任何变更
    #[instrument(skip(self))]
    pub fn detect_conflicts(&self) -> RepositoryResult<Vec<ScheduleConflict>> {
        let planned = self.block_repo.list_planned_with_date()?;
        let holidays: HashSet<_> = self.holiday_repo.list_dates()?.into_iter().collect();

        let mut conflicts = Vec::new();
        for block in planned {
            // list_planned_with_date 保证 planned_date 非空
            let Some(day) = block.planned_date else {
                continue;
            };

            // 周末优先于节假日,一个批次只报一个原因
            let reason = if day.is_weekend() {
                Some(ConflictReason::Weekend)
            } else if holidays.contains(&day) {
                Some(ConflictReason::Holiday)
            } else {
                None
            };

            if let Some(reason) = reason {
                conflicts.push(ScheduleConflict { block, reason });
            }
        }

        tracing::debug!(count = conflicts.len(), "冲突检测完成");
        Ok(conflicts)
    }

    /// 批量整改: 对每个 id 施加 PLANNED -> PENDING 撤排
    ///
    /// 单事务全有或全无: 任一 id 未知或处于
    /// PRODUCED/CANCELLED,整个调用失败且不产生部分变更
    ///
    /// # 返回
    /// - `Ok(count)`: 实际撤排的批次数
    #[instrument(skip(self, block_ids), fields(ids = block_ids.len()))]
    pub fn resolve_conflicts(&self, block_ids: &[String]) -> RepositoryResult<usize> {
        if block_ids.is_empty() {
            return Ok(0);
        }

        let count = self
            .block_repo
            .bulk_unplan(block_ids, Utc::now().naive_utc())?;

        tracing::info!(resolved = count, "冲突整改完成");
        Ok(count)
    }
}
