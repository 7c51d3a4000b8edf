// ==========================================
// 生产批次排产核心 - 批次拆分引擎
// ==========================================
// 职责: 将超限批次拆成容量受限的子批次
// 算法: parts = ceil(units / limit),
//       第 i 份 = min(units - (i-1)*limit, limit), 标记 "T{i}"
// 红线: 子批次插入 + 源批次删除 = 单事务
// 红线: 子批次 units 之和 == 源批次 units (无损分割)
// 说明: 拆分上限在每次拆分时即时读取配置
// ==========================================

use crate::config::ConfigManager;
use crate::domain::block::ProductionBlock;
use crate::domain::types::BlockStatus;
use crate::repository::error::RepositoryError;
use crate::repository::BlockRepository;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

// ==========================================
// 拆分错误
// ==========================================
#[derive(Error, Debug)]
pub enum SplitError {
    #[error("无需拆分: units={units} 未超过上限 limit={limit}")]
    NoSplitNeeded { units: i64, limit: i64 },

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 拆分结果
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub parts: usize,                     // 子批次数量
    pub new_blocks: Vec<ProductionBlock>, // 新生成的子批次
}

// ==========================================
// BatchSplitter - 批次拆分引擎
// ==========================================
pub struct BatchSplitter {
    block_repo: Arc<BlockRepository>,
    config: Arc<ConfigManager>,
}

impl BatchSplitter {
    /// 创建新的 BatchSplitter 实例
    pub fn new(block_repo: Arc<BlockRepository>, config: Arc<ConfigManager>) -> Self {
        Self { block_repo, config }
    }

    /// 拆分批次
    ///
    /// 源批次状态不设限(拆分后子批次一律回到 PENDING,
    /// 重新进入排产漏斗);源批次在同一事务内被删除。
    ///
    /// # 返回
    /// - `Ok(SplitOutcome)`: 拆分成功
    /// - `Err(NoSplitNeeded)`: units <= limit,未发生任何变更
    /// - `Err(Repository(NotFound))`: 批次不存在
    #[instrument(skip(self))]
    pub fn split_block(&self, block_id: &str) -> Result<SplitOutcome, SplitError> {
        let source = self
            .block_repo
            .find_by_id(block_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ProductionBlock".to_string(),
                id: block_id.to_string(),
            })?;

        let limit = self
            .config
            .get_batch_split_limit()
            .map_err(|e| SplitError::Config(e.to_string()))?;

        if source.units <= limit {
            return Err(SplitError::NoSplitNeeded {
                units: source.units,
                limit,
            });
        }

        let children = Self::partition(&source, limit);
        debug_assert_eq!(
            children.iter().map(|c| c.units).sum::<i64>(),
            source.units
        );

        self.block_repo
            .replace_with_children(&source.block_id, &children)?;

        tracing::info!(
            block_id = %source.block_id,
            parts = children.len(),
            limit,
            "批次已拆分"
        );

        Ok(SplitOutcome {
            parts: children.len(),
            new_blocks: children,
        })
    }

    /// 纯内存分割: 生成全部子批次
    fn partition(source: &ProductionBlock, limit: i64) -> Vec<ProductionBlock> {
        let parts = (source.units as u64).div_ceil(limit as u64) as i64;
        let now = Utc::now().naive_utc();

        (1..=parts)
            .map(|i| {
                let units = (source.units - (i - 1) * limit).min(limit);
                let label = format!("T{}", i);
                // 有 erp_id 则以 "-T{i}" 后缀保持外部可追溯,否则子批次无外部ID
                let erp_id = source.erp_id.as_ref().map(|e| format!("{}-{}", e, label));

                ProductionBlock {
                    block_id: uuid::Uuid::new_v4().to_string(),
                    erp_id,
                    parent_id: Some(source.block_id.clone()),
                    batch_label: Some(label),
                    article_code: source.article_code.clone(),
                    article_desc: source.article_desc.clone(),
                    client_name: source.client_name.clone(),
                    order_no: source.order_no.clone(),
                    qty_ordered: source.qty_ordered,
                    qty_served: source.qty_served,
                    qty_pending: source.qty_pending,
                    deadline: source.deadline,
                    order_date: source.order_date,
                    units,
                    // 无论源批次处于何种状态,子批次一律 PENDING
                    status: BlockStatus::Pending,
                    planned_date: None,
                    planned_reactor: None,
                    planned_shift: None,
                    real_kg: None,
                    real_duration_h: None,
                    operator_notes: None,
                    created_at: now,
                    updated_at: now,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::BusinessDay;

    fn source_block(units: i64, erp_id: Option<&str>) -> ProductionBlock {
        let now = Utc::now().naive_utc();
        ProductionBlock {
            block_id: "SRC".to_string(),
            erp_id: erp_id.map(|s| s.to_string()),
            parent_id: None,
            batch_label: None,
            article_code: "ART-7".to_string(),
            article_desc: Some("树脂A".to_string()),
            client_name: Some("客户甲".to_string()),
            order_no: Some("PO-88".to_string()),
            qty_ordered: 5000,
            qty_served: 500,
            qty_pending: 4500,
            deadline: BusinessDay::parse("2026-04-01"),
            order_date: BusinessDay::parse("2026-03-01"),
            units,
            status: BlockStatus::Planned,
            planned_date: BusinessDay::parse("2026-03-10"),
            planned_reactor: Some("R-01".to_string()),
            planned_shift: None,
            real_kg: None,
            real_duration_h: None,
            operator_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_partition_4500_by_2000() {
        let children = BatchSplitter::partition(&source_block(4500, Some("ERP-1")), 2000);

        assert_eq!(children.len(), 3);
        assert_eq!(
            children.iter().map(|c| c.units).collect::<Vec<_>>(),
            vec![2000, 2000, 500]
        );
        assert_eq!(
            children
                .iter()
                .map(|c| c.batch_label.clone().unwrap())
                .collect::<Vec<_>>(),
            vec!["T1", "T2", "T3"]
        );
        assert_eq!(children[1].erp_id.as_deref(), Some("ERP-1-T2"));
    }

    #[test]
    fn test_partition_exact_multiple() {
        let children = BatchSplitter::partition(&source_block(4000, None), 2000);

        assert_eq!(children.len(), 2);
        assert_eq!(
            children.iter().map(|c| c.units).collect::<Vec<_>>(),
            vec![2000, 2000]
        );
        // 源批次无 erp_id 时子批次也没有
        assert!(children.iter().all(|c| c.erp_id.is_none()));
    }

    #[test]
    fn test_partition_forces_pending_and_lineage() {
        // 源批次是 PLANNED,子批次必须回到 PENDING 且不携带计划字段
        let children = BatchSplitter::partition(&source_block(2001, None), 1000);

        assert_eq!(children.len(), 3);
        assert_eq!(children.iter().map(|c| c.units).sum::<i64>(), 2001);
        for child in &children {
            assert_eq!(child.status, BlockStatus::Pending);
            assert!(child.planned_date.is_none());
            assert!(child.planned_reactor.is_none());
            assert_eq!(child.parent_id.as_deref(), Some("SRC"));
            assert!(child.units <= 1000);
            // 描述字段原样复制
            assert_eq!(child.article_code, "ART-7");
            assert_eq!(child.qty_pending, 4500);
        }
    }
}
