// ==========================================
// 生产批次排产核心 - 编号分配引擎
// ==========================================
// 职责: 发放 (prefix, year) 内唯一的单据编号与
//       code 家族内连续的修订号
// 格式: 前缀 + 两位年 + 四位零填充序号, 如 Q250008
// 红线: 并发调用方绝不会拿到同一个编号
// ==========================================

use crate::config::ConfigManager;
use crate::domain::calendar::BusinessDay;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::SequenceRepository;
use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// CodeAllocator - 编号分配引擎
// ==========================================
pub struct CodeAllocator {
    seq_repo: Arc<SequenceRepository>,
    config: Arc<ConfigManager>,
}

impl CodeAllocator {
    /// 创建新的 CodeAllocator 实例
    pub fn new(seq_repo: Arc<SequenceRepository>, config: Arc<ConfigManager>) -> Self {
        Self { seq_repo, config }
    }

    /// 按业务时区的当前年份取号
    ///
    /// # 返回
    /// - `Ok(code)`: 如 "Q250008"
    /// - `Err(UniqueConstraintViolation)`: 登记冲突,调用方可重试
    #[instrument(skip(self))]
    pub fn allocate_code(&self, prefix: &str) -> RepositoryResult<String> {
        let offset = self
            .config
            .get_business_utc_offset_minutes()
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
        let year = BusinessDay::from_utc(Utc::now(), offset).date().year();

        self.allocate_code_for_year(prefix, year)
    }

    /// 按指定年份取号(年度切换与测试场景)
    #[instrument(skip(self))]
    pub fn allocate_code_for_year(&self, prefix: &str, year: i32) -> RepositoryResult<String> {
        validate_prefix(prefix)?;

        let year_2d = year.rem_euclid(100);
        let (code, seq_no) = self.seq_repo.allocate_code(prefix, year_2d)?;

        tracing::debug!(code = %code, seq_no, "编号已发放");
        Ok(code)
    }

    /// 为 code 家族分配下一个修订号(0 起始)
    ///
    /// # 返回
    /// - `Ok(rev_no)`: 首个修订为 0,之后连续递增
    /// - `Err(UniqueConstraintViolation)`: 修订号冲突,调用方可重试
    #[instrument(skip(self))]
    pub fn next_revision(&self, code: &str) -> RepositoryResult<i64> {
        let code = code.trim();
        if code.is_empty() {
            return Err(RepositoryError::ValidationError(
                "编号不能为空".to_string(),
            ));
        }

        let rev_no = self.seq_repo.next_revision(code)?;

        tracing::debug!(code = %code, rev_no, "修订号已发放");
        Ok(rev_no)
    }
}

/// 前缀校验: 非空,且仅含 ASCII 大写字母
fn validate_prefix(prefix: &str) -> RepositoryResult<()> {
    if prefix.is_empty() {
        return Err(RepositoryError::ValidationError(
            "编号前缀不能为空".to_string(),
        ));
    }
    if !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(RepositoryError::ValidationError(format!(
            "编号前缀只允许大写字母: {}",
            prefix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("Q").is_ok());
        assert!(validate_prefix("BR").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("q").is_err());
        assert!(validate_prefix("Q1").is_err());
        assert!(validate_prefix("Q ").is_err());
    }
}
