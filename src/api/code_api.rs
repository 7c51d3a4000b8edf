// ==========================================
// 生产批次排产核心 - 编号分配 API
// ==========================================
// 职责: 单据编号与修订号的对外操作入口
// 说明: 报价/调研/配方等单据家族共用同一套编号模式
// ==========================================

use crate::api::error::ApiResult;
use crate::api::validator;
use crate::engine::CodeAllocator;
use std::sync::Arc;

// ==========================================
// CodeApi - 编号分配接口
// ==========================================
pub struct CodeApi {
    allocator: Arc<CodeAllocator>,
}

impl CodeApi {
    /// 创建新的CodeApi实例
    pub fn new(allocator: Arc<CodeAllocator>) -> Self {
        Self { allocator }
    }

    /// 分配编号
    ///
    /// # 参数
    /// - prefix: 编号前缀(如 "Q")
    ///
    /// # 返回
    /// - Ok(code): 如 "Q250008"
    /// - Err(Conflict): 登记冲突,调用方可重试
    pub fn allocate_code(&self, prefix: &str) -> ApiResult<String> {
        validator::require_non_empty("prefix", prefix)?;

        let code = self.allocator.allocate_code(prefix.trim())?;
        Ok(code)
    }

    /// 分配修订号(0 起始,同 code 内连续)
    ///
    /// # 返回
    /// - Ok(rev_no)
    /// - Err(Conflict): (code, rev_no) 冲突,调用方可重试
    pub fn next_revision(&self, code: &str) -> ApiResult<i64> {
        validator::require_non_empty("code", code)?;

        let rev_no = self.allocator.next_revision(code)?;
        Ok(rev_no)
    }
}
