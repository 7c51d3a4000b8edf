// ==========================================
// 生产批次排产核心 - 入参校验
// ==========================================
// 职责: API 层共用的入参解析与校验
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::calendar::BusinessDay;
use crate::domain::types::ShiftCode;

/// 解析业务日历日(YYYY-MM-DD)
pub fn parse_business_day(field: &str, raw: &str) -> ApiResult<BusinessDay> {
    BusinessDay::parse(raw).ok_or_else(|| {
        ApiError::InvalidInput(format!("{} 日期格式错误,应为YYYY-MM-DD: {}", field, raw))
    })
}

/// 解析可空的业务日历日
pub fn parse_business_day_opt(field: &str, raw: Option<&str>) -> ApiResult<Option<BusinessDay>> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_business_day(field, s).map(Some),
    }
}

/// 解析班次
pub fn parse_shift(raw: &str) -> ApiResult<ShiftCode> {
    ShiftCode::from_str(raw)
        .ok_or_else(|| ApiError::InvalidInput(format!("未知班次: {}", raw)))
}

/// 非空字符串校验
pub fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{} 不能为空", field)));
    }
    Ok(())
}

/// 非空 id 列表校验
pub fn require_non_empty_ids(field: &str, ids: &[String]) -> ApiResult<()> {
    if ids.is_empty() {
        return Err(ApiError::InvalidInput(format!("{} 列表不能为空", field)));
    }
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ApiError::InvalidInput(format!("{} 列表含空白ID", field)));
    }
    Ok(())
}
