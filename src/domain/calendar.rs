// ==========================================
// 生产批次排产核心 - 工厂日历领域模型
// ==========================================
// 红线: 所有"计划日 vs 节假日"比较必须用统一的
//       业务日历日 (BusinessDay),禁止混用 UTC 零点
//       时间戳与本地格式化日串
// ==========================================

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 业务日历日的存储/展示格式
pub const BUSINESS_DAY_FMT: &str = "%Y-%m-%d";

// ==========================================
// BusinessDay - 业务日历日
// ==========================================
// 存储、比较、展示三处共用的唯一日粒度表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessDay(NaiveDate);

impl BusinessDay {
    /// 从裸日期构造(调用方保证该日期已是业务时区口径)
    pub fn new(date: NaiveDate) -> Self {
        BusinessDay(date)
    }

    /// 从 UTC 时间戳折算业务日历日
    ///
    /// # 参数
    /// - ts: UTC 时间戳
    /// - offset_minutes: 业务时区相对 UTC 的偏移(分钟)
    pub fn from_utc(ts: DateTime<Utc>, offset_minutes: i32) -> Self {
        BusinessDay((ts + Duration::minutes(offset_minutes as i64)).date_naive())
    }

    /// 从 `YYYY-MM-DD` 文本解析
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s.trim(), BUSINESS_DAY_FMT)
            .ok()
            .map(BusinessDay)
    }

    /// 取内部日期
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// 是否周末(周六/周日)
    pub fn is_weekend(&self) -> bool {
        matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> String {
        self.0.format(BUSINESS_DAY_FMT).to_string()
    }
}

impl fmt::Display for BusinessDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(BUSINESS_DAY_FMT))
    }
}

// ==========================================
// Holiday - 节假日
// ==========================================
// 日粒度的非工作日,与星期无关
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    pub holiday_date: BusinessDay,   // 节假日日期(主键)
    pub description: Option<String>, // 说明
    pub created_at: NaiveDateTime,   // 创建时间
}

// ==========================================
// MaintenanceWindow - 检修窗口
// ==========================================
// 反应釜维度的不可用区间 [start_date, end_date]
// 只作为只读参考数据维护,冲突引擎当前不消费
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub window_id: String,           // 窗口ID
    pub reactor_name: String,        // 反应釜名称(软引用)
    pub start_date: BusinessDay,     // 起始日
    pub end_date: BusinessDay,       // 结束日(含)
    pub reason: Option<String>,      // 检修原因
    pub created_at: NaiveDateTime,   // 创建时间
}

impl MaintenanceWindow {
    /// 区间是否覆盖指定业务日
    pub fn covers(&self, day: BusinessDay) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}
