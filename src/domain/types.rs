// ==========================================
// 生产批次排产核心 - 领域类型定义
// ==========================================
// 红线: 状态是封闭枚举,不是自由字符串
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 批次状态 (Block Status)
// ==========================================
// 红线: 状态迁移必须走迁移表,表外一律拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockStatus {
    Pending,   // 待排产
    Planned,   // 已排产
    Produced,  // 已生产
    Cancelled, // 已取消
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl BlockStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(BlockStatus::Pending),
            "PLANNED" => Some(BlockStatus::Planned),
            "PRODUCED" => Some(BlockStatus::Produced),
            "CANCELLED" => Some(BlockStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BlockStatus::Pending => "PENDING",
            BlockStatus::Planned => "PLANNED",
            BlockStatus::Produced => "PRODUCED",
            BlockStatus::Cancelled => "CANCELLED",
        }
    }

    /// 状态迁移表
    ///
    /// | 起点 | 终点 | 触发 |
    /// |---|---|---|
    /// | PENDING | PLANNED | 指定计划 |
    /// | PLANNED | PRODUCED | 记录生产实绩 |
    /// | PLANNED | PENDING | 撤排 / 冲突整改 |
    /// | 任意 | CANCELLED | 管理性取消 |
    ///
    /// PENDING -> PENDING 也视为合法(撤排幂等)。
    pub fn can_transition_to(&self, to: BlockStatus) -> bool {
        matches!(
            (*self, to),
            (BlockStatus::Pending, BlockStatus::Planned)
                | (BlockStatus::Planned, BlockStatus::Produced)
                | (BlockStatus::Planned, BlockStatus::Pending)
                | (BlockStatus::Pending, BlockStatus::Pending)
                | (_, BlockStatus::Cancelled)
        )
    }
}

// ==========================================
// 班次 (Shift Code)
// ==========================================
// 排产计划中的日内生产时段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftCode {
    Morning,   // 早班
    Afternoon, // 午班
    Night,     // 夜班
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ShiftCode {
    /// 从字符串解析班次
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MORNING" => Some(ShiftCode::Morning),
            "AFTERNOON" => Some(ShiftCode::Afternoon),
            "NIGHT" => Some(ShiftCode::Night),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShiftCode::Morning => "MORNING",
            ShiftCode::Afternoon => "AFTERNOON",
            ShiftCode::Night => "NIGHT",
        }
    }
}

// ==========================================
// 冲突原因 (Conflict Reason)
// ==========================================
// 同一批次只报告一个原因,周末优先于节假日
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictReason {
    Weekend, // 周末
    Holiday, // 节假日
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::Weekend => write!(f, "weekend"),
            ConflictReason::Holiday => write!(f, "holiday"),
        }
    }
}

// ==========================================
// 调用方角色 (Caller Role)
// ==========================================
// 由外部鉴权协作方解析后传入,本核心只做门禁判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallerRole {
    Operator,  // 操作员
    Scheduler, // 排产员
    Admin,     // 管理员
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerRole::Operator => write!(f, "OPERATOR"),
            CallerRole::Scheduler => write!(f, "SCHEDULER"),
            CallerRole::Admin => write!(f, "ADMIN"),
        }
    }
}

impl CallerRole {
    /// 是否允许按状态批量清除 (clearPending)
    pub fn can_clear_pending(&self) -> bool {
        *self >= CallerRole::Scheduler
    }

    /// 是否允许全量清除 (clearAll)
    pub fn can_clear_all(&self) -> bool {
        *self == CallerRole::Admin
    }
}
