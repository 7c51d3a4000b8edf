// ==========================================
// 生产批次排产核心 - 反应釜领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Reactor - 反应釜
// ==========================================
// 按名称被批次软引用: 历史批次可能引用已退役反应釜,
// 因此不建外键
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reactor {
    pub reactor_name: String,      // 反应釜名称 (主键)
    pub plant: String,             // 所属工厂
    pub capacity_kg: f64,          // 单釜容量(kg)
    pub daily_target_kg: f64,      // 日产能目标(kg)
    pub active: bool,              // 是否在役
    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}

impl Reactor {
    /// 判断是否在役
    pub fn is_active(&self) -> bool {
        self.active
    }
}
