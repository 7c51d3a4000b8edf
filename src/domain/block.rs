// ==========================================
// 生产批次排产核心 - 生产批次领域模型
// ==========================================
// 红线: units > 0
// 红线: 计划字段非空 当且仅当 status = PLANNED
// ==========================================

use crate::domain::calendar::BusinessDay;
use crate::domain::types::{BlockStatus, ShiftCode};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionBlock - 生产批次
// ==========================================
// 一个待上反应釜生产的工作单元
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBlock {
    // ===== 标识字段 =====
    pub block_id: String,            // 批次ID (内部主键)
    pub erp_id: Option<String>,      // 外部系统ID (全局唯一,可空)
    pub parent_id: Option<String>,   // 拆分来源批次ID (软引用,可空)
    pub batch_label: Option<String>, // 拆分标记 (如 "T2")

    // ===== 订单描述字段 (拆分时原样复制) =====
    pub article_code: String,        // 物料编码
    pub article_desc: Option<String>, // 物料描述
    pub client_name: Option<String>, // 客户名称
    pub order_no: Option<String>,    // 外部订单号
    pub qty_ordered: i64,            // 订购数量
    pub qty_served: i64,             // 已交付数量
    pub qty_pending: i64,            // 待交付数量
    pub deadline: Option<BusinessDay>, // 交付期限
    pub order_date: Option<BusinessDay>, // 下单日期

    // ===== 生产数量 =====
    pub units: i64,                  // 本批次生产数量 (必须 > 0)

    // ===== 生命周期 =====
    pub status: BlockStatus,         // 批次状态

    // ===== 计划字段 (仅 PLANNED 状态持有) =====
    pub planned_date: Option<BusinessDay>, // 计划生产日
    pub planned_reactor: Option<String>,   // 计划反应釜 (软引用)
    pub planned_shift: Option<ShiftCode>,  // 计划班次

    // ===== 实绩字段 (仅 PRODUCED 状态有意义) =====
    pub real_kg: Option<f64>,          // 实际产量(kg)
    pub real_duration_h: Option<f64>,  // 实际时长(小时)
    pub operator_notes: Option<String>, // 操作员备注

    // ===== 审计字段 =====
    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}

impl ProductionBlock {
    /// 判断是否处于待排产状态
    pub fn is_pending(&self) -> bool {
        self.status == BlockStatus::Pending
    }

    /// 判断是否处于已排产状态
    pub fn is_planned(&self) -> bool {
        self.status == BlockStatus::Planned
    }

    /// 判断是否已生产
    pub fn is_produced(&self) -> bool {
        self.status == BlockStatus::Produced
    }

    /// 计划字段与状态是否一致
    ///
    /// 不变量: planned_date/planned_reactor/planned_shift 三者非空
    /// 当且仅当 status = PLANNED
    pub fn planning_fields_consistent(&self) -> bool {
        let all_set = self.planned_date.is_some()
            && self.planned_reactor.is_some()
            && self.planned_shift.is_some();
        let none_set = self.planned_date.is_none()
            && self.planned_reactor.is_none()
            && self.planned_shift.is_none();

        match self.status {
            BlockStatus::Planned => all_set,
            _ => none_set,
        }
    }

    /// 清空计划字段 (撤排 / 取消时调用)
    pub fn clear_planning_fields(&mut self) {
        self.planned_date = None;
        self.planned_reactor = None;
        self.planned_shift = None;
    }
}
