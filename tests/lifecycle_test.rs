// ==========================================
// 批次生命周期测试
// ==========================================
// 测试范围:
// 1. 迁移表内的四条路径均可走通
// 2. 迁移表外的路径报 InvalidStateTransition 且零变更
// 3. 计划字段非空 当且仅当 PLANNED
// ==========================================

mod test_helpers;

use batch_aps_core::domain::types::ShiftCode;
use batch_aps_core::repository::error::RepositoryError;
use batch_aps_core::{BlockStatus, BusinessDay};

fn day(s: &str) -> BusinessDay {
    BusinessDay::parse(s).expect("日期格式错误")
}

/// 测试: PENDING -> PLANNED -> PRODUCED 全流程
#[test]
fn test_plan_then_produce_roundtrip() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let block = stack
        .lifecycle
        .create_block(test_helpers::new_block_fields(500, None))
        .expect("创建批次失败");
    assert_eq!(block.status, BlockStatus::Pending);
    assert!(block.planning_fields_consistent());

    let planned = stack
        .lifecycle
        .plan_block(&block.block_id, day("2026-03-02"), "R-01", ShiftCode::Morning)
        .expect("排产失败");
    assert_eq!(planned.status, BlockStatus::Planned);
    assert_eq!(planned.planned_reactor.as_deref(), Some("R-01"));
    assert!(planned.planning_fields_consistent());

    let produced = stack
        .lifecycle
        .record_execution(&block.block_id, Some(480.5), None, Some("正常".to_string()))
        .expect("记录实绩失败");
    assert_eq!(produced.status, BlockStatus::Produced);
    assert_eq!(produced.real_kg, Some(480.5));

    // 落库后的状态与内存一致
    let stored = stack
        .block_repo
        .find_by_id(&block.block_id)
        .expect("查询失败")
        .expect("批次应存在");
    assert_eq!(stored.status, BlockStatus::Produced);
    assert_eq!(stored.operator_notes.as_deref(), Some("正常"));
}

/// 测试: 撤排清空计划字段并回到 PENDING,重复撤排幂等
#[test]
fn test_unplan_clears_fields_and_is_idempotent() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let block = stack
        .lifecycle
        .create_block(test_helpers::new_block_fields(500, None))
        .expect("创建批次失败");
    stack
        .lifecycle
        .plan_block(&block.block_id, day("2026-03-02"), "R-01", ShiftCode::Night)
        .expect("排产失败");

    let unplanned = stack
        .lifecycle
        .unplan_block(&block.block_id)
        .expect("撤排失败");
    assert_eq!(unplanned.status, BlockStatus::Pending);
    assert!(unplanned.planned_date.is_none());
    assert!(unplanned.planned_reactor.is_none());
    assert!(unplanned.planned_shift.is_none());

    // 幂等: 再次撤排不报错
    let again = stack
        .lifecycle
        .unplan_block(&block.block_id)
        .expect("重复撤排应幂等");
    assert_eq!(again.status, BlockStatus::Pending);
}

/// 测试: PENDING 批次直接记实绩 -> InvalidStateTransition 且零变更
#[test]
fn test_record_execution_on_pending_rejected() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let block = stack
        .lifecycle
        .create_block(test_helpers::new_block_fields(500, None))
        .expect("创建批次失败");

    let err = stack
        .lifecycle
        .record_execution(&block.block_id, Some(100.0), None, None);
    assert!(matches!(
        err,
        Err(RepositoryError::InvalidStateTransition { .. })
    ));

    let stored = stack
        .block_repo
        .find_by_id(&block.block_id)
        .expect("查询失败")
        .expect("批次应存在");
    assert_eq!(stored.status, BlockStatus::Pending);
    assert!(stored.real_kg.is_none());
}

/// 测试: 其余表外迁移全部被拒绝
#[test]
fn test_out_of_table_transitions_rejected() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    // PLANNED 批次不能再次排产
    let block = stack
        .lifecycle
        .create_block(test_helpers::new_block_fields(500, None))
        .expect("创建批次失败");
    stack
        .lifecycle
        .plan_block(&block.block_id, day("2026-03-02"), "R-01", ShiftCode::Morning)
        .expect("排产失败");
    assert!(matches!(
        stack
            .lifecycle
            .plan_block(&block.block_id, day("2026-03-03"), "R-02", ShiftCode::Morning),
        Err(RepositoryError::InvalidStateTransition { .. })
    ));

    // PRODUCED 批次不能撤排
    stack
        .lifecycle
        .record_execution(&block.block_id, None, Some(6.5), None)
        .expect("记录实绩失败");
    assert!(matches!(
        stack.lifecycle.unplan_block(&block.block_id),
        Err(RepositoryError::InvalidStateTransition { .. })
    ));

    // CANCELLED 是终态: 取消后不能排产
    let cancelled = stack
        .lifecycle
        .create_block(test_helpers::new_block_fields(300, None))
        .expect("创建批次失败");
    stack
        .lifecycle
        .cancel_block(&cancelled.block_id)
        .expect("取消失败");
    assert!(matches!(
        stack
            .lifecycle
            .plan_block(&cancelled.block_id, day("2026-03-02"), "R-01", ShiftCode::Morning),
        Err(RepositoryError::InvalidStateTransition { .. })
    ));
}

/// 测试: 实绩必须带 real_kg 或 real_duration_h 之一
#[test]
fn test_record_execution_requires_measurement() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let block = stack
        .lifecycle
        .create_block(test_helpers::new_block_fields(500, None))
        .expect("创建批次失败");
    stack
        .lifecycle
        .plan_block(&block.block_id, day("2026-03-02"), "R-01", ShiftCode::Morning)
        .expect("排产失败");

    assert!(matches!(
        stack
            .lifecycle
            .record_execution(&block.block_id, None, None, Some("漏填".to_string())),
        Err(RepositoryError::ValidationError(_))
    ));
    assert!(matches!(
        stack
            .lifecycle
            .record_execution(&block.block_id, Some(-1.0), None, None),
        Err(RepositoryError::ValidationError(_))
    ));
}

/// 测试: 任意状态可管理性取消,且计划字段被清空
#[test]
fn test_cancel_from_any_state() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let planned = stack
        .lifecycle
        .create_block(test_helpers::new_block_fields(500, None))
        .expect("创建批次失败");
    stack
        .lifecycle
        .plan_block(&planned.block_id, day("2026-03-02"), "R-01", ShiftCode::Morning)
        .expect("排产失败");

    let cancelled = stack
        .lifecycle
        .cancel_block(&planned.block_id)
        .expect("取消失败");
    assert_eq!(cancelled.status, BlockStatus::Cancelled);
    assert!(cancelled.planned_date.is_none());
    assert!(cancelled.planning_fields_consistent());
}

/// 测试: units <= 0 的批次拒绝创建
#[test]
fn test_create_rejects_non_positive_units() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    for units in [0_i64, -5] {
        assert!(matches!(
            stack
                .lifecycle
                .create_block(test_helpers::new_block_fields(units, None)),
            Err(RepositoryError::ValidationError(_))
        ));
    }
    assert!(stack.block_repo.list_all().expect("查询失败").is_empty());
}

/// 测试: erp_id 唯一约束
#[test]
fn test_duplicate_erp_id_rejected() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    stack
        .lifecycle
        .create_block(test_helpers::new_block_fields(100, Some("ERP-DUP")))
        .expect("创建批次失败");

    assert!(matches!(
        stack
            .lifecycle
            .create_block(test_helpers::new_block_fields(200, Some("ERP-DUP"))),
        Err(RepositoryError::UniqueConstraintViolation(_))
    ));
}
