// ==========================================
// 生产批次 API 测试
// ==========================================
// 测试范围:
// 1. API 层入参校验与错误种类映射
// 2. 破坏性批量操作的角色门禁
// 3. 反应釜/工厂日历普通 CRUD
// ==========================================

mod test_helpers;

use batch_aps_core::api::{ApiError, CreateBlockRequest, CreateMaintenanceWindowRequest, UpsertReactorRequest};
use batch_aps_core::{BlockStatus, CallerRole};

fn create_request(units: i64, erp_id: Option<&str>) -> CreateBlockRequest {
    CreateBlockRequest {
        erp_id: erp_id.map(|s| s.to_string()),
        article_code: "RESIN-A".to_string(),
        article_desc: Some("测试树脂".to_string()),
        client_name: Some("测试客户".to_string()),
        order_no: Some("PO-T-001".to_string()),
        qty_ordered: units,
        qty_served: 0,
        qty_pending: units,
        deadline: Some("2026-06-30".to_string()),
        order_date: Some("2026-01-02".to_string()),
        units,
    }
}

/// 测试: 创建-排产-实绩 API 全流程
#[test]
fn test_block_api_full_flow() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let block = stack
        .block_api
        .create_block(create_request(500, Some("ERP-100")))
        .expect("创建批次失败");
    assert_eq!(block.status, BlockStatus::Pending);
    assert_eq!(block.erp_id.as_deref(), Some("ERP-100"));

    let planned = stack
        .block_api
        .plan_block(&block.block_id, "2026-03-02", "R-01", "MORNING")
        .expect("排产失败");
    assert_eq!(planned.status, BlockStatus::Planned);

    let produced = stack
        .block_api
        .record_execution(&block.block_id, Some(495.0), Some(7.5), None)
        .expect("记录实绩失败");
    assert_eq!(produced.status, BlockStatus::Produced);

    let fetched = stack.block_api.get_block(&block.block_id).expect("查询失败");
    assert_eq!(fetched.real_kg, Some(495.0));
}

/// 测试: API 层入参校验错误种类
#[test]
fn test_block_api_input_validation() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    // units 非正
    assert!(matches!(
        stack.block_api.create_block(create_request(0, None)),
        Err(ApiError::InvalidInput(_))
    ));

    // 日期格式错误
    let block = stack
        .block_api
        .create_block(create_request(100, None))
        .expect("创建批次失败");
    assert!(matches!(
        stack
            .block_api
            .plan_block(&block.block_id, "02/03/2026", "R-01", "MORNING"),
        Err(ApiError::InvalidInput(_))
    ));

    // 未知班次
    assert!(matches!(
        stack
            .block_api
            .plan_block(&block.block_id, "2026-03-02", "R-01", "DAWN"),
        Err(ApiError::InvalidInput(_))
    ));

    // 未知 id
    assert!(matches!(
        stack.block_api.get_block("no-such-id"),
        Err(ApiError::NotFound(_))
    ));
}

/// 测试: API 层撤排回到 PENDING 并清空计划字段
#[test]
fn test_block_api_unplan() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let block = stack
        .block_api
        .create_block(create_request(100, None))
        .expect("创建批次失败");
    stack
        .block_api
        .plan_block(&block.block_id, "2026-03-02", "R-01", "AFTERNOON")
        .expect("排产失败");

    let unplanned = stack
        .block_api
        .unplan_block(&block.block_id)
        .expect("撤排失败");
    assert_eq!(unplanned.status, BlockStatus::Pending);
    assert!(unplanned.planned_shift.is_none());
}

/// 测试: erp_id 重复映射为 Conflict 错误
#[test]
fn test_block_api_duplicate_erp_maps_to_conflict() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    stack
        .block_api
        .create_block(create_request(100, Some("ERP-DUP")))
        .expect("创建批次失败");

    assert!(matches!(
        stack.block_api.create_block(create_request(100, Some("ERP-DUP"))),
        Err(ApiError::Conflict(_))
    ));
}

/// 测试: 表外状态迁移映射为 InvalidStateTransition
#[test]
fn test_block_api_invalid_transition_mapping() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let block = stack
        .block_api
        .create_block(create_request(100, None))
        .expect("创建批次失败");

    match stack
        .block_api
        .record_execution(&block.block_id, Some(90.0), None, None)
    {
        Err(ApiError::InvalidStateTransition { from, to }) => {
            assert_eq!(from, "PENDING");
            assert_eq!(to, "PRODUCED");
        }
        other => panic!("期望 InvalidStateTransition,实际 {:?}", other.map(|b| b.status)),
    }
}

/// 测试: 拆分 API 的 NoSplitNeeded 带当前上限
#[test]
fn test_block_api_split_no_split_needed() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let block = stack
        .block_api
        .create_block(create_request(1500, None))
        .expect("创建批次失败");

    match stack.block_api.split_block(&block.block_id) {
        Err(ApiError::NoSplitNeeded { units, limit }) => {
            assert_eq!(units, 1500);
            assert_eq!(limit, 2000);
        }
        other => panic!("期望 NoSplitNeeded,实际 {:?}", other.map(|r| r.parts)),
    }

    let outcome = stack
        .block_api
        .split_block(
            &stack
                .block_api
                .create_block(create_request(4500, None))
                .expect("创建批次失败")
                .block_id,
        )
        .expect("拆分失败");
    assert_eq!(outcome.parts, 3);
}

/// 测试: 批量清除的角色门禁
#[test]
fn test_clear_operations_role_gating() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    for units in [100, 200, 300] {
        stack
            .block_api
            .create_block(create_request(units, None))
            .expect("创建批次失败");
    }

    // OPERATOR 无权清除
    assert!(matches!(
        stack.block_api.clear_pending(CallerRole::Operator),
        Err(ApiError::Forbidden(_))
    ));
    assert!(matches!(
        stack.block_api.clear_all(CallerRole::Operator),
        Err(ApiError::Forbidden(_))
    ));

    // SCHEDULER 可清 PENDING,不可全清
    assert!(matches!(
        stack.block_api.clear_all(CallerRole::Scheduler),
        Err(ApiError::Forbidden(_))
    ));
    let cleared = stack
        .block_api
        .clear_pending(CallerRole::Scheduler)
        .expect("清除失败");
    assert_eq!(cleared, 3);

    // ADMIN 可全清(空库清除返回 0,删除幂等)
    let cleared_all = stack
        .block_api
        .clear_all(CallerRole::Admin)
        .expect("清除失败");
    assert_eq!(cleared_all, 0);
}

/// 测试: clear_pending 只清 PENDING,不动其他状态
#[test]
fn test_clear_pending_scope() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    let pending = stack
        .block_api
        .create_block(create_request(100, None))
        .expect("创建批次失败");
    let planned = stack
        .block_api
        .create_block(create_request(200, None))
        .expect("创建批次失败");
    stack
        .block_api
        .plan_block(&planned.block_id, "2026-03-02", "R-01", "MORNING")
        .expect("排产失败");

    let cleared = stack
        .block_api
        .clear_pending(CallerRole::Admin)
        .expect("清除失败");
    assert_eq!(cleared, 1);

    assert!(matches!(
        stack.block_api.get_block(&pending.block_id),
        Err(ApiError::NotFound(_))
    ));
    assert!(stack.block_api.get_block(&planned.block_id).is_ok());
}

/// 测试: 反应釜 CRUD
#[test]
fn test_reactor_api_crud() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    stack
        .reactor_api
        .upsert_reactor(UpsertReactorRequest {
            reactor_name: "R-01".to_string(),
            plant: "PLANT-A".to_string(),
            capacity_kg: 2000.0,
            daily_target_kg: 4000.0,
            active: true,
        })
        .expect("创建反应釜失败");

    // 覆盖更新: 退役
    stack
        .reactor_api
        .upsert_reactor(UpsertReactorRequest {
            reactor_name: "R-01".to_string(),
            plant: "PLANT-A".to_string(),
            capacity_kg: 2000.0,
            daily_target_kg: 3500.0,
            active: false,
        })
        .expect("更新反应釜失败");

    let reactor = stack.reactor_api.get_reactor("R-01").expect("查询失败");
    assert!(!reactor.active);
    assert_eq!(reactor.daily_target_kg, 3500.0);

    assert!(stack
        .reactor_api
        .list_reactors(true)
        .expect("查询失败")
        .is_empty());
    assert_eq!(stack.reactor_api.list_reactors(false).expect("查询失败").len(), 1);

    assert!(stack.reactor_api.delete_reactor("R-01").expect("删除失败"));
    assert!(matches!(
        stack.reactor_api.get_reactor("R-01"),
        Err(ApiError::NotFound(_))
    ));
}

/// 测试: 节假日与检修窗口 CRUD
#[test]
fn test_calendar_api_crud() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let stack = test_helpers::build_stack(&db_path);

    stack
        .calendar_api
        .add_holiday("2026-01-06", Some("主显节"))
        .expect("登记节假日失败");
    stack
        .calendar_api
        .add_holiday("2026-05-01", None)
        .expect("登记节假日失败");

    let holidays = stack.calendar_api.list_holidays().expect("查询失败");
    assert_eq!(holidays.len(), 2);
    assert_eq!(holidays[0].holiday_date.to_db_str(), "2026-01-06");

    assert!(stack
        .calendar_api
        .remove_holiday("2026-05-01")
        .expect("移除失败"));
    assert_eq!(stack.calendar_api.list_holidays().expect("查询失败").len(), 1);

    // 检修窗口
    let window = stack
        .calendar_api
        .add_maintenance_window(CreateMaintenanceWindowRequest {
            reactor_name: "R-01".to_string(),
            start_date: "2026-02-01".to_string(),
            end_date: "2026-02-03".to_string(),
            reason: Some("年检".to_string()),
        })
        .expect("创建检修窗口失败");

    let windows = stack
        .calendar_api
        .list_maintenance_windows(Some("R-01"))
        .expect("查询失败");
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].window_id, window.window_id);

    // 起止颠倒被拒绝
    assert!(stack
        .calendar_api
        .add_maintenance_window(CreateMaintenanceWindowRequest {
            reactor_name: "R-01".to_string(),
            start_date: "2026-02-05".to_string(),
            end_date: "2026-02-01".to_string(),
            reason: None,
        })
        .is_err());

    assert!(stack
        .calendar_api
        .remove_maintenance_window(&window.window_id)
        .expect("删除失败"));
}
