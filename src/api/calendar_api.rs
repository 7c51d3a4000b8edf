// ==========================================
// 生产批次排产核心 - 工厂日历 API
// ==========================================
// 职责: 节假日与检修窗口维护(普通 CRUD,非排产硬核心)
// 说明: 检修窗口是只读参考数据,冲突引擎当前不消费
// ==========================================

use crate::api::error::ApiResult;
use crate::api::validator;
use crate::domain::calendar::{Holiday, MaintenanceWindow};
use crate::repository::{HolidayRepository, MaintenanceWindowRepository};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// 检修窗口创建请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaintenanceWindowRequest {
    pub reactor_name: String,
    pub start_date: String, // YYYY-MM-DD
    pub end_date: String,   // YYYY-MM-DD
    pub reason: Option<String>,
}

// ==========================================
// CalendarApi - 工厂日历接口
// ==========================================
pub struct CalendarApi {
    holiday_repo: Arc<HolidayRepository>,
    window_repo: Arc<MaintenanceWindowRepository>,
}

impl CalendarApi {
    /// 创建新的CalendarApi实例
    pub fn new(
        holiday_repo: Arc<HolidayRepository>,
        window_repo: Arc<MaintenanceWindowRepository>,
    ) -> Self {
        Self {
            holiday_repo,
            window_repo,
        }
    }

    /// 登记节假日(重复登记覆盖说明文字)
    pub fn add_holiday(&self, date: &str, description: Option<&str>) -> ApiResult<()> {
        let day = validator::parse_business_day("holiday_date", date)?;

        self.holiday_repo.upsert(day, description)?;
        Ok(())
    }

    /// 移除节假日
    pub fn remove_holiday(&self, date: &str) -> ApiResult<bool> {
        let day = validator::parse_business_day("holiday_date", date)?;

        let removed = self.holiday_repo.delete(day)?;
        Ok(removed)
    }

    /// 查询全部节假日
    pub fn list_holidays(&self) -> ApiResult<Vec<Holiday>> {
        let holidays = self.holiday_repo.list_all()?;
        Ok(holidays)
    }

    /// 创建检修窗口
    pub fn add_maintenance_window(
        &self,
        req: CreateMaintenanceWindowRequest,
    ) -> ApiResult<MaintenanceWindow> {
        validator::require_non_empty("reactor_name", &req.reactor_name)?;
        let start = validator::parse_business_day("start_date", &req.start_date)?;
        let end = validator::parse_business_day("end_date", &req.end_date)?;

        let window = MaintenanceWindow {
            window_id: uuid::Uuid::new_v4().to_string(),
            reactor_name: req.reactor_name.trim().to_string(),
            start_date: start,
            end_date: end,
            reason: req.reason,
            created_at: Utc::now().naive_utc(),
        };

        self.window_repo.create(&window)?;
        Ok(window)
    }

    /// 查询检修窗口(可按反应釜过滤)
    pub fn list_maintenance_windows(
        &self,
        reactor_name: Option<&str>,
    ) -> ApiResult<Vec<MaintenanceWindow>> {
        let windows = match reactor_name {
            Some(name) => self.window_repo.list_by_reactor(name)?,
            None => self.window_repo.list_all()?,
        };
        Ok(windows)
    }

    /// 删除检修窗口
    pub fn remove_maintenance_window(&self, window_id: &str) -> ApiResult<bool> {
        validator::require_non_empty("window_id", window_id)?;

        let removed = self.window_repo.delete(window_id)?;
        Ok(removed)
    }
}
