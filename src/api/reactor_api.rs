// ==========================================
// 生产批次排产核心 - 反应釜 API
// ==========================================
// 职责: 反应釜主数据维护(普通 CRUD,非排产硬核心)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::reactor::Reactor;
use crate::repository::ReactorRepository;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// 反应釜维护请求
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertReactorRequest {
    pub reactor_name: String,
    pub plant: String,
    pub capacity_kg: f64,
    pub daily_target_kg: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// ==========================================
// ReactorApi - 反应釜接口
// ==========================================
pub struct ReactorApi {
    reactor_repo: Arc<ReactorRepository>,
}

impl ReactorApi {
    /// 创建新的ReactorApi实例
    pub fn new(reactor_repo: Arc<ReactorRepository>) -> Self {
        Self { reactor_repo }
    }

    /// 新建或覆盖反应釜
    pub fn upsert_reactor(&self, req: UpsertReactorRequest) -> ApiResult<Reactor> {
        validator::require_non_empty("reactor_name", &req.reactor_name)?;
        validator::require_non_empty("plant", &req.plant)?;
        if req.capacity_kg < 0.0 || req.daily_target_kg < 0.0 {
            return Err(ApiError::InvalidInput(
                "容量与日产能目标不能为负".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let reactor = Reactor {
            reactor_name: req.reactor_name.trim().to_string(),
            plant: req.plant.trim().to_string(),
            capacity_kg: req.capacity_kg,
            daily_target_kg: req.daily_target_kg,
            active: req.active,
            created_at: now,
            updated_at: now,
        };

        self.reactor_repo.upsert(&reactor)?;
        Ok(reactor)
    }

    /// 按名称查询反应釜
    pub fn get_reactor(&self, reactor_name: &str) -> ApiResult<Reactor> {
        validator::require_non_empty("reactor_name", reactor_name)?;

        self.reactor_repo
            .find_by_name(reactor_name)
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::NotFound(format!("Reactor(id={})不存在", reactor_name)))
    }

    /// 查询反应釜列表
    ///
    /// # 参数
    /// - only_active: 仅在役
    pub fn list_reactors(&self, only_active: bool) -> ApiResult<Vec<Reactor>> {
        let reactors = if only_active {
            self.reactor_repo.list_active()?
        } else {
            self.reactor_repo.list_all()?
        };
        Ok(reactors)
    }

    /// 删除反应釜(历史批次软引用不受影响)
    pub fn delete_reactor(&self, reactor_name: &str) -> ApiResult<bool> {
        validator::require_non_empty("reactor_name", reactor_name)?;

        let deleted = self.reactor_repo.delete(reactor_name)?;
        Ok(deleted)
    }
}
