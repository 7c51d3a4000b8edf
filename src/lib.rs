// ==========================================
// 生产批次排产核心 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 排产/编号分配核心,表单/报表/导出等
//           外围功能由外部协作方承担
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BlockStatus, CallerRole, ConflictReason, ShiftCode};

// 领域实体
pub use domain::{BusinessDay, Holiday, MaintenanceWindow, ProductionBlock, Reactor};

// 引擎
pub use engine::{
    BatchSplitter, BlockLifecycleEngine, CodeAllocator, ConflictEngine, ScheduleConflict,
    SplitError, SplitOutcome,
};

// API
pub use api::{BlockApi, CalendarApi, CodeApi, ConflictApi, ReactorApi};

// 配置
pub use config::ConfigManager;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产批次排产核心";

// ==========================================
// 预编译检查
// ==========================================
