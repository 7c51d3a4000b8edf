// ==========================================
// 生产批次排产核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod block_repo;
pub mod calendar_repo;
pub mod error;
pub mod reactor_repo;
pub mod sequence_repo;

// 重导出核心仓储
pub use block_repo::BlockRepository;
pub use calendar_repo::{HolidayRepository, MaintenanceWindowRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use reactor_repo::ReactorRepository;
pub use sequence_repo::SequenceRepository;
