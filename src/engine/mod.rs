// ==========================================
// 生产批次排产核心 - 引擎层
// ==========================================
// 职责: 业务规则 (编号分配/生命周期/拆分/冲突)
// 红线: 引擎不直接拼 SQL,数据访问走仓储层
// ==========================================

pub mod code_allocator;
pub mod conflict;
pub mod lifecycle;
pub mod splitter;

// 重导出核心引擎
pub use code_allocator::CodeAllocator;
pub use conflict::{ConflictEngine, ScheduleConflict};
pub use lifecycle::{BlockLifecycleEngine, NewBlock};
pub use splitter::{BatchSplitter, SplitError, SplitOutcome};
