// ==========================================
// 生产批次排产核心 - 配置层
// ==========================================

pub mod config_manager;

pub use config_manager::{
    ConfigManager, DEFAULT_BATCH_SPLIT_LIMIT, DEFAULT_BUSINESS_UTC_OFFSET_MINUTES,
    KEY_BATCH_SPLIT_LIMIT, KEY_BUSINESS_UTC_OFFSET_MINUTES,
};
