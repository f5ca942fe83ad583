// ==========================================
// 调拨单分配系统 - 配置层
// ==========================================
// 职责: 分配参数定义与读取
// 存储: config_kv 表
// ==========================================

pub mod allocation_config;
pub mod allocation_config_trait;
pub mod config_manager;

// 重导出
pub use allocation_config::AllocationConfig;
pub use allocation_config_trait::AllocationConfigReader;
pub use config_manager::{config_keys, ConfigManager, ConfigResult};
