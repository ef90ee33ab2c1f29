// ==========================================
// 毕业设计师生互选系统 - 配置层
// ==========================================
// 职责: 系统配置管理,支持活动级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod scoring_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ConfigScope};
pub use scoring_profile::ScoringWeights;
