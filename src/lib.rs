// ==========================================
// 毕业设计师生互选系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 志愿匹配与分配引擎 (管理员最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 评分与分配规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AssignmentType, EventStatus, RecommendationTier};

// 领域实体
pub use domain::{
    ActionLog, ActionType, ProvisionalAssignment, SelectionEvent, Teacher, TeacherPreference,
    Team,
};

// 引擎
pub use engine::{AllocationEngine, AllocationOutcome, MatchScorer};

// 配置
pub use config::{ConfigManager, ScoringWeights};

// API
pub use api::{ApiError, ApiResult, AssignmentApi, EventApi, PreferenceApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "毕业设计师生互选系统";
