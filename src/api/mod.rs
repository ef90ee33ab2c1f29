// ==========================================
// 毕业设计师生互选系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行与上层界面调用
// ==========================================

pub mod assignment_api;
pub mod dto;
pub mod error;
pub mod event_api;
pub mod event_lock;
pub mod preference_api;

// 重导出核心类型
pub use assignment_api::AssignmentApi;
pub use error::{ApiError, ApiResult};
pub use event_api::{EventApi, NewEvent};
pub use event_lock::EventLockRegistry;
pub use preference_api::PreferenceApi;
