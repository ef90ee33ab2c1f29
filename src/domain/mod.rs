// ==========================================
// 毕业设计师生互选系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、纯校验规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod advisor;
pub mod assignment;
pub mod event;
pub mod team;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use advisor::{Teacher, TeacherPreference};
pub use assignment::{AssignmentView, ProvisionalAssignment};
pub use event::SelectionEvent;
pub use team::{Team, TeamMember};
pub use types::{AllocationPhase, AssignmentType, EventStatus, RecommendationTier};
