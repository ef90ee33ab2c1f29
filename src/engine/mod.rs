// ==========================================
// 毕业设计师生互选系统 - 引擎层
// ==========================================
// 职责: 实现评分与分配规则,不拼 SQL
// 红线: Engine 不拼 SQL, 所有分配必须输出分数与说明
// ==========================================

pub mod allocator;
pub mod recommendation;
pub mod scoring;

// 重导出核心引擎
pub use allocator::{AllocationDecision, AllocationEngine, AllocationOutcome};
pub use recommendation::{match_options_for_team, tier_for_score, MatchOption};
pub use scoring::{MatchScore, MatchScorer, PreferenceIndex};
