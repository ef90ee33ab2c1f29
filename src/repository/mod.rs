// ==========================================
// 毕业设计师生互选系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含评分/分配规则
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化; 多语句写入必须在单个事务内完成
// ==========================================

pub mod action_log_repo;
pub mod advisor_repo;
pub mod assignment_repo;
pub mod error;
pub mod event_repo;
pub mod team_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use advisor_repo::{TeacherPreferenceRepository, TeacherRepository};
pub use assignment_repo::ProvisionalAssignmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use event_repo::SelectionEventRepository;
pub use team_repo::TeamRepository;

use chrono::NaiveDateTime;

/// 数据库时间文本格式
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 格式化时间为数据库文本
pub fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 从结果行读取时间列（兼容 SQLite datetime() 输出）
pub(crate) fn read_ts(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(raw.trim(), TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
