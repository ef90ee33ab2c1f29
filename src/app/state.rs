// ==========================================
// 毕业设计师生互选系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AssignmentApi, EventApi, EventLockRegistry, PreferenceApi};
use crate::config::config_manager::ConfigManager;
use crate::repository::{
    ActionLogRepository, ProvisionalAssignmentRepository, SelectionEventRepository,
    TeacherPreferenceRepository, TeacherRepository, TeamRepository,
};

/// 应用状态
///
/// 所有仓储共享同一个数据库连接；活动级互斥锁在所有API实例间共享
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 分配管理API
    pub assignment_api: Arc<AssignmentApi>,

    /// 志愿管理API
    pub preference_api: Arc<PreferenceApi>,

    /// 活动与团队API
    pub event_api: Arc<EventApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 导师仓储（用于导入导师基础信息）
    pub teacher_repo: Arc<TeacherRepository>,

    /// 团队仓储（用于登记学生基础信息）
    pub team_repo: Arc<TeamRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并确保表结构存在
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_and_migrate(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let event_repo = Arc::new(SelectionEventRepository::new(conn.clone()));
        let team_repo = Arc::new(TeamRepository::new(conn.clone()));
        let teacher_repo = Arc::new(TeacherRepository::new(conn.clone()));
        let preference_repo = Arc::new(TeacherPreferenceRepository::new(conn.clone()));
        let assignment_repo = Arc::new(ProvisionalAssignmentRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let event_locks = Arc::new(EventLockRegistry::new());

        // ==========================================
        // 初始化API层
        // ==========================================
        let assignment_api = Arc::new(AssignmentApi::new(
            event_repo.clone(),
            team_repo.clone(),
            teacher_repo.clone(),
            preference_repo.clone(),
            assignment_repo.clone(),
            action_log_repo,
            config_manager.clone(),
            event_locks,
        ));

        let preference_api = Arc::new(PreferenceApi::new(
            event_repo.clone(),
            team_repo.clone(),
            teacher_repo.clone(),
            preference_repo,
        ));

        let event_api = Arc::new(EventApi::new(
            event_repo,
            team_repo.clone(),
            teacher_repo.clone(),
            assignment_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            assignment_api,
            preference_api,
            event_api,
            config_manager,
            teacher_repo,
            team_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 MUTUAL_SELECTION_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MUTUAL_SELECTION_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./mutual_selection.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("mutual-selection");
        // best-effort: 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("mutual_selection.db");
        }
    }

    path.to_string_lossy().to_string()
}
