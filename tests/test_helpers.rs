// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、测试环境装配、互选活动测试数据构造
// ==========================================

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{NaiveDate, NaiveDateTime};
use mutual_selection::api::NewEvent;
use mutual_selection::app::AppState;
use mutual_selection::config::{config_keys, ConfigScope};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    mutual_selection::db::open_and_migrate(&db_path)?;

    Ok((temp_file, db_path))
}

/// 构造时间点
pub fn dt(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

// 默认活动时间线: 学生端 1/1 ~ 2/1，教师端 1/10 ~ 2/10
pub fn during_student_window() -> NaiveDateTime {
    dt(2025, 1, 5)
}

pub fn during_teacher_window() -> NaiveDateTime {
    dt(2025, 1, 20)
}

pub fn after_event() -> NaiveDateTime {
    dt(2025, 3, 1)
}

// ==========================================
// 测试环境
// ==========================================

pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub state: AppState,
    student_seq: AtomicU32,
}

impl TestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        mutual_selection::logging::init_test();
        let (temp_file, db_path) = create_test_db()?;
        let state = AppState::new(db_path.clone())?;
        Ok(Self {
            _temp_file: temp_file,
            db_path,
            state,
            student_seq: AtomicU32::new(0),
        })
    }

    /// 创建默认时间线的活动
    pub fn create_event(&self, name: &str, teacher_choice_limit: i64) -> i64 {
        self.state
            .event_api
            .create_event(NewEvent {
                event_name: name.to_string(),
                stu_start_time: dt(2025, 1, 1),
                stu_end_time: dt(2025, 2, 1),
                tea_start_time: dt(2025, 1, 10),
                tea_end_time: dt(2025, 2, 10),
                teacher_choice_limit: Some(teacher_choice_limit),
                group_member_limit: Some(3),
            })
            .expect("创建活动失败")
    }

    /// 创建导师并登记为活动参与者
    pub fn add_teacher(&self, event_id: i64, name: &str) -> i64 {
        let no = format!("T-{}-{}", event_id, name);
        let teacher_id = self
            .state
            .teacher_repo
            .insert(&no, name, Some("软件工程"))
            .expect("创建导师失败");
        self.state
            .event_api
            .add_teacher(event_id, teacher_id)
            .expect("登记导师失败");
        teacher_id
    }

    /// 批量创建参与导师
    pub fn add_teachers(&self, event_id: i64, count: usize) -> Vec<i64> {
        (1..=count)
            .map(|i| self.add_teacher(event_id, &format!("导师{}", i)))
            .collect()
    }

    /// 创建学生并登记为活动参与者
    pub fn add_student(&self, event_id: i64) -> i64 {
        let seq = self.student_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let stu_id = self
            .state
            .team_repo
            .insert_student(&format!("S{:04}", seq), &format!("学生{}", seq))
            .expect("创建学生失败");
        self.state
            .event_api
            .add_student(event_id, stu_id)
            .expect("登记学生失败");
        stu_id
    }

    /// 创建团队（自动创建队长），返回 (team_id, captain_id)
    pub fn add_team_with_captain(
        &self,
        event_id: i64,
        name: &str,
        preferred: [Option<i64>; 3],
    ) -> (i64, i64) {
        let captain_id = self.add_student(event_id);
        let team_id = self
            .state
            .event_api
            .create_team(event_id, captain_id, name, &format!("{}的课题", name), preferred)
            .expect("创建团队失败");
        (team_id, captain_id)
    }

    pub fn add_team(&self, event_id: i64, name: &str, preferred: [Option<i64>; 3]) -> i64 {
        self.add_team_with_captain(event_id, name, preferred).0
    }

    /// 批量创建无志愿团队
    pub fn add_plain_teams(&self, event_id: i64, count: usize) -> Vec<i64> {
        (1..=count)
            .map(|i| self.add_team(event_id, &format!("团队{}", i), [None, None, None]))
            .collect()
    }

    /// 导师按顺序提交志愿（第一个为第1志愿）
    pub fn submit_wishlist(&self, event_id: i64, teacher_id: i64, team_ids: &[i64]) {
        let wishlist: BTreeMap<i64, i64> = team_ids
            .iter()
            .enumerate()
            .map(|(i, t)| (i as i64 + 1, *t))
            .collect();
        self.state
            .preference_api
            .submit_teacher_preferences_at(event_id, teacher_id, &wishlist, during_teacher_window())
            .expect("提交志愿失败");
    }

    /// 固定随机兜底种子
    pub fn set_shuffle_seed(&self, seed: u64) {
        self.state
            .config_manager
            .set_value(&ConfigScope::Global, config_keys::SHUFFLE_SEED, &seed.to_string())
            .expect("写入配置失败");
    }

    /// 团队的最终导师
    pub fn advisor_of(&self, team_id: i64) -> Option<i64> {
        self.state
            .event_api
            .get_team(team_id)
            .expect("查询团队失败")
            .advisor
    }
}
