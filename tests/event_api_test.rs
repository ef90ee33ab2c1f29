// ==========================================
// EventApi 集成测试
// ==========================================
// 测试范围:
// 1. 活动创建: 参数校验、配置默认值
// 2. 活动状态推导
// 3. 团队组建与成员规则
// ==========================================

mod test_helpers;

use mutual_selection::api::{ApiError, NewEvent};
use mutual_selection::config::{config_keys, ConfigScope};
use mutual_selection::EventStatus;
use test_helpers::{after_event, during_student_window, dt, TestEnv};

fn new_event(name: &str) -> NewEvent {
    NewEvent {
        event_name: name.to_string(),
        stu_start_time: dt(2025, 1, 1),
        stu_end_time: dt(2025, 2, 1),
        tea_start_time: dt(2025, 1, 10),
        tea_end_time: dt(2025, 2, 10),
        teacher_choice_limit: None,
        group_member_limit: None,
    }
}

#[test]
fn test_create_event_使用配置默认值() {
    let env = TestEnv::new().unwrap();
    env.state
        .config_manager
        .set_value(&ConfigScope::Global, config_keys::DEFAULT_TEACHER_CHOICE_LIMIT, "4")
        .unwrap();

    let event_id = env.state.event_api.create_event(new_event("默认值")).unwrap();
    let event = env.state.event_api.get_event(event_id).unwrap();

    assert_eq!(event.teacher_choice_limit, 4);
    assert_eq!(event.group_member_limit, 5);
}

#[test]
fn test_create_event_参数非法() {
    let env = TestEnv::new().unwrap();
    let api = &env.state.event_api;

    let mut blank = new_event("  ");
    blank.teacher_choice_limit = Some(2);
    assert!(matches!(api.create_event(blank), Err(ApiError::ValidationError(_))));

    let mut reversed = new_event("倒置窗口");
    reversed.stu_end_time = dt(2024, 12, 1);
    assert!(matches!(api.create_event(reversed), Err(ApiError::ValidationError(_))));

    let mut negative = new_event("负容量");
    negative.teacher_choice_limit = Some(-1);
    assert!(matches!(api.create_event(negative), Err(ApiError::ValidationError(_))));
}

#[test]
fn test_event_status_随时间推导() {
    let env = TestEnv::new().unwrap();
    let event_id = env.create_event("状态", 2);
    env.add_teachers(event_id, 2);
    env.add_plain_teams(event_id, 1);
    let api = &env.state.event_api;

    let before = api.event_status_at(event_id, dt(2024, 12, 1)).unwrap();
    assert_eq!(before.status, EventStatus::NotStarted);
    assert!(!before.student_window_open);

    let during = api.event_status_at(event_id, during_student_window()).unwrap();
    assert_eq!(during.status, EventStatus::InProgress);
    assert!(during.student_window_open);
    assert!(!during.teacher_window_open);

    // 学生端已结束、教师端仍开放
    let half = api.event_status_at(event_id, dt(2025, 2, 5)).unwrap();
    assert_eq!(half.status, EventStatus::InProgress);
    assert!(half.teacher_window_open);

    let ended = api.event_status_at(event_id, after_event()).unwrap();
    assert_eq!(ended.status, EventStatus::Ended);
    assert_eq!(ended.teacher_count, 2);
    assert_eq!(ended.team_count, 1);
    assert_eq!(ended.draft_count, 0);
}

#[test]
fn test_event_not_found() {
    let env = TestEnv::new().unwrap();
    assert!(matches!(
        env.state.event_api.event_status(4242),
        Err(ApiError::NotFound(_))
    ));
}

// ==========================================
// 团队与成员
// ==========================================

#[test]
fn test_create_team_队长自动成为成员() {
    let env = TestEnv::new().unwrap();
    let event_id = env.create_event("组队", 2);
    let (team_id, captain_id) = env.add_team_with_captain(event_id, "T1", [None, None, None]);

    let members = env.state.event_api.list_team_members(team_id).unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].stu_id, captain_id);
    assert!(members[0].is_captain);

    let team = env.state.event_api.get_team(team_id).unwrap();
    assert_eq!(team.captain_id, Some(captain_id));
    assert_eq!(team.advisor, None);
}

#[test]
fn test_create_team_规则校验() {
    let env = TestEnv::new().unwrap();
    let event_id = env.create_event("组队规则", 2);
    let other_event = env.create_event("其他活动", 2);
    let outsider_teacher = env.add_teacher(other_event, "外部导师");
    let (_, captain_id) = env.add_team_with_captain(event_id, "T1", [None, None, None]);
    let api = &env.state.event_api;

    // 同一活动只能加入一个团队
    assert!(matches!(
        api.create_team(event_id, captain_id, "T2", "课题", [None, None, None]),
        Err(ApiError::BusinessRuleViolation(_))
    ));

    // 未参与活动的学生
    let stranger = env.add_student(other_event);
    assert!(matches!(
        api.create_team(event_id, stranger, "T3", "课题", [None, None, None]),
        Err(ApiError::BusinessRuleViolation(_))
    ));

    // 志愿导师必须参与活动
    let student = env.add_student(event_id);
    assert!(matches!(
        api.create_team(event_id, student, "T4", "课题", [Some(outsider_teacher), None, None]),
        Err(ApiError::ValidationError(_))
    ));

    assert!(matches!(
        api.create_team(event_id, student, "   ", "课题", [None, None, None]),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_add_team_member_人数上限() {
    let env = TestEnv::new().unwrap();
    // 测试活动 group_member_limit = 3
    let event_id = env.create_event("人数上限", 2);
    let (team_id, _) = env.add_team_with_captain(event_id, "T1", [None, None, None]);
    let api = &env.state.event_api;

    api.add_team_member(team_id, env.add_student(event_id)).unwrap();
    api.add_team_member(team_id, env.add_student(event_id)).unwrap();

    let result = api.add_team_member(team_id, env.add_student(event_id));
    assert!(matches!(result, Err(ApiError::BusinessRuleViolation(_))));
    assert_eq!(api.list_team_members(team_id).unwrap().len(), 3);
}

#[test]
fn test_add_team_member_学生只能加入一个团队() {
    let env = TestEnv::new().unwrap();
    let event_id = env.create_event("唯一团队", 2);
    let t1 = env.add_team(event_id, "T1", [None, None, None]);
    let t2 = env.add_team(event_id, "T2", [None, None, None]);
    let student = env.add_student(event_id);
    let api = &env.state.event_api;

    api.add_team_member(t1, student).unwrap();
    assert!(matches!(
        api.add_team_member(t2, student),
        Err(ApiError::BusinessRuleViolation(_))
    ));
}
