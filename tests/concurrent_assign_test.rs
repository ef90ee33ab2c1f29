// ==========================================
// 并发控制测试
// ==========================================
// 职责: 验证同一活动的自动分配/发布被串行化
// - 并发执行后草稿台账完整（每个团队恰好一条）
// - 并发发布后最终导师与草稿一致
// ==========================================

mod test_helpers;

use std::sync::Arc;
use std::thread;

use test_helpers::TestEnv;

#[test]
fn test_concurrent_auto_assign_and_publish_same_event() {
    let env = Arc::new(TestEnv::new().unwrap());
    let event_id = env.create_event("并发分配", 3);
    let teachers = env.add_teachers(event_id, 3);
    let teams = env.add_plain_teams(event_id, 8);
    env.submit_wishlist(event_id, teachers[0], &[teams[0], teams[1]]);

    env.state.assignment_api.run_auto_assign(event_id, "admin").unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let env = Arc::clone(&env);
        handles.push(thread::spawn(move || {
            let operator = format!("admin{}", i);
            if i % 2 == 0 {
                env.state
                    .assignment_api
                    .run_auto_assign(event_id, &operator)
                    .map(|_| ())
            } else {
                env.state
                    .assignment_api
                    .publish(event_id, &operator)
                    .map(|_| ())
            }
        }));
    }

    for handle in handles {
        let result = handle.join().expect("线程 panic");
        assert!(result.is_ok(), "并发操作失败: {:?}", result);
    }

    let views = env.state.assignment_api.list_assignments(event_id).unwrap();
    assert_eq!(views.len(), teams.len());

    // 所有操作结束后再发布一次，最终导师与草稿一一对应
    let published = env.state.assignment_api.publish(event_id, "admin").unwrap();
    assert_eq!(published.published_count, teams.len());
    for v in &views {
        assert_eq!(env.advisor_of(v.team_id), Some(v.teacher_id));
    }

    let logs = env.state.assignment_api.list_action_logs(event_id, 100).unwrap();
    // 1 次初始分配 + 8 次并发 + 1 次最终发布 + 1 次志愿提交
    assert_eq!(logs.len(), 11);
}

#[test]
fn test_concurrent_manual_assign_respects_capacity() {
    let env = Arc::new(TestEnv::new().unwrap());
    let event_id = env.create_event("并发手动", 2);
    let teacher = env.add_teacher(event_id, "A1");
    let teams = env.add_plain_teams(event_id, 6);

    let handles: Vec<_> = teams
        .iter()
        .map(|team_id| {
            let env = Arc::clone(&env);
            let team_id = *team_id;
            thread::spawn(move || {
                env.state
                    .assignment_api
                    .manual_assign(event_id, team_id, Some(teacher), "admin")
                    .is_ok()
            })
        })
        .collect();

    let succeeded = handles
        .into_iter()
        .map(|h| h.join().expect("线程 panic"))
        .filter(|ok| *ok)
        .count();

    assert_eq!(succeeded, 2);
    assert_eq!(
        env.state.assignment_api.list_assignments(event_id).unwrap().len(),
        2
    );
}
