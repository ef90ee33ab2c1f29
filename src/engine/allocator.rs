// ==========================================
// 毕业设计师生互选系统 - 自动分配引擎
// ==========================================
// 红线: 引擎不拼 SQL; 每条分配必须附带分数与说明
// ==========================================
// 职责: 为活动内每个团队生成且仅生成一条临时分配
// 输入: 团队列表(按创建顺序) + 导师列表(按 teacher_id) + 导师志愿索引 + 容量上限
// 输出: AllocationOutcome（分配明细 + 三阶段统计 + 超额导师）
// 阶段:
// 1) 志愿加权贪心: 非零分组合按分数降序单次遍历
// 2) 随机兜底: 剩余容量导师洗牌后轮转分配
// 3) 超额分配: 分配给 (已分配 - 上限) 最小的导师
// ==========================================

use crate::domain::advisor::Teacher;
use crate::domain::assignment::ProvisionalAssignment;
use crate::domain::team::Team;
use crate::domain::types::{AllocationPhase, AssignmentType};
use crate::engine::scoring::{MatchScorer, PreferenceIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// 随机兜底说明
pub const EXPLANATION_RANDOM: &str = "random assignment (no preference match)";

/// 超额分配说明
pub const EXPLANATION_OVER_CAPACITY: &str = "over-capacity assignment";

// ==========================================
// AllocationDecision - 单个团队的分配决策
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDecision {
    pub assignment: ProvisionalAssignment,
    pub phase: AllocationPhase,
}

// ==========================================
// AllocationOutcome - 分配结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub decisions: Vec<AllocationDecision>,

    pub total_teams: usize,
    pub total_teachers: usize,
    pub preference_matched: usize,
    pub random_assigned: usize,
    pub over_capacity_count: usize,

    /// 发生超额分配的导师（按首次超额顺序去重）
    pub over_capacity_teacher_ids: Vec<i64>,
    pub over_capacity_teachers: Vec<String>,
}

impl AllocationOutcome {
    pub fn assigned_count(&self) -> usize {
        self.decisions.len()
    }

    /// 待写入草稿台账的记录
    pub fn assignments(&self) -> Vec<ProvisionalAssignment> {
        self.decisions.iter().map(|d| d.assignment.clone()).collect()
    }

    /// 各导师分配数（teacher_id -> 团队数）
    pub fn load_by_teacher(&self) -> HashMap<i64, i64> {
        let mut load = HashMap::new();
        for d in &self.decisions {
            *load.entry(d.assignment.teacher_id).or_insert(0) += 1;
        }
        load
    }
}

// ==========================================
// AllocationEngine - 自动分配引擎
// ==========================================
pub struct AllocationEngine {
    scorer: MatchScorer,
}

impl AllocationEngine {
    pub fn new(scorer: MatchScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    /// 执行三阶段分配
    ///
    /// # 参数
    /// - `teams`: 活动内全部团队（按 created_at, team_id 排序）
    /// - `teachers`: 参与导师（按 teacher_id 升序）
    /// - `index`: 导师志愿索引
    /// - `capacity_limit`: 每位导师可带团队上限
    /// - `rng`: 随机兜底阶段洗牌使用的随机源
    ///
    /// 容量计数器为本次调用的局部状态，调用结束即丢弃
    #[instrument(skip(self, teams, teachers, index, rng), fields(
        event_id = event_id,
        teams_count = teams.len(),
        teachers_count = teachers.len(),
        capacity_limit = capacity_limit
    ))]
    pub fn allocate<R: Rng + ?Sized>(
        &self,
        event_id: i64,
        teams: &[Team],
        teachers: &[Teacher],
        index: &PreferenceIndex,
        capacity_limit: i64,
        rng: &mut R,
    ) -> AllocationOutcome {
        let limit = capacity_limit.max(0);

        let mut outcome = AllocationOutcome {
            total_teams: teams.len(),
            total_teachers: teachers.len(),
            ..Default::default()
        };

        let mut remaining: HashMap<i64, i64> =
            teachers.iter().map(|t| (t.teacher_id, limit)).collect();
        let mut assigned_load: HashMap<i64, i64> =
            teachers.iter().map(|t| (t.teacher_id, 0)).collect();
        let mut assigned_teams: HashSet<i64> = HashSet::new();

        // ===== 阶段 1: 志愿加权贪心 =====
        let mut candidates = Vec::new();
        for team in teams {
            for teacher in teachers {
                let s = self.scorer.score(team, teacher.teacher_id, index);
                if s.has_preference_match() {
                    candidates.push((team.team_id, teacher.teacher_id, s));
                }
            }
        }
        // 稳定排序: 同分保持 (团队创建顺序, teacher_id) 的枚举顺序
        candidates.sort_by(|a, b| b.2.value.total_cmp(&a.2.value));

        for (team_id, teacher_id, s) in candidates {
            if assigned_teams.contains(&team_id) {
                continue;
            }
            let cap = remaining.get_mut(&teacher_id);
            let Some(cap) = cap else { continue };
            if *cap <= 0 {
                continue;
            }
            *cap -= 1;
            *assigned_load.entry(teacher_id).or_insert(0) += 1;
            assigned_teams.insert(team_id);

            debug!(team_id, teacher_id, score = s.value, "志愿匹配");
            outcome.decisions.push(AllocationDecision {
                assignment: ProvisionalAssignment {
                    event_id,
                    team_id,
                    teacher_id,
                    assignment_type: AssignmentType::Auto,
                    score: s.value,
                    explanation: s.explanation,
                },
                phase: AllocationPhase::PreferenceMatch,
            });
            outcome.preference_matched += 1;
        }

        // ===== 阶段 2: 随机兜底 =====
        let mut pool: Vec<i64> = teachers
            .iter()
            .map(|t| t.teacher_id)
            .filter(|id| remaining.get(id).copied().unwrap_or(0) > 0)
            .collect();
        pool.shuffle(rng);

        let mut cursor = 0usize;
        for team in teams {
            if pool.is_empty() {
                break;
            }
            if assigned_teams.contains(&team.team_id) {
                continue;
            }
            if cursor >= pool.len() {
                cursor = 0;
            }
            let teacher_id = pool[cursor];

            let cap = remaining.entry(teacher_id).or_insert(0);
            *cap -= 1;
            let exhausted = *cap <= 0;
            *assigned_load.entry(teacher_id).or_insert(0) += 1;
            assigned_teams.insert(team.team_id);

            debug!(team_id = team.team_id, teacher_id, "随机兜底分配");
            outcome.decisions.push(AllocationDecision {
                assignment: ProvisionalAssignment {
                    event_id,
                    team_id: team.team_id,
                    teacher_id,
                    assignment_type: AssignmentType::Auto,
                    score: 0.0,
                    explanation: EXPLANATION_RANDOM.to_string(),
                },
                phase: AllocationPhase::RandomFallback,
            });
            outcome.random_assigned += 1;

            if exhausted {
                pool.remove(cursor);
            } else {
                cursor += 1;
            }
        }

        // ===== 阶段 3: 超额分配 =====
        if !teachers.is_empty() {
            let names: HashMap<i64, &str> = teachers
                .iter()
                .map(|t| (t.teacher_id, t.teacher_name.as_str()))
                .collect();

            for team in teams {
                if assigned_teams.contains(&team.team_id) {
                    continue;
                }
                let target = teachers
                    .iter()
                    .map(|t| {
                        let load = assigned_load.get(&t.teacher_id).copied().unwrap_or(0);
                        (load - limit, t.teacher_id)
                    })
                    .min();
                let Some((_, teacher_id)) = target else { break };

                *assigned_load.entry(teacher_id).or_insert(0) += 1;
                assigned_teams.insert(team.team_id);

                warn!(team_id = team.team_id, teacher_id, "超额分配");
                outcome.decisions.push(AllocationDecision {
                    assignment: ProvisionalAssignment {
                        event_id,
                        team_id: team.team_id,
                        teacher_id,
                        assignment_type: AssignmentType::Auto,
                        score: 0.0,
                        explanation: EXPLANATION_OVER_CAPACITY.to_string(),
                    },
                    phase: AllocationPhase::OverCapacity,
                });
                outcome.over_capacity_count += 1;

                if !outcome.over_capacity_teacher_ids.contains(&teacher_id) {
                    outcome.over_capacity_teacher_ids.push(teacher_id);
                    outcome
                        .over_capacity_teachers
                        .push(names.get(&teacher_id).copied().unwrap_or_default().to_string());
                }
            }
        }

        info!(
            assigned_count = outcome.assigned_count(),
            preference_matched = outcome.preference_matched,
            random_assigned = outcome.random_assigned,
            over_capacity_count = outcome.over_capacity_count,
            "自动分配计算完成"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::advisor::TeacherPreference;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn team(team_id: i64, preferred: [Option<i64>; 3]) -> Team {
        Team {
            team_id,
            event_id: 1,
            team_name: format!("T{}", team_id),
            project_title: String::new(),
            captain_id: None,
            preferred_advisors: preferred,
            advisor: None,
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    fn teacher(teacher_id: i64) -> Teacher {
        Teacher {
            teacher_id,
            teacher_no: format!("T{:03}", teacher_id),
            teacher_name: format!("导师{}", teacher_id),
            research_direction: None,
        }
    }

    fn pref(teacher_id: i64, team_id: i64, rank: i64) -> TeacherPreference {
        TeacherPreference {
            teacher_id,
            team_id,
            event_id: 1,
            preference_rank: rank,
        }
    }

    fn engine() -> AllocationEngine {
        AllocationEngine::new(MatchScorer::default())
    }

    #[test]
    fn test_mutual_top_picks() {
        // T1: A1 > A2 > A3; T2: A2 > A1 > A3; A1: T1#1, T2#2; A2: T2#1
        let teams = vec![
            team(1, [Some(1), Some(2), Some(3)]),
            team(2, [Some(2), Some(1), Some(3)]),
        ];
        let teachers = vec![teacher(1), teacher(2)];
        let index =
            PreferenceIndex::from_preferences(&[pref(1, 1, 1), pref(1, 2, 2), pref(2, 2, 1)]);

        let mut rng = StdRng::seed_from_u64(1);
        let out = engine().allocate(1, &teams, &teachers, &index, 1, &mut rng);

        let by_team: HashMap<i64, i64> = out
            .decisions
            .iter()
            .map(|d| (d.assignment.team_id, d.assignment.teacher_id))
            .collect();
        assert_eq!(by_team[&1], 1);
        assert_eq!(by_team[&2], 2);
        assert_eq!(out.preference_matched, 2);
        assert_eq!(out.over_capacity_count, 0);
        assert!(out.over_capacity_teachers.is_empty());
    }

    #[test]
    fn test_single_advisor_overflow() {
        let teams = vec![team(1, [None; 3]), team(2, [None; 3]), team(3, [None; 3])];
        let teachers = vec![teacher(9)];
        let mut rng = StdRng::seed_from_u64(7);
        let out = engine().allocate(1, &teams, &teachers, &PreferenceIndex::default(), 1, &mut rng);

        assert_eq!(out.assigned_count(), 3);
        assert_eq!(out.preference_matched, 0);
        assert_eq!(out.random_assigned, 1);
        assert_eq!(out.over_capacity_count, 2);
        assert_eq!(out.over_capacity_teachers, vec!["导师9".to_string()]);
        assert_eq!(out.over_capacity_teacher_ids, vec![9]);
        let over: Vec<_> = out
            .decisions
            .iter()
            .filter(|d| d.phase == AllocationPhase::OverCapacity)
            .collect();
        assert_eq!(over.len(), 2);
        assert!(over
            .iter()
            .all(|d| d.assignment.explanation == EXPLANATION_OVER_CAPACITY && d.assignment.score == 0.0));
    }

    #[test]
    fn test_capacity_respected_when_sufficient() {
        let teams: Vec<Team> = (1..=7).map(|i| team(i, [Some(1), None, None])).collect();
        let teachers = vec![teacher(1), teacher(2), teacher(3)];
        let mut rng = StdRng::seed_from_u64(3);
        let out = engine().allocate(1, &teams, &teachers, &PreferenceIndex::default(), 3, &mut rng);

        assert_eq!(out.assigned_count(), 7);
        assert_eq!(out.over_capacity_count, 0);
        // 所有团队都首选导师1，导师1只能接收 3 个
        assert_eq!(out.preference_matched, 3);
        assert_eq!(out.random_assigned, 4);
        for (_, load) in out.load_by_teacher() {
            assert!(load <= 3);
        }
    }

    #[test]
    fn test_overflow_count_and_capacity_exhausted_first() {
        // N=8, M=3, L=2 => 2 个超额
        let teams: Vec<Team> = (1..=8).map(|i| team(i, [None; 3])).collect();
        let teachers = vec![teacher(1), teacher(2), teacher(3)];
        let mut rng = StdRng::seed_from_u64(11);
        let out = engine().allocate(1, &teams, &teachers, &PreferenceIndex::default(), 2, &mut rng);

        assert_eq!(out.over_capacity_count, 2);
        assert_eq!(out.random_assigned, 6);
        // 超额目标按 (已分配-上限, teacher_id) 最小选择: 先导师1, 再导师2
        assert_eq!(out.over_capacity_teacher_ids, vec![1, 2]);
    }

    #[test]
    fn test_higher_score_wins_contested_advisor() {
        // 导师1容量 1: T1 互为第一志愿 (22), T2 仅团队第一志愿 (10)
        let teams = vec![team(2, [Some(1), None, None]), team(1, [Some(1), None, None])];
        let teachers = vec![teacher(1), teacher(2)];
        let index = PreferenceIndex::from_preferences(&[pref(1, 1, 1)]);
        let mut rng = StdRng::seed_from_u64(5);
        let out = engine().allocate(1, &teams, &teachers, &index, 1, &mut rng);

        let first = &out.decisions[0];
        assert_eq!(first.assignment.team_id, 1);
        assert_eq!(first.assignment.teacher_id, 1);
        assert_eq!(first.assignment.score, 22.0);
        assert_eq!(first.assignment.explanation, "advisor rank 1 + team rank 1");

        let second = &out.decisions[1];
        assert_eq!(second.assignment.team_id, 2);
        assert_eq!(second.assignment.teacher_id, 2);
        assert_eq!(second.phase, AllocationPhase::RandomFallback);
    }

    #[test]
    fn test_ties_follow_team_order() {
        // 两个团队同分争夺导师1，按团队顺序先到先得
        let teams = vec![team(5, [Some(1), None, None]), team(3, [Some(1), None, None])];
        let teachers = vec![teacher(1), teacher(2)];
        let mut rng = StdRng::seed_from_u64(0);
        let out = engine().allocate(1, &teams, &teachers, &PreferenceIndex::default(), 1, &mut rng);
        assert_eq!(out.decisions[0].assignment.team_id, 5);
        assert_eq!(out.decisions[0].assignment.teacher_id, 1);
    }

    #[test]
    fn test_matched_teams_stable_across_seeds() {
        let teams: Vec<Team> = (1..=6)
            .map(|i| if i <= 2 { team(i, [Some(i), None, None]) } else { team(i, [None; 3]) })
            .collect();
        let teachers = vec![teacher(1), teacher(2), teacher(3)];
        let index = PreferenceIndex::from_preferences(&[pref(1, 1, 1), pref(2, 2, 1)]);

        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            engine()
                .allocate(1, &teams, &teachers, &index, 2, &mut rng)
                .decisions
                .into_iter()
                .filter(|d| d.phase == AllocationPhase::PreferenceMatch)
                .map(|d| d.assignment)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(1), run(99));
    }

    #[test]
    fn test_same_seed_same_result() {
        let teams: Vec<Team> = (1..=5).map(|i| team(i, [None; 3])).collect();
        let teachers = vec![teacher(1), teacher(2), teacher(3)];
        let alloc = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            engine()
                .allocate(1, &teams, &teachers, &PreferenceIndex::default(), 2, &mut rng)
                .assignments()
        };
        assert_eq!(alloc(42), alloc(42));
    }

    #[test]
    fn test_zero_limit_everything_overflows() {
        let teams = vec![team(1, [Some(1), None, None]), team(2, [None; 3])];
        let teachers = vec![teacher(1), teacher(2)];
        let mut rng = StdRng::seed_from_u64(0);
        let out = engine().allocate(1, &teams, &teachers, &PreferenceIndex::default(), 0, &mut rng);
        assert_eq!(out.over_capacity_count, 2);
        assert_eq!(out.over_capacity_teacher_ids, vec![1, 2]);
    }
}
