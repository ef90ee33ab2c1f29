// ==========================================
// 毕业设计师生互选系统 - 互选活动领域模型
// ==========================================
// 活动拥有学生端/教师端两个独立的志愿提交窗口，
// 以及两个容量参数（导师可选/可带团队上限、团队人数上限）
// ==========================================

use super::types::EventStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 默认导师可选团队上限
pub const DEFAULT_TEACHER_CHOICE_LIMIT: i64 = 5;

/// 默认团队人数上限（含队长）
pub const DEFAULT_GROUP_MEMBER_LIMIT: i64 = 5;

// ==========================================
// SelectionEvent - 互选活动
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub event_id: i64,
    pub event_name: String,

    // ===== 学生端窗口 =====
    pub stu_start_time: NaiveDateTime,
    pub stu_end_time: NaiveDateTime,

    // ===== 教师端窗口 =====
    pub tea_start_time: NaiveDateTime,
    pub tea_end_time: NaiveDateTime,

    // ===== 容量参数 =====
    pub teacher_choice_limit: i64,
    pub group_member_limit: i64,
}

impl SelectionEvent {
    /// 推导活动状态
    ///
    /// 窗口为左闭右开区间 [start, end)，截止时刻本身即视为已结束。
    ///
    /// - 两侧都未开始 => 未开始
    /// - 两侧都已结束 => 已结束
    /// - 其余 => 进行中
    pub fn status_at(&self, now: NaiveDateTime) -> EventStatus {
        if self.stu_start_time > now && self.tea_start_time > now {
            EventStatus::NotStarted
        } else if self.both_windows_closed(now) {
            EventStatus::Ended
        } else {
            EventStatus::InProgress
        }
    }

    /// 两侧窗口是否都已关闭（自动分配前置条件）
    pub fn both_windows_closed(&self, now: NaiveDateTime) -> bool {
        self.stu_end_time <= now && self.tea_end_time <= now
    }

    /// 学生端窗口是否开放
    pub fn is_student_window_open(&self, now: NaiveDateTime) -> bool {
        self.stu_start_time <= now && now < self.stu_end_time
    }

    /// 教师端窗口是否开放
    pub fn is_teacher_window_open(&self, now: NaiveDateTime) -> bool {
        self.tea_start_time <= now && now < self.tea_end_time
    }

    /// 校验窗口与容量参数
    ///
    /// # 返回
    /// - Ok(()): 合法
    /// - Err(String): 第一个不合法的原因
    pub fn validate(&self) -> Result<(), String> {
        if self.event_name.trim().is_empty() {
            return Err("活动名称不能为空".to_string());
        }
        if self.stu_start_time >= self.stu_end_time {
            return Err("学生截止时间必须晚于学生开始时间".to_string());
        }
        if self.tea_start_time >= self.tea_end_time {
            return Err("教师截止时间必须晚于教师开始时间".to_string());
        }
        if self.teacher_choice_limit < 0 {
            return Err(format!(
                "导师可选团队上限不能为负数: {}",
                self.teacher_choice_limit
            ));
        }
        if self.group_member_limit < 1 {
            return Err(format!(
                "团队人数上限至少为 1: {}",
                self.group_member_limit
            ));
        }
        Ok(())
    }
}
