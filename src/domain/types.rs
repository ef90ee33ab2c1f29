// ==========================================
// 毕业设计师生互选系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 活动状态 (Event Status)
// ==========================================
// 不落库，始终由当前时间与两侧窗口推导
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    NotStarted, // 未开始
    InProgress, // 进行中
    Ended,      // 已结束
}

impl EventStatus {
    /// 中文显示名
    pub fn label_cn(&self) -> &'static str {
        match self {
            EventStatus::NotStarted => "未开始",
            EventStatus::InProgress => "进行中",
            EventStatus::Ended => "已结束",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::NotStarted => write!(f, "NOT_STARTED"),
            EventStatus::InProgress => write!(f, "IN_PROGRESS"),
            EventStatus::Ended => write!(f, "ENDED"),
        }
    }
}

// ==========================================
// 分配类型 (Assignment Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentType {
    Auto,   // 自动分配
    Manual, // 手动调整
}

impl AssignmentType {
    /// 从数据库字符串解析（未知值返回 None）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(AssignmentType::Auto),
            "manual" => Some(AssignmentType::Manual),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentType::Auto => "auto",
            AssignmentType::Manual => "manual",
        }
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 分配来源阶段 (Allocation Phase)
// ==========================================
// 自动分配三阶段，仅用于结果统计与日志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationPhase {
    PreferenceMatch, // 志愿加权贪心
    RandomFallback,  // 随机兜底
    OverCapacity,    // 超额分配
}

impl fmt::Display for AllocationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPhase::PreferenceMatch => write!(f, "PREFERENCE_MATCH"),
            AllocationPhase::RandomFallback => write!(f, "RANDOM_FALLBACK"),
            AllocationPhase::OverCapacity => write!(f, "OVER_CAPACITY"),
        }
    }
}

// ==========================================
// 推荐等级 (Recommendation Tier)
// ==========================================
// 仅作展示辅助，不影响任何持久化结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationTier {
    None,        // 无志愿关联
    Poor,        // 弱
    Optional,    // 可选
    Recommended, // 推荐
    Strong,      // 强烈推荐
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationTier::None => write!(f, "none"),
            RecommendationTier::Poor => write!(f, "poor"),
            RecommendationTier::Optional => write!(f, "optional"),
            RecommendationTier::Recommended => write!(f, "recommended"),
            RecommendationTier::Strong => write!(f, "strong"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_type_db_str() {
        assert_eq!(AssignmentType::from_db_str("manual"), Some(AssignmentType::Manual));
        assert_eq!(AssignmentType::from_db_str(" MANUAL "), Some(AssignmentType::Manual));
        assert_eq!(AssignmentType::from_db_str("auto"), Some(AssignmentType::Auto));
        assert_eq!(AssignmentType::from_db_str("override"), None);
        assert_eq!(AssignmentType::from_db_str(""), None);
        assert_eq!(AssignmentType::Manual.to_db_str(), "manual");
    }

    #[test]
    fn test_recommendation_tier_ordering() {
        assert!(RecommendationTier::Strong > RecommendationTier::Recommended);
        assert!(RecommendationTier::Poor > RecommendationTier::None);
        assert_eq!(RecommendationTier::Optional.to_string(), "optional");
    }
}
