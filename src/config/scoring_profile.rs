use serde::{Deserialize, Serialize};

/// 匹配评分权重（持久化对象）
///
/// 存储位置：config_kv（key='scoring_weights'），可按活动作用域覆写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// 导师志愿分表：下标 0 对应第 1 志愿
    #[serde(default = "default_advisor_rank_scores")]
    pub advisor_rank_scores: Vec<f64>,

    /// 团队志愿导师分表：下标 0 对应第 1 槽位
    #[serde(default = "default_team_rank_scores")]
    pub team_rank_scores: Vec<f64>,

    /// 导师侧加权系数（>1.0 时导师意愿略优先）
    #[serde(default = "default_advisor_weight")]
    pub advisor_weight: f64,

    /// 总分保留小数位
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

fn default_advisor_rank_scores() -> Vec<f64> {
    vec![10.0, 8.0, 6.0, 4.0, 2.0]
}

fn default_team_rank_scores() -> Vec<f64> {
    vec![10.0, 5.0, 2.0]
}

fn default_advisor_weight() -> f64 {
    1.2
}

fn default_decimal_places() -> u32 {
    2
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            advisor_rank_scores: default_advisor_rank_scores(),
            team_rank_scores: default_team_rank_scores(),
            advisor_weight: default_advisor_weight(),
            decimal_places: default_decimal_places(),
        }
    }
}

impl ScoringWeights {
    /// 导师第 rank 志愿的基础分（超出分表返回 0）
    pub fn advisor_rank_score(&self, rank: i64) -> f64 {
        if rank < 1 {
            return 0.0;
        }
        self.advisor_rank_scores
            .get((rank - 1) as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// 团队第 slot 槽位的基础分（超出分表返回 0）
    pub fn team_slot_score(&self, slot: usize) -> f64 {
        if slot < 1 {
            return 0.0;
        }
        self.team_rank_scores.get(slot - 1).copied().unwrap_or(0.0)
    }

    /// 校验分表
    pub fn validate(&self) -> Result<(), String> {
        if !self.advisor_weight.is_finite() || self.advisor_weight <= 0.0 {
            return Err(format!("导师加权系数必须为正数: {}", self.advisor_weight));
        }
        let all = self.advisor_rank_scores.iter().chain(self.team_rank_scores.iter());
        for v in all {
            if !v.is_finite() || *v < 0.0 {
                return Err(format!("分表中存在非法分值: {}", v));
            }
        }
        if self.decimal_places > 6 {
            return Err(format!("小数位过大: {}", self.decimal_places));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let w = ScoringWeights::default();
        assert_eq!(w.advisor_rank_score(1), 10.0);
        assert_eq!(w.advisor_rank_score(5), 2.0);
        assert_eq!(w.advisor_rank_score(6), 0.0);
        assert_eq!(w.advisor_rank_score(0), 0.0);
        assert_eq!(w.team_slot_score(1), 10.0);
        assert_eq!(w.team_slot_score(3), 2.0);
        assert_eq!(w.team_slot_score(4), 0.0);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let w: ScoringWeights = serde_json::from_str(r#"{"advisor_weight": 1.5}"#).unwrap();
        assert_eq!(w.advisor_weight, 1.5);
        assert_eq!(w.team_rank_scores, vec![10.0, 5.0, 2.0]);
        assert_eq!(w.decimal_places, 2);
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let w = ScoringWeights {
            advisor_weight: -1.0,
            ..Default::default()
        };
        assert!(w.validate().is_err());
    }
}
