// ==========================================
// 毕业设计师生互选系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 覆写顺序: event/{event_id} > global > 内置默认值
// ==========================================

use crate::config::scoring_profile::ScoringWeights;
use crate::db::open_sqlite_connection;
use crate::domain::event::{DEFAULT_GROUP_MEMBER_LIMIT, DEFAULT_TEACHER_CHOICE_LIMIT};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取指定作用域的配置值
    fn get_scoped_value(&self, scope: &ConfigScope, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![scope.scope_id(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取配置值：活动作用域优先，其次 global
    pub fn get_value(&self, event_id: Option<i64>, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        if let Some(id) = event_id {
            if let Some(v) = self.get_scoped_value(&ConfigScope::Event { event_id: id }, key)? {
                return Ok(Some(v));
            }
        }
        self.get_scoped_value(&ConfigScope::Global, key)
    }

    /// 写入配置值（UPSERT）
    pub fn set_value(&self, scope: &ConfigScope, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 删除配置值
    pub fn remove_value(&self, scope: &ConfigScope, key: &str) -> Result<usize, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let rows = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
        )?;
        Ok(rows)
    }

    // ===== 评分配置 =====

    /// 获取匹配评分权重
    ///
    /// 配置不存在返回内置默认表；格式错误或校验不通过时记录告警并回退默认表
    pub fn get_scoring_weights(&self, event_id: Option<i64>) -> Result<ScoringWeights, Box<dyn Error>> {
        let raw = match self.get_value(event_id, config_keys::SCORING_WEIGHTS)? {
            Some(v) => v,
            None => return Ok(ScoringWeights::default()),
        };

        let weights = match serde_json::from_str::<ScoringWeights>(&raw) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(
                    config_key = config_keys::SCORING_WEIGHTS,
                    raw_value = %raw,
                    error = %e,
                    "评分权重配置格式错误，使用默认分表"
                );
                return Ok(ScoringWeights::default());
            }
        };

        if let Err(reason) = weights.validate() {
            tracing::warn!(
                config_key = config_keys::SCORING_WEIGHTS,
                reason = %reason,
                "评分权重配置不合法，使用默认分表"
            );
            return Ok(ScoringWeights::default());
        }

        Ok(weights)
    }

    // ===== 随机兜底配置 =====

    /// 获取随机兜底阶段的洗牌种子（未配置返回 None，使用系统熵源）
    pub fn get_shuffle_seed(&self, event_id: Option<i64>) -> Result<Option<u64>, Box<dyn Error>> {
        let raw = match self.get_value(event_id, config_keys::SHUFFLE_SEED)? {
            Some(v) => v,
            None => return Ok(None),
        };
        match raw.trim().parse::<u64>() {
            Ok(seed) => Ok(Some(seed)),
            Err(_) => {
                tracing::warn!(
                    config_key = config_keys::SHUFFLE_SEED,
                    raw_value = %raw,
                    "洗牌种子配置格式错误，忽略"
                );
                Ok(None)
            }
        }
    }

    // ===== 活动默认参数 =====

    /// 新建活动时的默认导师可选团队上限
    pub fn get_default_teacher_choice_limit(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_value(None, config_keys::DEFAULT_TEACHER_CHOICE_LIMIT)?;
        Ok(value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .unwrap_or(DEFAULT_TEACHER_CHOICE_LIMIT))
    }

    /// 新建活动时的默认团队人数上限
    pub fn get_default_group_member_limit(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_value(None, config_keys::DEFAULT_GROUP_MEMBER_LIMIT)?;
        Ok(value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v >= 1)
            .unwrap_or(DEFAULT_GROUP_MEMBER_LIMIT))
    }
}

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                  // 全局
    Event { event_id: i64 }, // 单个互选活动
}

impl ConfigScope {
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Event { event_id } => format!("event/{}", event_id),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 评分权重 (JSON)
    pub const SCORING_WEIGHTS: &str = "scoring_weights";

    // 随机兜底洗牌种子 (u64)
    pub const SHUFFLE_SEED: &str = "shuffle_seed";

    // 活动默认参数
    pub const DEFAULT_TEACHER_CHOICE_LIMIT: &str = "default_teacher_choice_limit";
    pub const DEFAULT_GROUP_MEMBER_LIMIT: &str = "default_group_member_limit";
}
