// ==========================================
// 毕业设计师生互选系统 - 活动级互斥锁
// ==========================================
// 同一活动的自动分配/手动调整/清空/发布串行执行；
// 不同活动互不阻塞。数据库层另由 BEGIN IMMEDIATE 事务保证原子性。
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct EventLockRegistry {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl EventLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取活动对应的锁（不存在则创建）
    pub fn lock_for(&self, event_id: i64) -> ApiResult<Arc<Mutex<()>>> {
        let mut map = self
            .locks
            .lock()
            .map_err(|e| ApiError::InternalError(format!("活动锁表获取失败: {}", e)))?;
        Ok(map
            .entry(event_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// 在活动锁内执行
    pub fn with_event_lock<T>(
        &self,
        event_id: i64,
        f: impl FnOnce() -> ApiResult<T>,
    ) -> ApiResult<T> {
        let lock = self.lock_for(event_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("活动(id={})锁获取失败: {}", event_id, e)))?;
        f()
    }
}
