use std::sync::{Arc, OnceLock};
use tracing::trace;

use super::manager::HitManager;

pub static GLOBAL_HIT_MANAGER: OnceLock<Arc<HitManager>> = OnceLock::new();

/// 初始化全局命中管理器（只允许初始化一次）
pub fn set_global_hit_manager(manager: Arc<HitManager>) {
    if GLOBAL_HIT_MANAGER.set(manager).is_err() {
        panic!("GLOBAL_HIT_MANAGER has already been set");
    }
}

/// 获取全局命中管理器
pub fn get_hit_manager() -> Option<&'static Arc<HitManager>> {
    match GLOBAL_HIT_MANAGER.get() {
        Some(manager) => Some(manager),
        None => {
            trace!("GLOBAL_HIT_MANAGER has not been initialized yet");
            None
        }
    }
}
