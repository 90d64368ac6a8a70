use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::analytics::{UsageRecorder, get_hit_manager};

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

pub async fn listen_for_shutdown(usage_recorder: &UsageRecorder) {
    // 等待 Ctrl+C 信号
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, flushing data...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    // 将所有关闭任务包裹在超时内
    let shutdown_result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(usage_recorder),
    )
    .await;

    match shutdown_result {
        Ok(()) => {
            info!("All shutdown tasks completed successfully");
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds! Forcing exit.",
                SHUTDOWN_TIMEOUT_SECS
            );
            std::process::exit(1);
        }
    }
}

/// 执行所有关闭任务（在超时内调用）
async fn perform_shutdown_tasks(usage_recorder: &UsageRecorder) {
    // 刷新命中计数
    if let Some(manager) = get_hit_manager() {
        match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), manager.flush()).await {
            Ok(()) => {
                info!("HitManager flushed successfully");
            }
            Err(_) => {
                error!(
                    "HitManager flush timed out after {} seconds",
                    TASK_TIMEOUT_SECS
                );
            }
        }
    } else {
        info!("HitManager is not initialized, skipping flush");
    }

    // 刷新小时级用量统计
    match timeout(
        Duration::from_secs(TASK_TIMEOUT_SECS),
        usage_recorder.flush(),
    )
    .await
    {
        Ok(()) => {
            info!("UsageRecorder flushed successfully");
        }
        Err(_) => {
            error!(
                "UsageRecorder flush timed out after {} seconds",
                TASK_TIMEOUT_SECS
            );
        }
    }
}
