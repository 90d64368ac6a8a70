use crate::analytics::{
    HitManager, RetentionTask, UsageRecorder, UsageSink, set_global_hit_manager,
};
use crate::api::rate_limit::SlidingWindowLimiter;
use crate::config::{StaticConfig, get_config, store_config};
use crate::services::{AnalyticsService, LinkService, TrackingService, WeightedSelector};
use crate::storage::{SeaOrmStorage, StorageFactory};
use crate::utils::password::resolve_admin_hash;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub link_service: Arc<LinkService>,
    pub selector: Arc<WeightedSelector>,
    pub tracking_service: Arc<TrackingService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub usage_recorder: Arc<UsageRecorder>,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
}

/// 准备服务器启动的上下文
/// 包括存储、后台任务和服务层等
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))?;

    // 管理密码允许以明文配置，启动时统一换成 Argon2 哈希再写回全局配置，
    // 请求处理路径只会接触到哈希值
    resolve_admin_credential().context("Failed to resolve admin credential")?;

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let config = get_config();

    // 初始化命中计数器
    if config.analytics.enable_hit_tracking {
        let mgr = Arc::new(HitManager::new(
            storage.as_hit_sink(),
            Duration::from_secs(config.analytics.flush_interval_secs),
            config.analytics.max_hits_before_flush,
        ));
        set_global_hit_manager(mgr.clone());

        // 启动后台任务，并保持强引用以确保任务不会被过早销毁
        let mgr_for_task = mgr.clone();
        tokio::spawn(async move {
            mgr_for_task.start_background_task().await;
        });

        debug!(
            "HitManager initialized with {} seconds and {} max hits before flush",
            config.analytics.flush_interval_secs, config.analytics.max_hits_before_flush
        );
    } else {
        warn!("Hit tracking is disabled in configuration");
    }

    // 初始化小时级用量统计（请求数、跳转数、错误数、限流数、平均延迟）
    let usage_sink: Arc<dyn UsageSink> = storage.clone();
    let usage_recorder = Arc::new(UsageRecorder::new(
        usage_sink,
        Duration::from_secs(config.analytics.usage_flush_interval_secs),
    ));
    let recorder_for_task = usage_recorder.clone();
    tokio::spawn(async move {
        recorder_for_task.start_background_task().await;
    });
    debug!(
        "UsageRecorder initialized with {} seconds flush interval",
        config.analytics.usage_flush_interval_secs
    );

    // 初始化限流器（滑动窗口，按客户端 IP 计数）
    let rate_limiter = Arc::new(SlidingWindowLimiter::from_config());
    if config.rate_limit.enabled {
        rate_limiter.spawn_sweep_task(Duration::from_secs(config.rate_limit.sweep_interval_secs));
        debug!(
            "Rate limiter initialized: {}/min, {}/day",
            config.rate_limit.per_minute, config.rate_limit.per_day
        );
    } else {
        info!("Rate limiting is disabled in configuration");
    }

    // 初始化数据清理后台任务
    if config.analytics.retention_days > 0 {
        let retention_task = Arc::new(RetentionTask::new(
            storage.clone(),
            config.analytics.retention_days,
        ));
        retention_task.spawn_background_task(config.analytics.retention_sweep_hours);
        debug!(
            "Data retention background task initialized ({} days)",
            config.analytics.retention_days
        );
    } else {
        debug!("Data retention is disabled (retention_days = 0)");
    }

    // Service layer shared by HTTP handlers
    let link_service = Arc::new(LinkService::new(storage.clone()));
    let selector = Arc::new(WeightedSelector::new(storage.clone()));
    let tracking_service = Arc::new(TrackingService::new(storage.clone()));
    let analytics_service = Arc::new(AnalyticsService::new(storage.clone()));

    check_component_enabled(&config);

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        link_service,
        selector,
        tracking_service,
        analytics_service,
        usage_recorder,
        rate_limiter,
    })
}

/// 将配置中的管理密码统一为 Argon2 哈希形式
fn resolve_admin_credential() -> Result<()> {
    let config = get_config();
    if config.api.admin_password.is_empty() {
        return Ok(());
    }

    let hashed = resolve_admin_hash(&config.api.admin_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?;

    if hashed != config.api.admin_password {
        let mut updated: StaticConfig = (*config).clone();
        updated.api.admin_password = hashed;
        store_config(updated);
        debug!("Admin password hashed at startup");
    }

    Ok(())
}

fn check_component_enabled(config: &StaticConfig) {
    // 检查 JWT Secret 安全性
    check_jwt_secret_security(config);

    // 检查 Cookie Secure 标志
    if !config.api.cookie_secure {
        warn!(
            "WARNING: Cookie Secure flag is disabled. \
            Cookies will be sent over unencrypted HTTP connections. \
            Enable cookie_secure=true for production environments."
        );
    }

    // 检查 Admin API 是否启用
    if config.api.admin_password.is_empty() {
        info!("Admin API is disabled (api.admin_password not set)");
    } else {
        info!("Admin API available at: {}", config.routes.admin_prefix);
    }

    info!(
        "Health API available at: {} (detailed report {})",
        config.routes.health_prefix,
        if config
            .api
            .health_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
        {
            "requires bearer token"
        } else {
            "is open"
        }
    );

    info!("Tracking API available at: {}", config.routes.track_prefix);
    info!(
        "Redirect endpoint available at: {}",
        config.routes.redirect_path
    );
}

/// 检查 JWT Secret 安全性
fn check_jwt_secret_security(config: &StaticConfig) {
    match config.api.jwt_secret.as_deref() {
        None | Some("") => {
            warn!(
                "WARNING: api.jwt_secret is not set. A random secret is generated at startup, \
                so admin sessions will not survive a restart."
            );
        }
        Some(secret) if secret.len() < 32 => {
            warn!(
                "WARNING: JWT Secret is too short ({} bytes). \
                Recommended minimum is 32 bytes for security.",
                secret.len()
            );
        }
        Some(_) => {}
    }
}
