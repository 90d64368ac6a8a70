//! 每小时用量统计记录器
//!
//! 按 (UTC 日期, 小时) 聚合请求量、跳转量、错误量、限流量和响应时间，
//! 内存中累积，定时刷盘。与命中缓冲一样，刷盘失败时数据退回缓冲区。

use chrono::{Timelike, Utc};
use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicI64, AtomicU64, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

/// 单个 (date, hour) 桶的增量，刷盘单位
#[derive(Debug, Clone)]
pub struct UsageDelta {
    /// UTC 日期，"YYYY-MM-DD"
    pub date: String,
    /// UTC 小时，0..=23
    pub hour: i32,
    pub requests: i64,
    pub redirects: i64,
    pub errors: i64,
    pub rate_limited: i64,
    /// 本批请求的响应时间总和（毫秒）。除以 requests 即本批均值。
    pub response_ms_sum: f64,
}

/// 用量统计 Sink
#[async_trait::async_trait]
pub trait UsageSink: Send + Sync {
    async fn flush_usage(&self, deltas: Vec<UsageDelta>) -> anyhow::Result<()>;
}

#[derive(Default)]
struct UsageBucket {
    requests: AtomicI64,
    redirects: AtomicI64,
    errors: AtomicI64,
    rate_limited: AtomicI64,
    /// 响应时间总和（微秒），flush 时转毫秒
    response_us_sum: AtomicU64,
}

struct UsageBuffer {
    buckets: DashMap<(String, i32), UsageBucket>,
    flush_lock: Mutex<()>,
}

impl UsageBuffer {
    fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            flush_lock: Mutex::new(()),
        }
    }

    fn drain(&self) -> Vec<UsageDelta> {
        let keys: Vec<(String, i32)> = self.buckets.iter().map(|r| r.key().clone()).collect();

        let mut deltas = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(((date, hour), bucket)) = self.buckets.remove(&key) {
                deltas.push(UsageDelta {
                    date,
                    hour,
                    requests: bucket.requests.load(Ordering::Relaxed),
                    redirects: bucket.redirects.load(Ordering::Relaxed),
                    errors: bucket.errors.load(Ordering::Relaxed),
                    rate_limited: bucket.rate_limited.load(Ordering::Relaxed),
                    response_ms_sum: bucket.response_us_sum.load(Ordering::Relaxed) as f64
                        / 1000.0,
                });
            }
        }
        deltas
    }

    fn restore(&self, deltas: Vec<UsageDelta>) {
        for delta in deltas {
            let bucket = self
                .buckets
                .entry((delta.date, delta.hour))
                .or_default();
            bucket.requests.fetch_add(delta.requests, Ordering::Relaxed);
            bucket
                .redirects
                .fetch_add(delta.redirects, Ordering::Relaxed);
            bucket.errors.fetch_add(delta.errors, Ordering::Relaxed);
            bucket
                .rate_limited
                .fetch_add(delta.rate_limited, Ordering::Relaxed);
            bucket.response_us_sum.fetch_add(
                (delta.response_ms_sum * 1000.0) as u64,
                Ordering::Relaxed,
            );
        }
    }
}

/// 用量统计记录器
#[derive(Clone)]
pub struct UsageRecorder {
    buffer: Arc<UsageBuffer>,
    sink: Arc<dyn UsageSink>,
    flush_interval: Duration,
}

impl UsageRecorder {
    pub fn new(sink: Arc<dyn UsageSink>, flush_interval: Duration) -> Self {
        Self {
            buffer: Arc::new(UsageBuffer::new()),
            sink,
            flush_interval,
        }
    }

    fn current_key() -> (String, i32) {
        let now = Utc::now();
        (now.format("%Y-%m-%d").to_string(), now.hour() as i32)
    }

    fn with_current_bucket(&self, f: impl FnOnce(&UsageBucket)) {
        let entry = self.buffer.buckets.entry(Self::current_key()).or_default();
        f(entry.value());
    }

    /// 记录一次请求及其响应耗时
    pub fn record_request(&self, response_time: std::time::Duration) {
        self.with_current_bucket(|bucket| {
            bucket.requests.fetch_add(1, Ordering::Relaxed);
            bucket
                .response_us_sum
                .fetch_add(response_time.as_micros() as u64, Ordering::Relaxed);
        });
        trace!("UsageRecorder: request recorded");
    }

    /// 记录一次成功跳转
    pub fn record_redirect(&self) {
        self.with_current_bucket(|bucket| {
            bucket.redirects.fetch_add(1, Ordering::Relaxed);
        });
    }

    /// 记录一次 5xx 错误
    pub fn record_error(&self) {
        self.with_current_bucket(|bucket| {
            bucket.errors.fetch_add(1, Ordering::Relaxed);
        });
    }

    /// 记录一次限流拒绝
    pub fn record_rate_limited(&self) {
        self.with_current_bucket(|bucket| {
            bucket.rate_limited.fetch_add(1, Ordering::Relaxed);
        });
    }

    /// 启动后台刷盘任务（作为异步方法运行）
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            debug!("UsageRecorder: Triggering scheduled flush");
            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                Self::flush_buffer(&self.buffer, &self.sink).await;
            } else {
                trace!("UsageRecorder: flush already in progress, skipping");
            }
        }
    }

    /// 手动触发刷盘（阻塞直到完成）
    pub async fn flush(&self) {
        debug!("UsageRecorder: Manual flush triggered");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink).await;
    }

    async fn flush_buffer(buffer: &UsageBuffer, sink: &Arc<dyn UsageSink>) {
        let deltas = buffer.drain();

        if deltas.is_empty() {
            trace!("UsageRecorder: Nothing to flush");
            return;
        }

        let count = deltas.len();
        match sink.flush_usage(deltas.clone()).await {
            Ok(_) => {
                debug!("UsageRecorder: Successfully flushed {} buckets", count);
            }
            Err(e) => {
                buffer.restore(deltas);
                warn!(
                    "UsageRecorder: flush_usage failed: {}, {} buckets restored to buffer",
                    e, count
                );
            }
        }
    }

    /// 缓冲区中未刷盘的桶数量（用于监控）
    pub fn pending_buckets(&self) -> usize {
        self.buffer.buckets.len()
    }
}
