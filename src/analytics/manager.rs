//! 命中统计管理器
//!
//! 负责收集和刷新跳转命中计数，支持：
//! - 高并发计数（使用 DashMap）
//! - 定时刷盘到存储后端
//! - 阈值触发刷盘

use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::analytics::HitSink;

/// 命中缓冲区状态，封装所有可变状态
struct HitBuffer {
    /// 命中计数缓冲区（使用 Arc<str> 减少克隆开销）
    data: DashMap<Arc<str>, usize>,
    /// 缓冲区中的总命中数（用于阈值判断）
    total_hits: AtomicUsize,
    /// 刷盘锁，防止并发刷盘
    flush_lock: Mutex<()>,
    /// 是否有 flush 任务待处理（防止重复 spawn）
    flush_pending: AtomicBool,
}

impl HitBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            total_hits: AtomicUsize::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    /// 增加命中计数
    fn increment(&self, key: &str) -> usize {
        // 先尝试 get_mut 更新已存在的 key（无 Arc 分配）
        // 高并发下大多数请求命中热点 key，可显著减少分配开销
        if let Some(mut entry) = self.data.get_mut(key) {
            *entry += 1;
        } else {
            // 只有新 key 才需要分配 Arc
            // 注意：这里有 TOCTOU 窗口，最坏情况只是多分配一次 Arc
            self.data
                .entry(Arc::from(key))
                .and_modify(|v| *v += 1)
                .or_insert(1);
        }
        trace!("HitBuffer: Incremented key: {}", key);

        self.total_hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 收集所有更新并清空缓冲区（逐个 remove 避免竞态）
    fn drain(&self) -> Vec<(String, usize)> {
        // 1. 收集所有 key（snapshot）
        let keys: Vec<Arc<str>> = self.data.iter().map(|r| r.key().clone()).collect();

        // 2. 逐个 remove（只删除 snapshot 中的 key，不影响窗口期新增）
        let mut updates = Vec::with_capacity(keys.len());
        let mut total_removed = 0;
        for key in keys {
            if let Some((k, v)) = self.data.remove(&key) {
                total_removed += v;
                updates.push((k.to_string(), v));
            }
        }

        // 3. 更新总计数
        if total_removed > 0 {
            self.total_hits
                .fetch_update(Ordering::Release, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(total_removed))
                })
                .ok();
        }

        updates
    }

    /// 恢复数据到缓冲区（用于刷盘失败时的恢复）
    fn restore(&self, updates: Vec<(String, usize)>) {
        let mut restored_total = 0;
        for (k, v) in updates {
            *self.data.entry(Arc::from(k.as_str())).or_insert(0) += v;
            restored_total += v;
        }
        self.total_hits.fetch_add(restored_total, Ordering::Relaxed);
    }

    /// 获取当前缓冲区总命中数
    fn total(&self) -> usize {
        self.total_hits.load(Ordering::Relaxed)
    }
}

/// 命中管理器
///
/// 负责收集命中计数并定期刷盘到存储后端。
/// 状态完全封装在结构体内部，便于测试和多实例使用。
#[derive(Clone)]
pub struct HitManager {
    /// 命中缓冲区（共享所有权）
    buffer: Arc<HitBuffer>,
    /// 存储后端
    sink: Arc<dyn HitSink>,
    /// 刷盘间隔
    flush_interval: Duration,
    /// 触发刷盘的最大命中数
    max_hits_before_flush: usize,
}

impl HitManager {
    pub fn new(
        sink: Arc<dyn HitSink>,
        flush_interval: Duration,
        max_hits_before_flush: usize,
    ) -> Self {
        Self {
            buffer: Arc::new(HitBuffer::new()),
            sink,
            flush_interval,
            max_hits_before_flush,
        }
    }

    /// 增加命中计数（线程安全，无锁）
    pub fn increment(&self, key: &str) {
        let current_size = self.buffer.increment(key);
        trace!("HitManager: Current buffer size: {}", current_size);

        // 检查是否达到阈值，尝试触发刷盘
        if current_size >= self.max_hits_before_flush {
            // 使用 compare_exchange 防止任务风暴：
            // 只有成功将 flush_pending 从 false 设为 true 的线程才 spawn
            if self
                .buffer
                .flush_pending
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                let buffer = Arc::clone(&self.buffer);
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    if let Ok(_guard) = buffer.flush_lock.try_lock() {
                        Self::flush_buffer(&buffer, &sink).await;
                    } else {
                        trace!("HitManager: flush already in progress, skipping");
                    }
                    // 无论成功与否都重置标志，允许下次触发
                    buffer.flush_pending.store(false, Ordering::Release);
                });
            }
        }
    }

    /// 启动后台刷盘任务（作为异步方法运行）
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            debug!("HitManager: Triggering scheduled flush");
            // 定期触发刷盘
            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                trace!("HitManager: Starting scheduled flush");
                Self::flush_buffer(&self.buffer, &self.sink).await;
            } else {
                trace!("HitManager: flush already in progress, skipping scheduled flush");
            }
        }
    }

    /// 手动触发刷盘（阻塞直到完成）
    pub async fn flush(&self) {
        debug!("HitManager: Manual flush triggered");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink).await;
    }

    /// 执行实际的刷盘操作
    async fn flush_buffer(buffer: &HitBuffer, sink: &Arc<dyn HitSink>) {
        let updates = buffer.drain();

        if updates.is_empty() {
            trace!("HitManager: No hits to flush");
            return;
        }

        let count = updates.len();
        match sink.flush_hits(updates.clone()).await {
            Ok(_) => {
                debug!("HitManager: Successfully flushed {} entries", count);
            }
            Err(e) => {
                // 刷盘失败，恢复数据到 buffer
                buffer.restore(updates);
                warn!(
                    "HitManager: flush_hits failed: {}, {} entries restored to buffer",
                    e, count
                );
            }
        }
    }

    /// 获取当前缓冲区总命中数（用于监控）
    pub fn buffer_size(&self) -> usize {
        self.buffer.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct MockSink {
        flushed: std::sync::Mutex<Vec<(String, usize)>>,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                flushed: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn get_flushed(&self) -> Vec<(String, usize)> {
            self.flushed.lock().unwrap().clone()
        }

        fn total_hits(&self) -> usize {
            self.flushed.lock().unwrap().iter().map(|(_, v)| v).sum()
        }
    }

    #[async_trait]
    impl HitSink for MockSink {
        async fn flush_hits(&self, updates: Vec<(String, usize)>) -> anyhow::Result<()> {
            self.flushed.lock().unwrap().extend(updates);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_increment_and_flush() {
        let sink = Arc::new(MockSink::new());
        let manager = HitManager::new(
            Arc::clone(&sink) as Arc<dyn HitSink>,
            Duration::from_secs(60),
            100,
        );

        manager.increment("link1");
        manager.increment("link1");
        manager.increment("link2");

        // buffer_size() 返回总命中数，不是唯一 key 数量
        assert_eq!(manager.buffer_size(), 3);

        manager.flush().await;

        assert_eq!(manager.buffer_size(), 0);
        let flushed = sink.get_flushed();
        assert_eq!(flushed.len(), 2); // 2 个唯一 key
    }

    /// 测试并发 increment 不会丢失命中
    #[tokio::test]
    async fn test_concurrent_increment() {
        let sink = Arc::new(MockSink::new());
        let manager = Arc::new(HitManager::new(
            Arc::clone(&sink) as Arc<dyn HitSink>,
            Duration::from_secs(60),
            100000, // 高阈值，避免自动刷盘
        ));

        const NUM_TASKS: usize = 10;
        const INCREMENTS_PER_TASK: usize = 1000;

        let mut handles = vec![];
        for _ in 0..NUM_TASKS {
            let mgr = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                for _ in 0..INCREMENTS_PER_TASK {
                    mgr.increment("shared_key");
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // 验证 buffer 中的计数正确
        assert_eq!(manager.buffer_size(), NUM_TASKS * INCREMENTS_PER_TASK);

        manager.flush().await;

        // 验证刷盘后的数据正确
        assert_eq!(sink.total_hits(), NUM_TASKS * INCREMENTS_PER_TASK);
    }

    /// 测试并发 increment + drain 不会丢失数据
    #[tokio::test]
    async fn test_concurrent_increment_and_drain() {
        let sink = Arc::new(MockSink::new());
        let manager = Arc::new(HitManager::new(
            Arc::clone(&sink) as Arc<dyn HitSink>,
            Duration::from_secs(60),
            100000, // 高阈值，避免自动刷盘
        ));

        const NUM_TASKS: usize = 10;
        const INCREMENTS_PER_TASK: usize = 1000;
        const NUM_FLUSHES: usize = 5;

        // 启动 increment 任务
        let mut handles = vec![];
        for _ in 0..NUM_TASKS {
            let mgr = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                for _ in 0..INCREMENTS_PER_TASK {
                    mgr.increment("shared_key");
                    // 偶尔 yield，增加与 drain 交错的机会
                    if rand::random::<u8>() < 10 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }

        // 启动 flush 任务
        let mgr_flush = Arc::clone(&manager);
        let flush_handle = tokio::spawn(async move {
            for _ in 0..NUM_FLUSHES {
                tokio::time::sleep(Duration::from_millis(10)).await;
                mgr_flush.flush().await;
            }
        });

        // 等待所有 increment 完成
        for handle in handles {
            handle.await.unwrap();
        }
        flush_handle.await.unwrap();

        // 最后一次 flush 确保所有数据都写入
        manager.flush().await;

        // 验证总命中数 = 已刷盘 + buffer 中剩余
        let flushed = sink.total_hits();
        let remaining = manager.buffer_size();
        assert_eq!(
            flushed + remaining,
            NUM_TASKS * INCREMENTS_PER_TASK,
            "flushed={}, remaining={}, expected={}",
            flushed,
            remaining,
            NUM_TASKS * INCREMENTS_PER_TASK
        );
    }

    /// 测试刷盘失败时数据不丢失
    #[tokio::test]
    async fn test_flush_failure_restores_buffer() {
        struct FailingSink;

        #[async_trait]
        impl HitSink for FailingSink {
            async fn flush_hits(&self, _updates: Vec<(String, usize)>) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("sink unavailable"))
            }
        }

        let manager = HitManager::new(Arc::new(FailingSink), Duration::from_secs(60), 100);

        manager.increment("link1");
        manager.increment("link1");
        manager.increment("link2");

        manager.flush().await;

        // 刷盘失败后数据应该还在缓冲区里
        assert_eq!(manager.buffer_size(), 3);
    }
}
