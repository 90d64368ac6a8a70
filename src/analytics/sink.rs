/// 命中计数 Sink（聚合模式）
///
/// updates 中每个元素是 (link_id, 缓冲期间累计的命中数)。
#[async_trait::async_trait]
pub trait HitSink: Send + Sync {
    async fn flush_hits(&self, updates: Vec<(String, usize)>) -> anyhow::Result<()>;
}
