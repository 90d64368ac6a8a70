//! Visitor tracking service
//!
//! Ingests the session, event and conversion signals coming from the
//! public tracking endpoints. Read-side dashboard queries live in
//! `AnalyticsService`.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::errors::{OutlinkerError, Result};
use crate::storage::SeaOrmStorage;

/// Incoming session registration
#[derive(Debug, Clone, Default)]
pub struct SessionInput {
    /// Client-held session id; generated server-side when absent
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of a session registration
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session_id: String,
    /// false when the session already existed and was only refreshed
    pub created: bool,
}

/// Service for visitor tracking ingestion
pub struct TrackingService {
    storage: Arc<SeaOrmStorage>,
}

impl TrackingService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Register a visitor session, or refresh its last-seen time when the
    /// id is already known.
    pub async fn record_session(&self, input: SessionInput) -> Result<SessionRecord> {
        let session_id = input
            .session_id
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let source = derive_source(input.landing_page.as_deref(), input.referrer.as_deref());

        let created = self
            .storage
            .upsert_session(
                &session_id,
                input.referrer,
                input.landing_page,
                input.user_agent,
                Some(source),
            )
            .await
            .map_err(|e| {
                OutlinkerError::database_operation(format!("Session upsert failed: {}", e))
            })?;

        if created {
            debug!("Tracking: new session '{}'", session_id);
        }

        Ok(SessionRecord {
            session_id,
            created,
        })
    }

    /// Append a visitor event. The JSON payload is stored as text.
    pub async fn record_event(
        &self,
        session_id: &str,
        event_type: &str,
        event_data: Option<serde_json::Value>,
        link_id: Option<String>,
    ) -> Result<()> {
        let payload = event_data.map(|v| serde_json::to_string(&v)).transpose()?;

        self.storage
            .insert_event(session_id, event_type, payload, link_id)
            .await
            .map_err(|e| {
                OutlinkerError::database_operation(format!("Event insert failed: {}", e))
            })?;

        debug!(
            "Tracking: event '{}' recorded for session '{}'",
            event_type, session_id
        );
        Ok(())
    }

    /// Mark a session converted, attributing the link that drove it.
    ///
    /// Returns false when the session id is unknown.
    pub async fn mark_conversion(&self, session_id: &str, link_id: &str) -> Result<bool> {
        let marked = self
            .storage
            .mark_conversion(session_id, link_id)
            .await
            .map_err(|e| {
                OutlinkerError::database_operation(format!("Conversion update failed: {}", e))
            })?;

        if marked {
            info!(
                "Tracking: session '{}' converted via '{}'",
                session_id, link_id
            );
        }
        Ok(marked)
    }
}

/// Traffic source for a session, in priority order: `utm_source` on the
/// landing page, then the referrer domain as `ref:{domain}`, else `direct`.
fn derive_source(landing_page: Option<&str>, referrer: Option<&str>) -> String {
    if let Some(page) = landing_page
        && let Some((_, query)) = page.split_once('?')
        && let Some(utm) = extract_query_param(query, "utm_source")
        && !utm.is_empty()
    {
        return utm.into_owned();
    }

    if let Some(raw) = referrer
        && let Some(domain) = Url::parse(raw).ok().and_then(|u| u.host_str().map(str::to_owned))
    {
        return format!("ref:{}", domain);
    }

    "direct".to_string()
}

/// 从 query string 提取指定参数值
///
/// 落地页以相对路径上报，`Url::parse` 解析不了，这里直接扫字符串。
fn extract_query_param<'a>(query: &'a str, key: &str) -> Option<Cow<'a, str>> {
    for part in query.split('&') {
        if let Some(value) = part.strip_prefix(key).and_then(|s| s.strip_prefix('=')) {
            return urlencoding::decode(value).ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_source_wins_over_referrer() {
        let source = derive_source(
            Some("/landing?utm_source=telegram&x=1"),
            Some("https://news.ycombinator.com/item"),
        );
        assert_eq!(source, "telegram");
    }

    #[test]
    fn test_encoded_utm_source_is_decoded() {
        let source = derive_source(Some("/go?utm_source=my%20campaign"), None);
        assert_eq!(source, "my campaign");
    }

    #[test]
    fn test_referrer_domain_fallback() {
        let source = derive_source(Some("/landing"), Some("https://t.me/somechannel"));
        assert_eq!(source, "ref:t.me");
    }

    #[test]
    fn test_direct_when_nothing_known() {
        assert_eq!(derive_source(None, None), "direct");
        assert_eq!(derive_source(Some("/landing"), Some("not a url")), "direct");
    }

    #[test]
    fn test_query_param_key_must_match_exactly() {
        assert!(extract_query_param("utm_sourcex=1", "utm_source").is_none());
        assert_eq!(
            extract_query_param("a=1&utm_source=tg", "utm_source").as_deref(),
            Some("tg")
        );
    }
}
