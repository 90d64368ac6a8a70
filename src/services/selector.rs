//! Weighted redirect selection
//!
//! Picks one link from the active set per request, with probability
//! proportional to its weight share. Every call reads a fresh snapshot of
//! the active set; concurrent mutations only affect later draws.

use std::sync::Arc;

use rand::RngExt;
use tracing::debug;

use crate::analytics::get_hit_manager;
use crate::config::get_config;
use crate::errors::{OutlinkerError, Result};
use crate::storage::{RedirectLink, SeaOrmStorage};

/// Weighted random selector over the active link set
pub struct WeightedSelector {
    storage: Arc<SeaOrmStorage>,
}

impl WeightedSelector {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Select one active link, weighted by its share of the total weight.
    ///
    /// The hit count update goes through the buffered manager and never
    /// blocks the caller. Fails with `NoActiveLinks` when the active set
    /// is empty.
    pub async fn select(&self) -> Result<RedirectLink> {
        let links = self.storage.load_active_links().await?;

        let link = pick_weighted(&links)
            .ok_or_else(|| OutlinkerError::no_active_links("No active redirect links available"))?
            .clone();

        if get_config().analytics.enable_hit_tracking
            && let Some(manager) = get_hit_manager()
        {
            manager.increment(&link.id);
        }

        debug!("Selector: picked '{}' -> {}", link.id, link.url);
        Ok(link)
    }
}

/// Draw a uniform point in `[0, total_weight)` and map it onto the list.
///
/// `links` must already be in the storage ordering (weight descending,
/// created_at ascending, id ascending) so that a given draw always lands
/// on the same link regardless of when the snapshot was taken.
pub fn pick_weighted(links: &[RedirectLink]) -> Option<&RedirectLink> {
    if links.is_empty() {
        return None;
    }

    let total: f64 = links.iter().map(|l| f64::from(l.weight)).sum();
    if total <= 0.0 {
        // weight 由校验层保证 >= 1，总和非正只可能来自手工改库
        return links.last();
    }

    pick_at(links, rand::rng().random_range(0.0..total))
}

/// Walk the list subtracting each weight from `point`; the first link that
/// drives the remainder to zero or below is the pick. Out-of-range points
/// fall back to the last link.
fn pick_at(links: &[RedirectLink], mut point: f64) -> Option<&RedirectLink> {
    for link in links {
        point -= f64::from(link.weight);
        if point <= 0.0 {
            return Some(link);
        }
    }
    links.last()
}
