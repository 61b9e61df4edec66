//! In-memory organization cache with TTL
//!
//! Caches slug-to-organization lookups so tenant pages don't hit the
//! directory on every request. Memberships are never cached.

use async_trait::async_trait;
use orgpress_shared::{Membership, OrgId, Organization};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::{DirectoryError, OrganizationDirectory};

/// Default cache TTL (5 minutes)
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default entry limit; negative entries are not added beyond it
const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Clone)]
struct CacheEntry {
    org: Option<Organization>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(org: Option<Organization>, ttl: Duration) -> Self {
        Self {
            org,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe slug -> organization cache
pub struct OrgCache {
    /// `None` entries record slugs the directory doesn't know
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for OrgCache {
    fn default() -> Self {
        Self::new()
    }
}

impl OrgCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Get the cached lookup for a slug
    /// Returns Some(Some(org)) if found and valid
    /// Returns Some(None) if the slug was cached as unknown
    /// Returns None if not in cache or expired
    pub fn get(&self, slug: &str) -> Option<Option<Organization>> {
        let cache = self.cache.read().ok()?;
        let entry = cache.get(slug)?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.org.clone())
        }
    }

    pub fn set(&self, slug: &str, org: Option<Organization>) {
        let Ok(mut cache) = self.cache.write() else {
            return;
        };

        // Unknown slugs come from client-chosen subdomains
        if org.is_none() && !cache.contains_key(slug) && cache.len() >= self.max_entries {
            cache.retain(|_, entry| !entry.is_expired());
            if cache.len() >= self.max_entries {
                tracing::debug!(slug = %slug, "Organization cache full, not caching unknown slug");
                return;
            }
        }

        cache.insert(slug.to_string(), CacheEntry::new(org, self.ttl));
    }

    /// Clear expired entries (call periodically for memory management)
    pub fn cleanup(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, entry| !entry.is_expired());
        }
    }

    pub fn stats(&self) -> CacheStats {
        if let Ok(cache) = self.cache.read() {
            let total = cache.len();
            let expired = cache.values().filter(|e| e.is_expired()).count();
            CacheStats {
                total_entries: total,
                expired_entries: expired,
                active_entries: total - expired,
            }
        } else {
            CacheStats::default()
        }
    }
}

#[derive(Default, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Directory decorator that caches slug lookups
#[derive(Clone)]
pub struct CachedDirectory {
    inner: Arc<dyn OrganizationDirectory>,
    cache: Arc<OrgCache>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn OrganizationDirectory>, cache: Arc<OrgCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl OrganizationDirectory for CachedDirectory {
    async fn organization_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Organization>, DirectoryError> {
        if let Some(cached) = self.cache.get(slug) {
            tracing::trace!(slug = %slug, hit = cached.is_some(), "Organization cache hit");
            return Ok(cached);
        }

        // Errors are not cached so the next request retries the directory
        let org = self.inner.organization_by_slug(slug).await?;
        self.cache.set(slug, org.clone());
        Ok(org)
    }

    async fn memberships(&self, org_id: &OrgId) -> Result<Vec<Membership>, DirectoryError> {
        self.inner.memberships(org_id).await
    }
}
