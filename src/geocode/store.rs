use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

/// Prefix of the keys a [`FileStore`] writes, so the file can be shared
/// with other session data.
pub const SESSION_KEY_PREFIX: &str = "geo_";

/// One tier of the place-name cache: rounded coordinate key → place.
///
/// Entries are never evicted; writing an existing key replaces it.
#[async_trait]
pub trait GeoStore: Send + Sync {
    async fn get(&self, key: &str) -> crate::Result<Option<String>>;

    async fn put(&self, key: &str, place: &str) -> crate::Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Process-lifetime tier.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl GeoStore for MemoryStore {
    async fn get(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, place: &str) -> crate::Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), place.to_owned());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Session tier persisted as a flat JSON object in a file.
///
/// The whole object is loaded on open and rewritten on every `put`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`; a missing file is an empty store.
    #[tracing::instrument(skip_all)]
    pub async fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        let entries: HashMap<String, String> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(?path, entries = entries.len(), "session cache loaded");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

}

#[async_trait]
impl GeoStore for FileStore {
    async fn get(&self, key: &str) -> crate::Result<Option<String>> {
        let key = format!("{SESSION_KEY_PREFIX}{key}");
        Ok(self.entries.lock().await.get(&key).cloned())
    }

    async fn put(&self, key: &str, place: &str) -> crate::Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(format!("{SESSION_KEY_PREFIX}{key}"), place.to_owned());

        // written under the lock so concurrent puts can't interleave
        let json = serde_json::to_vec_pretty(&*entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "session"
    }
}

/// Ordered cache tiers, fastest first.
///
/// A hit in a slower tier is copied into the faster ones; `put` writes all
/// tiers. A failing tier is logged and skipped, it never fails the chain.
#[derive(Clone)]
pub struct CacheChain {
    tiers: Vec<Arc<dyn GeoStore>>,
}

impl std::fmt::Debug for CacheChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tiers.iter().map(|t| t.name()))
            .finish()
    }
}

impl CacheChain {
    pub fn new(tiers: Vec<Arc<dyn GeoStore>>) -> Self {
        Self { tiers }
    }

    /// Memory tier in front of a session tier.
    pub fn two_tier(memory: Arc<dyn GeoStore>, session: Arc<dyn GeoStore>) -> Self {
        Self::new(vec![memory, session])
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        for (i, tier) in self.tiers.iter().enumerate() {
            let place = match tier.get(key).await {
                Ok(Some(place)) => place,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(tier = tier.name(), key, ?e, "cache read failed");
                    continue;
                }
            };

            tracing::debug!(tier = tier.name(), key, "cache hit");
            for faster in &self.tiers[..i] {
                if let Err(e) = faster.put(key, &place).await {
                    tracing::warn!(tier = faster.name(), key, ?e, "cache backfill failed");
                }
            }
            return Some(place);
        }
        None
    }

    pub async fn put(&self, key: &str, place: &str) {
        for tier in &self.tiers {
            if let Err(e) = tier.put(key, place).await {
                tracing::warn!(tier = tier.name(), key, ?e, "cache write failed");
            }
        }
    }
}
