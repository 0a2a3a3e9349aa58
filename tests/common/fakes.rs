use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use up_or_down::game::types::{Entity, UserAction};
use up_or_down::services::{
    ActivityError, ActivitySource, EntityLookup, KeyValueStore, KvError, LookupError,
};

/// Lookup backed by a fixed name → subscribers table. Unknown names fail.
#[derive(Default)]
pub struct TableLookup {
    counts: HashMap<String, u64>,
    calls: AtomicUsize,
}

impl TableLookup {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self {
            counts: entries
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityLookup for TableLookup {
    async fn entity_info(&self, name: &str) -> Result<Entity, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.counts
            .get(name)
            .map(|count| Entity::new(name, *count))
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }
}

/// Activity source returning canned posts and comments, or failing.
#[derive(Default)]
pub struct CannedActivity {
    pub posts: Vec<UserAction>,
    pub comments: Vec<UserAction>,
    pub fail: bool,
}

#[async_trait]
impl ActivitySource for CannedActivity {
    async fn recent_posts(&self, _user: &str, limit: usize) -> Result<Vec<UserAction>, ActivityError> {
        if self.fail {
            return Err(ActivityError::Unavailable("offline".to_string()));
        }
        Ok(self.posts.iter().take(limit).cloned().collect())
    }

    async fn recent_comments(
        &self,
        _user: &str,
        limit: usize,
    ) -> Result<Vec<UserAction>, ActivityError> {
        if self.fail {
            return Err(ActivityError::Unavailable("offline".to_string()));
        }
        Ok(self.comments.iter().take(limit).cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryKv {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.seed(key, value);
        Ok(())
    }
}
