use async_trait::async_trait;

use crate::services::{KeyValueStore, KvError};
use crate::store::{Store, StoreError};

impl Store {
    pub fn get_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        let Some(raw) = self.kv.get(key.as_bytes())? else {
            return Ok(None);
        };
        String::from_utf8(raw.to_vec())
            .map(Some)
            .map_err(|_| StoreError::InvalidUtf8 {
                key: key.to_string(),
            })
    }

    pub fn set_text(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.kv.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for Store {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.get_text(key).map_err(|e| KvError(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.set_text(key, value).map_err(|e| KvError(e.to_string()))
    }
}
