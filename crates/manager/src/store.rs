use crate::{ManagerError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreScope {
    #[default]
    Workspace,
    Global,
}

impl StoreScope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Async key/value persistence, scoped per workspace or globally.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, scope: StoreScope, key: &str) -> Result<Option<Value>>;
    async fn set(&self, scope: StoreScope, key: &str, value: Value) -> Result<()>;
    async fn clear(&self, scope: StoreScope, key: &str) -> Result<()>;
}

pub async fn load<T: DeserializeOwned>(
    store: &dyn Store,
    scope: StoreScope,
    key: &str,
) -> Result<Option<T>> {
    match store.get(scope, key).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

pub async fn save<T: Serialize>(
    store: &dyn Store,
    scope: StoreScope,
    key: &str,
    value: &T,
) -> Result<()> {
    store.set(scope, key, serde_json::to_value(value)?).await
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(StoreScope, String), Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, scope: StoreScope, key: &str) -> Result<Option<Value>> {
        Ok(self
            .entries
            .lock()
            .await
            .get(&(scope, key.to_string()))
            .cloned())
    }

    async fn set(&self, scope: StoreScope, key: &str, value: Value) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert((scope, key.to_string()), value);
        Ok(())
    }

    async fn clear(&self, scope: StoreScope, key: &str) -> Result<()> {
        self.entries.lock().await.remove(&(scope, key.to_string()));
        Ok(())
    }
}

/// One pretty-printed JSON file per key under `<root>/<scope>/`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, scope: StoreScope, key: &str) -> Result<PathBuf> {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if file_name.is_empty() || file_name.chars().all(|c| c == '.') {
            return Err(ManagerError::Store(format!("invalid store key {key:?}")));
        }
        Ok(self
            .root
            .join(scope.as_str())
            .join(format!("{file_name}.json")))
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn get(&self, scope: StoreScope, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(scope, key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn set(&self, scope: StoreScope, key: &str, value: Value) -> Result<()> {
        let path = self.path_for(scope, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(&value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn clear(&self, scope: StoreScope, key: &str) -> Result<()> {
        let path = self.path_for(scope, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
