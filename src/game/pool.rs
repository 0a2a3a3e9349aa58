//! 候选池：默认社区 ∪ 个性化社区，再剔除本局已出现的社区

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

const EMBEDDED_DEFAULTS: &str = include_str!("../../data/default_communities.json");

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read default pool file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid default pool document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("default pool is empty")]
    Empty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolDocument {
    default_communities: Vec<String>,
}

/// The fixed default communities, deduplicated in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultPool {
    names: Vec<String>,
}

impl DefaultPool {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(|name| Into::<String>::into(name).trim().to_string())
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    pub fn embedded() -> Result<Self, PoolError> {
        Self::from_json(EMBEDDED_DEFAULTS)
    }

    pub fn from_json(raw: &str) -> Result<Self, PoolError> {
        let doc: PoolDocument = serde_json::from_str(raw)?;
        let pool = Self::new(doc.default_communities);
        if pool.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(pool)
    }

    pub fn from_file(path: &Path) -> Result<Self, PoolError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Loads the override file when configured, otherwise the embedded list.
    pub fn load(path: Option<&str>) -> Result<Self, PoolError> {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => {
                let pool = Self::from_file(Path::new(path))?;
                tracing::info!(path, size = pool.len(), "Loaded default pool from file");
                Ok(pool)
            }
            None => Self::embedded(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn union(defaults: &DefaultPool, ranked: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(defaults.len() + ranked.len());
    defaults
        .names()
        .iter()
        .chain(ranked.iter())
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Defaults plus ranked names, minus everything already used this session.
pub fn build_available_pool(
    defaults: &DefaultPool,
    ranked: &[String],
    used: &HashSet<String>,
) -> Vec<String> {
    union(defaults, ranked)
        .into_iter()
        .filter(|name| !used.contains(name))
        .collect()
}

/// Same as [`build_available_pool`], but falls back to the unfiltered union
/// once every candidate has been used.
pub fn candidates_or_fallback(
    defaults: &DefaultPool,
    ranked: &[String],
    used: &HashSet<String>,
) -> Vec<String> {
    let available = build_available_pool(defaults, ranked, used);
    if !available.is_empty() {
        return available;
    }

    tracing::info!(used = used.len(), "Candidate pool exhausted, falling back to full pool");
    union(defaults, ranked)
}
