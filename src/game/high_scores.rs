use serde::Serialize;

use crate::services::KeyValueStore;
use crate::store::keys;

/// Personal and global bests as known to one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScores {
    pub personal: u32,
    pub global: u32,
}

impl HighScores {
    /// 仅在重开一局时调用，保证结算界面仍能展示“新纪录”
    pub fn raise(&mut self, score: u32) {
        self.personal = self.personal.max(score);
        self.global = self.global.max(score);
    }
}

fn parse_score(raw: Option<String>) -> u32 {
    raw.and_then(|text| text.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

async fn read_score(kv: &dyn KeyValueStore, key: &str) -> u32 {
    match kv.get(key).await {
        Ok(raw) => parse_score(raw),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read high score");
            0
        }
    }
}

/// Loads both bests. Anonymous players start from zero and never read.
pub async fn load(kv: &dyn KeyValueStore, user_id: Option<&str>) -> HighScores {
    let Some(user_id) = user_id else {
        return HighScores::default();
    };

    let personal_key = keys::high_score_key(user_id);
    let (personal, global) = tokio::join!(
        read_score(kv, &personal_key),
        read_score(kv, keys::GLOBAL_HIGH_SCORE_KEY),
    );
    HighScores { personal, global }
}

async fn raise_stored(kv: &dyn KeyValueStore, key: &str, score: u32) {
    let current = read_score(kv, key).await;
    if score <= current {
        return;
    }
    match kv.set(key, &score.to_string()).await {
        Ok(()) => tracing::info!(key, score, previous = current, "High score updated"),
        Err(e) => tracing::warn!(key, score, error = %e, "Failed to persist high score"),
    }
}

/// Best-effort write of a finished game's score; only ever raises stored values.
pub async fn persist(kv: &dyn KeyValueStore, user_id: Option<&str>, score: u32) {
    let Some(user_id) = user_id else {
        return;
    };

    raise_stored(kv, &keys::high_score_key(user_id), score).await;
    raise_stored(kv, keys::GLOBAL_HIGH_SCORE_KEY, score).await;
}
