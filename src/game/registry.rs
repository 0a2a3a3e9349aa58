use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};

use crate::constants::ANONYMOUS_PLAYER;
use crate::game::progression::spawn_progression_ticker;
use crate::game::ranker::{rank_user_activity, RankLimits};
use crate::game::session::{GameDeps, GameSession};
use crate::services::ActivitySource;

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Live sessions keyed by player. Each session has its own lock, so
/// transitions on one session never run concurrently.
pub struct SessionRegistry {
    deps: GameDeps,
    activity: Arc<dyn ActivitySource>,
    limits: RankLimits,
    tick: Duration,
    sessions: Mutex<HashMap<String, SharedSession>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SessionRegistry {
    pub fn new(
        deps: GameDeps,
        activity: Arc<dyn ActivitySource>,
        limits: RankLimits,
        tick: Duration,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            deps,
            activity,
            limits,
            tick,
            sessions: Mutex::new(HashMap::new()),
            shutdown_tx,
        }
    }

    pub async fn get(&self, player: Option<&str>) -> Option<SharedSession> {
        let key = player.unwrap_or(ANONYMOUS_PLAYER);
        self.sessions.lock().await.get(key).cloned()
    }

    /// Returns the player's session, starting a new one on first use.
    ///
    /// Ranking and the initial draw happen outside the registry lock; if two
    /// requests race, the first inserted session wins.
    pub async fn get_or_start(&self, player: Option<&str>) -> SharedSession {
        if let Some(existing) = self.get(player).await {
            return existing;
        }

        let ranked = match player {
            Some(user) => rank_user_activity(self.activity.as_ref(), user, self.limits).await,
            None => Vec::new(),
        };
        let mut session = GameSession::new(player.map(str::to_string), ranked, self.deps.clone());
        if !session.initialize().await {
            tracing::warn!(player = ?player, "Session started without a pair");
        }

        let key = player.unwrap_or(ANONYMOUS_PLAYER).to_string();
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(&key) {
            return existing.clone();
        }

        let shared = Arc::new(Mutex::new(session));
        spawn_progression_ticker(Arc::downgrade(&shared), self.tick, self.shutdown_tx.subscribe());
        sessions.insert(key.clone(), shared.clone());
        tracing::info!(player = %key, active = sessions.len(), "Session started");
        shared
    }

    /// Drops sessions idle for longer than `max_idle`. Busy sessions are kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(max_idle).unwrap_or_else(|_| chrono::Duration::zero());
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();

        sessions.retain(|_, session| {
            session
                .try_lock()
                .map_or(true, |guard| guard.last_active_at() > cutoff)
        });

        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
