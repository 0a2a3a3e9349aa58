//! 会话状态机：Loading → Playing → Resolving → Playing | GameOver，GameOver 经重开回到 Playing

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::constants::DEFAULT_MAX_DRAW_ATTEMPTS;
use crate::game::high_scores::{self, HighScores};
use crate::game::pool::{candidates_or_fallback, DefaultPool};
use crate::game::selector::draw_random;
use crate::game::types::{DrawOutcome, Entity, GameState, Guess, Phase};
use crate::services::{EntityLookup, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("no round is waiting for a guess")]
    NotPlaying,
    #[error("the current game has not ended yet")]
    GameInProgress,
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct GameDeps {
    pub lookup: Arc<dyn EntityLookup>,
    pub kv: Arc<dyn KeyValueStore>,
    pub defaults: Arc<DefaultPool>,
    pub max_draw_attempts: usize,
}

impl GameDeps {
    pub fn new(
        lookup: Arc<dyn EntityLookup>,
        kv: Arc<dyn KeyValueStore>,
        defaults: Arc<DefaultPool>,
    ) -> Self {
        Self {
            lookup,
            kv,
            defaults,
            max_draw_attempts: DEFAULT_MAX_DRAW_ATTEMPTS,
        }
    }

    pub fn with_max_draw_attempts(mut self, attempts: usize) -> Self {
        self.max_draw_attempts = attempts;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessOutcome {
    pub correct: bool,
    pub score: u32,
    pub game_over: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverSummary {
    pub score: u32,
    pub personal_best: u32,
    pub global_best: u32,
    pub new_personal_best: bool,
    pub new_global_record: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub state: GameState,
    pub high_scores: HighScores,
    pub summary: Option<GameOverSummary>,
}

pub struct GameSession {
    player: Option<String>,
    deps: GameDeps,
    ranked: Vec<String>,
    state: GameState,
    used: HashSet<String>,
    high_scores: HighScores,
    should_progress: bool,
    rng: StdRng,
    last_active_at: DateTime<Utc>,
}

impl GameSession {
    /// `ranked` is the player's personalized list, fixed for the whole session.
    pub fn new(player: Option<String>, ranked: Vec<String>, deps: GameDeps) -> Self {
        Self::with_rng(player, ranked, deps, StdRng::from_entropy())
    }

    pub fn with_seed(player: Option<String>, ranked: Vec<String>, deps: GameDeps, seed: u64) -> Self {
        Self::with_rng(player, ranked, deps, StdRng::seed_from_u64(seed))
    }

    fn with_rng(player: Option<String>, ranked: Vec<String>, deps: GameDeps, rng: StdRng) -> Self {
        Self {
            player,
            deps,
            ranked,
            state: GameState::default(),
            used: HashSet::new(),
            high_scores: HighScores::default(),
            should_progress: false,
            rng,
            last_active_at: Utc::now(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn used(&self) -> &HashSet<String> {
        &self.used
    }

    pub fn ranked(&self) -> &[String] {
        &self.ranked
    }

    pub fn high_scores(&self) -> HighScores {
        self.high_scores
    }

    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    pub fn should_progress(&self) -> bool {
        self.should_progress
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    pub fn summary(&self) -> Option<GameOverSummary> {
        if !self.state.game_over {
            return None;
        }
        let score = self.state.score;
        Some(GameOverSummary {
            score,
            personal_best: score.max(self.high_scores.personal),
            global_best: score.max(self.high_scores.global),
            new_personal_best: score > self.high_scores.personal,
            new_global_record: score > self.high_scores.global,
        })
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase(),
            state: self.state.clone(),
            high_scores: self.high_scores,
            summary: self.summary(),
        }
    }

    fn candidates(&self) -> Vec<String> {
        candidates_or_fallback(&self.deps.defaults, &self.ranked, &self.used)
    }

    /// Draws two distinct entities; both draws run concurrently.
    async fn draw_pair(&mut self, personal: Vec<String>, pool: Vec<String>) -> Option<(Entity, Entity)> {
        let attempts = self.deps.max_draw_attempts;
        let lookup = self.deps.lookup.clone();
        let mut top_rng = StdRng::seed_from_u64(self.rng.gen());
        let mut bottom_rng = StdRng::seed_from_u64(self.rng.gen());

        let top_draw = async {
            if !personal.is_empty() {
                if let DrawOutcome::Found(entity) =
                    draw_random(lookup.as_ref(), &personal, attempts, &mut top_rng).await
                {
                    return DrawOutcome::Found(entity);
                }
            }
            draw_random(lookup.as_ref(), &pool, attempts, &mut top_rng).await
        };
        let bottom_draw = draw_random(lookup.as_ref(), &pool, attempts, &mut bottom_rng);

        let (top, bottom) = tokio::join!(top_draw, bottom_draw);
        let top = top.into_entity()?;
        let mut bottom = bottom.into_entity()?;

        if bottom.name == top.name {
            let rest: Vec<String> = pool.iter().filter(|n| **n != top.name).cloned().collect();
            bottom = draw_random(lookup.as_ref(), &rest, attempts, &mut bottom_rng)
                .await
                .into_entity()?;
            if bottom.name == top.name {
                return None;
            }
        }

        Some((top, bottom))
    }

    /// Loading → Playing. On failure the session stays stuck with no pair.
    pub async fn initialize(&mut self) -> bool {
        self.touch();
        self.high_scores = high_scores::load(self.deps.kv.as_ref(), self.player.as_deref()).await;

        let personal: Vec<String> = self
            .ranked
            .iter()
            .filter(|name| !self.used.contains(*name))
            .cloned()
            .collect();
        let pool = self.candidates();

        let Some((top, bottom)) = self.draw_pair(personal, pool).await else {
            tracing::error!(player = ?self.player, "Failed to draw initial pair");
            return false;
        };

        let mut used = self.used.clone();
        used.insert(top.name.clone());
        used.insert(bottom.name.clone());
        self.used = used;

        tracing::info!(
            player = ?self.player,
            top = %top.name,
            bottom = %bottom.name,
            "Game initialized"
        );
        self.state = GameState::fresh(top, bottom);
        true
    }

    /// Resolves a guess against the visible pair.
    pub async fn guess(&mut self, guess: Guess) -> Result<GuessOutcome, GameError> {
        if self.phase() != Phase::Playing {
            return Err(GameError::NotPlaying);
        }
        self.touch();

        let (Some(top), Some(bottom)) = (&self.state.top_entity, &self.state.bottom_entity) else {
            return Err(GameError::NotPlaying);
        };
        let correct = guess.is_correct(top, bottom);
        let previous_score = self.state.score;

        if correct {
            self.state = GameState {
                score: previous_score + 1,
                show_results: true,
                ..self.state.clone()
            };
            self.should_progress = true;
            tracing::info!(player = ?self.player, score = self.state.score, "Correct guess");
        } else {
            self.state = GameState {
                show_results: true,
                game_over: true,
                ..self.state.clone()
            };
            tracing::info!(player = ?self.player, score = previous_score, "Incorrect guess, game over");
            high_scores::persist(self.deps.kv.as_ref(), self.player.as_deref(), previous_score).await;
        }

        Ok(GuessOutcome {
            correct,
            score: self.state.score,
            game_over: self.state.game_over,
        })
    }

    /// Promotes the bottom entity and draws a fresh one below it.
    ///
    /// A failed draw leaves the current pair in place.
    pub async fn advance(&mut self) -> bool {
        if self.state.game_over {
            return false;
        }
        let Some(previous_bottom) = self.state.bottom_entity.clone() else {
            return false;
        };

        // 回退到全量池时，新 top 仍可能在候选里
        let pool: Vec<String> = self
            .candidates()
            .into_iter()
            .filter(|name| *name != previous_bottom.name)
            .collect();
        let attempts = self.deps.max_draw_attempts;
        let lookup = self.deps.lookup.clone();
        let outcome = draw_random(lookup.as_ref(), &pool, attempts, &mut self.rng).await;

        let DrawOutcome::Found(next) = outcome else {
            tracing::error!(player = ?self.player, "Failed to draw next entity, round not advanced");
            return false;
        };

        let mut used = self.used.clone();
        used.insert(next.name.clone());
        self.used = used;

        tracing::debug!(player = ?self.player, top = %previous_bottom.name, bottom = %next.name, "Round advanced");
        self.state = GameState {
            score: self.state.score,
            top_entity: Some(previous_bottom),
            bottom_entity: Some(next),
            show_results: false,
            game_over: false,
        };
        true
    }

    /// Called by the progression ticker. Advances at most once per correct guess.
    pub async fn on_tick(&mut self) -> bool {
        if !std::mem::take(&mut self.should_progress) {
            return false;
        }
        self.advance().await
    }

    /// GameOver (or stuck) → Playing with a fresh pair.
    ///
    /// Returns `Ok(false)` when no pair could be drawn; the previous state is kept.
    pub async fn reset(&mut self) -> Result<bool, GameError> {
        if !self.state.game_over && !self.state.is_stuck() {
            return Err(GameError::GameInProgress);
        }
        self.touch();

        let pool = self.candidates();
        let Some((top, bottom)) = self.draw_pair(Vec::new(), pool).await else {
            tracing::error!(player = ?self.player, "Failed to draw pair for reset");
            return Ok(false);
        };

        self.high_scores.raise(self.state.score);
        self.used = HashSet::from([top.name.clone(), bottom.name.clone()]);
        self.should_progress = false;

        tracing::info!(
            player = ?self.player,
            previous_score = self.state.score,
            top = %top.name,
            bottom = %bottom.name,
            "Game reset"
        );
        self.state = GameState::fresh(top, bottom);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::services::{KvError, LookupError};

    struct MapLookup {
        counts: HashMap<String, u64>,
    }

    #[async_trait]
    impl EntityLookup for MapLookup {
        async fn entity_info(&self, name: &str) -> Result<Entity, LookupError> {
            self.counts
                .get(name)
                .map(|c| Entity::new(name, *c))
                .ok_or_else(|| LookupError::NotFound(name.to_string()))
        }
    }

    #[derive(Default)]
    struct MemoryKv {
        values: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MemoryKv {
        async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn deps(entries: &[(&str, u64)], kv: Arc<MemoryKv>) -> GameDeps {
        let lookup = MapLookup {
            counts: entries
                .iter()
                .map(|(n, c)| (n.to_string(), *c))
                .collect(),
        };
        let defaults = DefaultPool::new(entries.iter().map(|(n, _)| *n));
        GameDeps::new(Arc::new(lookup), kv, Arc::new(defaults))
    }

    fn playing_session(top: Entity, bottom: Entity, kv: Arc<MemoryKv>) -> GameSession {
        let entries = [("a", 1), ("b", 2), ("c", 3), ("d", 4)];
        let mut session = GameSession::with_seed(Some("u1".into()), Vec::new(), deps(&entries, kv), 9);
        session.used = HashSet::from([top.name.clone(), bottom.name.clone()]);
        session.state = GameState::fresh(top, bottom);
        session
    }

    #[tokio::test]
    async fn initialize_draws_distinct_pair() {
        let kv = Arc::new(MemoryKv::default());
        for seed in 0..25 {
            let mut session =
                GameSession::with_seed(None, Vec::new(), deps(&[("a", 1), ("b", 2)], kv.clone()), seed);
            assert!(session.initialize().await);
            let top = session.state().top_entity.clone().unwrap();
            let bottom = session.state().bottom_entity.clone().unwrap();
            assert_ne!(top.name, bottom.name);
            assert_eq!(session.used().len(), 2);
            assert_eq!(session.phase(), Phase::Playing);
        }
    }

    #[tokio::test]
    async fn initialize_prefers_personal_top() {
        let kv = Arc::new(MemoryKv::default());
        let entries = [("a", 1), ("b", 2), ("c", 3), ("mine", 4)];
        for seed in 0..10 {
            let mut session = GameSession::with_seed(
                Some("u1".into()),
                vec!["mine".to_string()],
                deps(&entries, kv.clone()),
                seed,
            );
            assert!(session.initialize().await);
            assert_eq!(session.state().top_entity.as_ref().unwrap().name, "mine");
        }
    }

    #[tokio::test]
    async fn initialize_without_valid_entities_is_stuck() {
        let kv = Arc::new(MemoryKv::default());
        let defaults = DefaultPool::new(["x", "y"]);
        let lookup = MapLookup {
            counts: HashMap::new(),
        };
        let deps = GameDeps::new(Arc::new(lookup), kv, Arc::new(defaults));
        let mut session = GameSession::with_seed(None, Vec::new(), deps, 1);

        assert!(!session.initialize().await);
        assert!(session.state().is_stuck());
        assert_eq!(session.guess(Guess::Higher).await, Err(GameError::NotPlaying));
    }

    #[tokio::test]
    async fn correct_guess_scores_and_schedules_progress() {
        let kv = Arc::new(MemoryKv::default());
        let mut session = playing_session(Entity::new("a", 1000), Entity::new("b", 1000), kv);

        let outcome = session.guess(Guess::Higher).await.unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.score, 1);
        assert!(session.state().show_results);
        assert!(session.should_progress());
        assert_eq!(session.phase(), Phase::Resolving);

        assert_eq!(session.guess(Guess::Lower).await, Err(GameError::NotPlaying));
    }

    #[tokio::test]
    async fn wrong_guess_ends_game_and_persists() {
        let kv = Arc::new(MemoryKv::default());
        let mut session = playing_session(Entity::new("a", 500), Entity::new("b", 600), kv.clone());
        session.state.score = 3;

        let outcome = session.guess(Guess::Lower).await.unwrap();
        assert!(!outcome.correct);
        assert!(outcome.game_over);
        assert_eq!(outcome.score, 3);
        assert!(!session.should_progress());

        let values = kv.values.lock().unwrap();
        assert_eq!(values.get("high_score:u1").map(String::as_str), Some("3"));
        assert_eq!(values.get("high_score:global").map(String::as_str), Some("3"));
    }

    #[tokio::test]
    async fn tick_advances_once_per_correct_guess() {
        let kv = Arc::new(MemoryKv::default());
        let mut session = playing_session(Entity::new("a", 1), Entity::new("b", 2), kv);
        session.guess(Guess::Higher).await.unwrap();

        assert!(session.on_tick().await);
        assert!(!session.on_tick().await);

        let state = session.state();
        assert_eq!(state.top_entity.as_ref().unwrap().name, "b");
        let bottom = state.bottom_entity.as_ref().unwrap().name.clone();
        assert!(bottom == "c" || bottom == "d");
        assert!(!state.show_results);
        assert!(session.used().contains(&bottom));
        assert_eq!(session.phase(), Phase::Playing);
    }

    #[tokio::test]
    async fn advance_after_fallback_never_repeats_the_top() {
        let kv = Arc::new(MemoryKv::default());
        for seed in 0..40 {
            let mut session =
                GameSession::with_seed(None, Vec::new(), deps(&[("a", 5), ("b", 5)], kv.clone()), seed);
            assert!(session.initialize().await);
            assert!(session.guess(Guess::Higher).await.unwrap().correct);
            assert!(session.on_tick().await);

            let state = session.state();
            assert_ne!(
                state.top_entity.as_ref().unwrap().name,
                state.bottom_entity.as_ref().unwrap().name
            );
        }
    }

    #[tokio::test]
    async fn failed_advance_keeps_pair() {
        let kv = Arc::new(MemoryKv::default());
        let lookup = MapLookup {
            counts: HashMap::new(),
        };
        let deps = GameDeps::new(Arc::new(lookup), kv, Arc::new(DefaultPool::new(["z"])));
        let mut session = GameSession::with_seed(None, Vec::new(), deps, 5);
        session.state = GameState::fresh(Entity::new("a", 1), Entity::new("b", 2));
        let before = session.state().clone();

        assert!(!session.advance().await);
        assert_eq!(session.state(), &before);
    }

    #[tokio::test]
    async fn reset_requires_finished_game() {
        let kv = Arc::new(MemoryKv::default());
        let mut session = playing_session(Entity::new("a", 1), Entity::new("b", 2), kv);
        assert_eq!(session.reset().await, Err(GameError::GameInProgress));
    }

    #[tokio::test]
    async fn reset_replaces_used_set_and_raises_bests() {
        let kv = Arc::new(MemoryKv::default());
        let mut session = playing_session(Entity::new("a", 4), Entity::new("b", 2), kv);
        session.state.score = 6;
        session.guess(Guess::Higher).await.unwrap();

        let summary = session.summary().unwrap();
        assert!(summary.new_personal_best);
        assert_eq!(summary.personal_best, 6);

        assert_eq!(session.reset().await, Ok(true));
        let state = session.state().clone();
        assert_eq!(state.score, 0);
        assert!(!state.game_over);

        let top = state.top_entity.unwrap().name;
        let bottom = state.bottom_entity.unwrap().name;
        assert_ne!(top, bottom);
        assert_eq!(session.used(), &HashSet::from([top, bottom]));
        assert_eq!(session.high_scores(), HighScores { personal: 6, global: 6 });
    }
}
