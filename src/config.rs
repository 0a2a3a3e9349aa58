use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    COMMENT_FETCH_LIMIT, DEFAULT_MAX_DRAW_ATTEMPTS, DEFAULT_PROGRESS_TICK_MS,
    DEFAULT_SESSION_IDLE_SECS, MAX_RANKED_COMMUNITIES, POST_FETCH_LIMIT,
};
use crate::game::ranker::RankLimits;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub reddit: RedditConfig,
    pub game: GameConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub max_draw_attempts: usize,
    pub progress_tick_ms: u64,
    pub ranked_limit: usize,
    pub post_fetch_limit: usize,
    pub comment_fetch_limit: usize,
    /// 为空时使用内置默认社区列表
    pub default_pool_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub is_leader: bool,
    pub session_idle_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            user_agent: concat!("up-or-down/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_draw_attempts: DEFAULT_MAX_DRAW_ATTEMPTS,
            progress_tick_ms: DEFAULT_PROGRESS_TICK_MS,
            ranked_limit: MAX_RANKED_COMMUNITIES,
            post_fetch_limit: POST_FETCH_LIMIT,
            comment_fetch_limit: COMMENT_FETCH_LIMIT,
            default_pool_path: None,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            is_leader: true,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

impl GameConfig {
    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms.max(1))
    }

    pub fn rank_limits(&self) -> RankLimits {
        RankLimits {
            posts: self.post_fetch_limit,
            comments: self.comment_fetch_limit,
            ranked: self.ranked_limit,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let reddit_defaults = RedditConfig::default();
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/up-or-down.sled"),
            cors_origin: env_or("CORS_ORIGIN", "*"),
            reddit: RedditConfig {
                base_url: env_or("REDDIT_BASE_URL", &reddit_defaults.base_url),
                user_agent: env_or("REDDIT_USER_AGENT", &reddit_defaults.user_agent),
                timeout_secs: env_or_parse("REDDIT_TIMEOUT_SECS", reddit_defaults.timeout_secs),
            },
            game: GameConfig {
                max_draw_attempts: env_or_parse("MAX_DRAW_ATTEMPTS", DEFAULT_MAX_DRAW_ATTEMPTS),
                progress_tick_ms: env_or_parse("PROGRESS_TICK_MS", DEFAULT_PROGRESS_TICK_MS),
                ranked_limit: env_or_parse("RANKED_LIMIT", MAX_RANKED_COMMUNITIES),
                post_fetch_limit: env_or_parse("POST_FETCH_LIMIT", POST_FETCH_LIMIT),
                comment_fetch_limit: env_or_parse("COMMENT_FETCH_LIMIT", COMMENT_FETCH_LIMIT),
                default_pool_path: env::var("DEFAULT_POOL_PATH")
                    .ok()
                    .filter(|p| !p.trim().is_empty()),
            },
            worker: WorkerConfig {
                is_leader: env_or_bool("WORKER_LEADER", true),
                session_idle_secs: env_or_parse("SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
