use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use up_or_down::config::{Config, GameConfig, RedditConfig, WorkerConfig};
use up_or_down::game::pool::DefaultPool;
use up_or_down::game::registry::SessionRegistry;
use up_or_down::game::session::GameDeps;
use up_or_down::routes::build_router;
use up_or_down::state::AppState;
use up_or_down::store::Store;

use super::fakes::{CannedActivity, TableLookup};

/// Communities every test app knows about, with distinct member counts.
pub const COMMUNITIES: &[(&str, u64)] = &[
    ("AskReddit", 45_000_000),
    ("funny", 60_000_000),
    ("gaming", 40_000_000),
    ("rust", 320_000),
    ("golang", 250_000),
    ("chess", 1_200_000),
    ("boardgames", 4_000_000),
    ("homebrewing", 900_000),
];

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<Store>,
    pub lookup: Arc<TableLookup>,
    pub shutdown_tx: broadcast::Sender<()>,
    _temp_dir: TempDir,
}

fn test_config(sled_path: String, tick: Duration) -> Config {
    // 直接构造 Config，避免 set_var 在并行测试中互相干扰
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path,
        cors_origin: "*".to_string(),
        reddit: RedditConfig::default(),
        game: GameConfig {
            progress_tick_ms: tick.as_millis() as u64,
            ..GameConfig::default()
        },
        worker: WorkerConfig {
            is_leader: false,
            ..WorkerConfig::default()
        },
    }
}

pub async fn spawn_with(activity: CannedActivity, tick: Duration) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("up-or-down-test.sled");
    let config = test_config(sled_path.to_string_lossy().to_string(), tick);

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    let lookup = Arc::new(TableLookup::new(COMMUNITIES.iter().copied()));
    let defaults = DefaultPool::new(COMMUNITIES.iter().map(|(name, _)| *name));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let deps = GameDeps::new(lookup.clone(), store.clone(), Arc::new(defaults))
        .with_max_draw_attempts(config.game.max_draw_attempts);
    let registry = Arc::new(SessionRegistry::new(
        deps,
        Arc::new(activity),
        config.game.rank_limits(),
        config.game.progress_tick(),
        shutdown_tx.clone(),
    ));

    let state = AppState::new(store.clone(), registry, &config, shutdown_tx.clone());
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        store,
        lookup,
        shutdown_tx,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with(CannedActivity::default(), Duration::from_secs(2)).await
}
