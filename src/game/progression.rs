use std::sync::Weak;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::game::session::GameSession;

/// Spawns the interval loop that advances a session after a correct guess.
///
/// The flag check and the advance run under the session lock, so a slow
/// lookup can never be overtaken by a second tick. The loop ends when the
/// session is dropped or on shutdown.
pub fn spawn_progression_ticker(
    session: Weak<Mutex<GameSession>>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let Some(session) = session.upgrade() else {
                        tracing::debug!("Session dropped, stopping progression ticker");
                        break;
                    };
                    let mut guard = session.lock().await;
                    if guard.on_tick().await {
                        tracing::debug!(player = ?guard.player(), score = guard.state().score, "Progressed to next round");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    })
}
