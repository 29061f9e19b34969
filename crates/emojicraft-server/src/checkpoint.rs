//! Saving the game: periodic checkpoints, explicit saves and the final save on shutdown.

use crate::record_counter;
use emojicraft_core::{Error, Result, WorldSnapshot};
use emojicraft_world::{GameEngine, PersistenceGateway};
use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

pub struct CheckpointManager {
    engine: Arc<GameEngine>,
    gateway: Arc<dyn PersistenceGateway>,
}

impl CheckpointManager {
    pub fn new(engine: Arc<GameEngine>, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { engine, gateway }
    }

    /// Snapshot the running world and write it out
    #[instrument(skip(self))]
    pub async fn save_now(&self) -> Result<WorldSnapshot> {
        let snapshot = self.engine.snapshot();
        self.write(snapshot).await
    }

    /// Stop the engine and write the final state. Failures are logged, never returned.
    #[instrument(skip(self))]
    pub async fn save_on_shutdown(&self) {
        let snapshot = self.engine.shutdown();
        match self.write(snapshot).await {
            Ok(saved) => info!(score = saved.score, "Final state saved"),
            Err(e) => warn!(error = %e, "Could not save final state"),
        }
    }

    /// Stamp the snapshot and hand it to the stores on the blocking pool
    async fn write(&self, mut snapshot: WorldSnapshot) -> Result<WorldSnapshot> {
        snapshot.saved_at = chrono::Utc::now().timestamp();

        let gateway = self.gateway.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            gateway.save(&snapshot)?;
            Ok::<_, Error>(snapshot)
        })
        .await
        .map_err(|e| Error::Other(format!("save task failed: {}", e)))??;

        record_counter!("checkpoints_written", 1u64);
        info!(saved_at = snapshot.saved_at, score = snapshot.score, "Checkpoint written");
        Ok(snapshot)
    }

    /// Save every `interval_secs` until cancelled. Zero disables periodic saves.
    pub async fn run_periodic(&self, interval_secs: u64, cancel: CancellationToken) {
        if interval_secs == 0 {
            info!("Periodic checkpoints disabled");
            return;
        }

        let period = Duration::from_secs(interval_secs);
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticks.tick() => {
                    if let Err(e) = self.save_now().await {
                        error!(error = %e, "Periodic checkpoint failed");
                    }
                }
            }
        }

        info!("Periodic checkpoints stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emojicraft_core::GameConfig;
    use emojicraft_world::{BincodeStore, FallbackGateway, JsonStore, World};
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("emojicraft-server-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn manager(dir: &PathBuf) -> (Arc<GameEngine>, Arc<FallbackGateway>, CheckpointManager) {
        let config = GameConfig {
            seed: Some(8),
            ..Default::default()
        };
        let engine = Arc::new(GameEngine::new(config.clone(), World::new(config)));
        let gateway = Arc::new(FallbackGateway::new(vec![
            Box::new(JsonStore::new(dir.join("state.json"))),
            Box::new(BincodeStore::new(dir.join("state.bin"))),
        ]));
        let checkpoints = CheckpointManager::new(engine.clone(), gateway.clone());
        (engine, gateway, checkpoints)
    }

    #[tokio::test]
    async fn test_save_now_stamps_and_writes() {
        let dir = temp_dir();
        let (engine, gateway, checkpoints) = manager(&dir);

        let saved = checkpoints.save_now().await.unwrap();
        assert!(saved.saved_at > 0);
        assert_eq!(saved.time_remaining, engine.snapshot().time_remaining);
        assert_eq!(gateway.load().unwrap(), saved);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_save_ends_round() {
        let dir = temp_dir();
        let (engine, gateway, checkpoints) = manager(&dir);
        engine.launch();

        checkpoints.save_on_shutdown().await;
        assert!(!engine.query_world().active);

        let saved = gateway.load().unwrap();
        assert_eq!(saved.time_remaining, 180);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_checkpoints_until_cancelled() {
        let dir = temp_dir();
        let (_engine, gateway, checkpoints) = manager(&dir);
        let checkpoints = Arc::new(checkpoints);
        let cancel = CancellationToken::new();

        let task = {
            let checkpoints = checkpoints.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { checkpoints.run_periodic(30, cancel).await })
        };

        assert!(gateway.load().unwrap_err().is_not_found());
        tokio::time::sleep(Duration::from_secs(31)).await;
        // The write itself runs on the blocking pool
        for _ in 0..100 {
            if gateway.load().is_ok() {
                break;
            }
            tokio::task::yield_now().await;
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(gateway.load().is_ok());

        cancel.cancel();
        task.await.unwrap();
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_zero_interval_returns_immediately() {
        let dir = temp_dir();
        let (_engine, _gateway, checkpoints) = manager(&dir);
        checkpoints.run_periodic(0, CancellationToken::new()).await;
        std::fs::remove_dir_all(dir).unwrap();
    }
}
