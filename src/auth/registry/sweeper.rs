use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{sync::watch, time};

use super::RefreshTokenStore;

pub async fn launch(
    store: Arc<dyn RefreshTokenStore>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("refresh token sweeper start");
    let mut ticker = time::interval(interval);
    // The first tick completes immediately; nothing has expired yet at startup.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {
                sweep(store.as_ref(), Utc::now()).await;
            }
        }
    }
    info!("refresh token sweeper stop");
}

async fn sweep(store: &dyn RefreshTokenStore, now: DateTime<Utc>) -> usize {
    match store.purge_expired(now).await {
        Ok(purged) => {
            if purged > 0 {
                debug!("purged {} expired refresh token(s)", purged);
            }
            purged
        }
        Err(err) => {
            error!("{}", err);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::auth::registry::MemoryStore;

    #[tokio::test]
    async fn sweep_counts_purged_entries() {
        let store = MemoryStore::default();
        let now = Utc::now();
        store.insert("a", now - ChronoDuration::minutes(1)).await.unwrap();
        store.insert("b", now - ChronoDuration::minutes(2)).await.unwrap();
        store.insert("c", now + ChronoDuration::minutes(1)).await.unwrap();

        assert_eq!(sweep(&store, now).await, 2);
        assert_eq!(sweep(&store, now).await, 0);
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let store: Arc<dyn RefreshTokenStore> = Arc::new(MemoryStore::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(launch(store, Duration::from_secs(3600), shutdown_rx));

        shutdown_tx.send(true).unwrap();
        time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
