use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ws::manager::WsManager;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Ping every gateway connection on a fixed interval until `cancel` fires.
///
/// A client that stops answering errors out of its own receive loop, which
/// removes it and announces it offline.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let pinged = ws_manager.ping_all().await;
                    tracing::debug!(pinged, "Gateway heartbeat");
                }
            }
        }
    })
}
