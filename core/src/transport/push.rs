use crate::prelude::TransportResult;
use crate::rig_interface::{PushEnvelope, PushEvent};
use futures_util::StreamExt;
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const CHANNEL_DEPTH: usize = 64;

/// Reconnecting WebSocket reader for the backend's push events.
///
/// Yields `Connected` after every successful handshake and `Disconnected`
/// after every loss or failed attempt, then retries after `reconnect_delay`.
/// The task ends once the receiver is dropped.
pub struct PushChannel;

impl PushChannel {
    pub fn spawn(
        url: impl Into<String>,
        reconnect_delay: Duration,
    ) -> (mpsc::Receiver<TransportResult<PushEvent>>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        let handle = tokio::spawn(run(url.into(), reconnect_delay, tx));
        (rx, handle)
    }
}

async fn run(
    url: String,
    reconnect_delay: Duration,
    tx: mpsc::Sender<TransportResult<PushEvent>>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut stream, _)) => {
                debug!("push channel connected to {url}");
                if tx.send(Ok(PushEvent::Connected)).await.is_err() {
                    return;
                }
                while let Some(message) = stream.next().await {
                    let text = match message {
                        Ok(Message::Text(text)) => text,
                        Ok(Message::Close(_)) => break,
                        Ok(_) => continue,
                        Err(err) => {
                            warn!("push channel read failed: {err}");
                            break;
                        }
                    };
                    let item = match PushEnvelope::decode(&text) {
                        Ok(Some(event)) => Ok(event),
                        Ok(None) => continue,
                        Err(err) => Err(err),
                    };
                    if tx.send(item).await.is_err() {
                        return;
                    }
                }
            }
            Err(err) => warn!("push channel connect to {url} failed: {err}"),
        }

        if tx.send(Ok(PushEvent::Disconnected)).await.is_err() {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::TransportError;
    use crate::rig_interface::{RawSnapshot, Severity};
    use futures_util::SinkExt;
    use warp::Filter;

    #[tokio::test]
    async fn forwards_events_then_reports_disconnect() {
        let socket = warp::path("socket").and(warp::ws()).map(|ws: warp::ws::Ws| {
            ws.on_upgrade(|mut socket| async move {
                let status = PushEnvelope::status(&RawSnapshot {
                    smoke_level: Some(2700.0),
                    ..Default::default()
                });
                let _ = socket.send(warp::ws::Message::text(status.to_text())).await;
                let _ = socket.send(warp::ws::Message::text("{broken")).await;
                let log = PushEnvelope::log("Stage 1", Severity::Info);
                let _ = socket.send(warp::ws::Message::text(log.to_text())).await;
                let _ = socket.close().await;
            })
        });
        let (addr, server) = warp::serve(socket).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let (mut rx, handle) =
            PushChannel::spawn(format!("ws://{addr}/socket"), Duration::from_secs(60));

        assert_eq!(rx.recv().await, Some(Ok(PushEvent::Connected)));
        match rx.recv().await {
            Some(Ok(PushEvent::Snapshot(snapshot))) => assert_eq!(snapshot.smoke_level, 2700.0),
            other => panic!("unexpected item {other:?}"),
        }
        assert!(matches!(
            rx.recv().await,
            Some(Err(TransportError::Protocol(_)))
        ));
        assert_eq!(
            rx.recv().await,
            Some(Ok(PushEvent::Log {
                message: "Stage 1".into(),
                severity: Severity::Info
            }))
        );
        assert_eq!(rx.recv().await, Some(Ok(PushEvent::Disconnected)));
        handle.abort();
    }

    #[tokio::test]
    async fn failed_connect_reports_disconnect() {
        let (mut rx, handle) = PushChannel::spawn("ws://127.0.0.1:9/socket", Duration::from_secs(60));
        assert_eq!(rx.recv().await, Some(Ok(PushEvent::Disconnected)));
        handle.abort();
    }
}
