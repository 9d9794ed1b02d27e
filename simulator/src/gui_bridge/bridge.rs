use crate::gui_bridge::model::{RigHandle, SettingsPatch};
use crate::workflow::runner::Runner;
use firecore::rig_interface::events::ALARM_STOPPED;
use firecore::rig_interface::{PipelineStage, PushEnvelope, Severity};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::broadcast::error::RecvError;
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

/// HTTP and WebSocket front of the simulated rig.
#[derive(Clone)]
pub struct GuiBridge {
    runner: Runner,
}

impl GuiBridge {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    pub fn rig(&self) -> &RigHandle {
        self.runner.rig()
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let bridge = self.clone();
        let with_bridge = warp::any().map(move || bridge.clone());

        let start = warp::path!("api" / "start_monitoring")
            .and(warp::post())
            .and(with_bridge.clone())
            .map(|bridge: GuiBridge| warp::reply::json(&bridge.start_monitoring()));

        let stop = warp::path!("api" / "stop_monitoring")
            .and(warp::post())
            .and(with_bridge.clone())
            .map(|bridge: GuiBridge| warp::reply::json(&bridge.stop_monitoring()));

        let stop_alarm = warp::path!("api" / "stop_alarm")
            .and(warp::post())
            .and(with_bridge.clone())
            .map(|bridge: GuiBridge| warp::reply::json(&json!({ "success": bridge.stop_alarm() })));

        let status = warp::path!("api" / "status")
            .and(warp::get())
            .and(with_bridge.clone())
            .map(|bridge: GuiBridge| {
                let wire = bridge.rig().read(|m| m.to_wire());
                warp::reply::json(&wire)
            });

        let get_settings = warp::path!("api" / "settings")
            .and(warp::get())
            .and(with_bridge.clone())
            .map(|bridge: GuiBridge| warp::reply::json(&bridge.rig().settings()));

        let post_settings = warp::path!("api" / "settings")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_bridge.clone())
            .map(|patch: SettingsPatch, bridge: GuiBridge| {
                bridge.rig().update(|m| patch.apply(&mut m.settings));
                info!("settings updated: {:?}", bridge.rig().settings());
                warp::reply::json(&json!({ "status": "updated" }))
            });

        let socket = warp::path("socket")
            .and(warp::ws())
            .and(with_bridge)
            .map(|ws: Ws, bridge: GuiBridge| {
                ws.on_upgrade(move |socket| forward_events(socket, bridge.rig().clone()))
            });

        start
            .or(stop)
            .or(stop_alarm)
            .or(status)
            .or(get_settings)
            .or(post_settings)
            .or(socket)
    }

    /// Binds `addr` and serves until `shutdown` resolves.
    pub fn serve(
        &self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(SocketAddr, impl Future<Output = ()>), warp::Error> {
        warp::serve(self.routes()).try_bind_with_graceful_shutdown(addr, shutdown)
    }

    /// Starts a new session; any running one is superseded.
    pub fn start_monitoring(&self) -> serde_json::Value {
        let run_id = self.rig().update(|m| {
            m.monitoring = true;
            m.run_id += 1;
            m.run_id
        });
        info!("monitoring session {run_id} started");
        let runner = self.runner.clone();
        tokio::spawn(async move { runner.execute(run_id).await });
        json!({ "status": "started" })
    }

    pub fn stop_monitoring(&self) -> serde_json::Value {
        let was_alarming = self.rig().update(|m| {
            let was_alarming = m.alarm_active;
            m.monitoring = false;
            m.alarm_active = false;
            m.fire_detected = false;
            m.camera_online = false;
            m.set_stage(PipelineStage::Idle, "System stopped by user");
            was_alarming
        });
        if was_alarming {
            self.rig()
                .emit(PushEnvelope::new(ALARM_STOPPED, json!({ "status": "inactive" })));
        }
        self.rig().emit_status();
        info!("monitoring stopped");
        json!({ "status": "stopped" })
    }

    /// The alarm can only be silenced while the controller is reachable.
    pub fn stop_alarm(&self) -> bool {
        if !self.runner.scenario().esp_online {
            self.rig()
                .log("Failed to stop alarm: ESP32 unreachable", Severity::Error);
            return false;
        }
        self.rig().update(|m| m.alarm_active = false);
        self.rig()
            .emit(PushEnvelope::new(ALARM_STOPPED, json!({ "status": "inactive" })));
        true
    }
}

/// Sends the current status, then relays rig events until either side goes away.
async fn forward_events(socket: WebSocket, rig: RigHandle) {
    let (mut sink, mut incoming) = socket.split();
    let mut events = rig.subscribe();

    let hello = PushEnvelope::status(&rig.read(|m| m.to_wire()));
    if sink.send(Message::text(hello.to_text())).await.is_err() {
        return;
    }
    debug!("dashboard connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(text) => {
                    if sink.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!("slow dashboard skipped {skipped} events"),
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(message)) if message.is_close() => break,
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }
    debug!("dashboard disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::ScenarioConfig;
    use firecore::rig_interface::{PushEvent, RigSettings};
    use warp::http::StatusCode;

    fn bridge(scenario: ScenarioConfig) -> GuiBridge {
        let rig = RigHandle::new(scenario.initial_settings());
        GuiBridge::new(Runner::new(scenario, rig))
    }

    fn idle_scenario() -> ScenarioConfig {
        ScenarioConfig {
            spike_after_ticks: None,
            smoke_interval_ms: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_and_stop_round_trip() {
        let bridge = bridge(idle_scenario());
        let routes = bridge.routes();

        let res = warp::test::request()
            .method("POST")
            .path("/api/start_monitoring")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), br#"{"status":"started"}"#);
        assert!(bridge.rig().read(|m| m.monitoring));

        let res = warp::test::request()
            .method("POST")
            .path("/api/stop_monitoring")
            .reply(&routes)
            .await;
        assert_eq!(res.body().as_ref(), br#"{"status":"stopped"}"#);
        assert!(bridge
            .rig()
            .read(|m| !m.monitoring && m.stage == PipelineStage::Idle));
    }

    #[tokio::test]
    async fn settings_patch_keeps_missing_fields() {
        let bridge = bridge(idle_scenario());
        let routes = bridge.routes();

        let res = warp::test::request()
            .method("POST")
            .path("/api/settings")
            .json(&json!({ "smoke_threshold": 3000 }))
            .reply(&routes)
            .await;
        assert_eq!(res.body().as_ref(), br#"{"status":"updated"}"#);

        let res = warp::test::request()
            .path("/api/settings")
            .reply(&routes)
            .await;
        let settings: RigSettings = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(settings.smoke_threshold, 3000.0);
        assert_eq!(settings.temp_threshold, 60.0);
        assert_eq!(settings.esp_ip, "192.168.2.131");
    }

    #[tokio::test]
    async fn stop_alarm_fails_when_controller_offline() {
        let offline = bridge(ScenarioConfig {
            esp_online: false,
            ..idle_scenario()
        });
        offline.rig().update(|m| m.alarm_active = true);
        let res = warp::test::request()
            .method("POST")
            .path("/api/stop_alarm")
            .reply(&offline.routes())
            .await;
        assert_eq!(res.body().as_ref(), br#"{"success":false}"#);
        assert!(offline.rig().read(|m| m.alarm_active));

        let online = bridge(idle_scenario());
        online.rig().update(|m| m.alarm_active = true);
        assert!(online.stop_alarm());
        assert!(!online.rig().read(|m| m.alarm_active));
    }

    #[tokio::test]
    async fn status_serves_the_wire_snapshot() {
        let bridge = bridge(idle_scenario());
        bridge.rig().update(|m| m.smoke_level = 1750.0);
        let res = warp::test::request()
            .path("/api/status")
            .reply(&bridge.routes())
            .await;
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["smoke_level"], 1750.0);
        assert_eq!(body["monitoring_stage"], "idle");
        assert_eq!(body["esp32_status"], "offline");
    }

    #[tokio::test]
    async fn socket_greets_with_status_then_relays() {
        let bridge = bridge(idle_scenario());
        let mut client = warp::test::ws()
            .path("/socket")
            .handshake(bridge.routes())
            .await
            .expect("handshake");

        let hello = client.recv().await.unwrap();
        let event = PushEnvelope::decode(hello.to_str().unwrap()).unwrap();
        assert!(matches!(event, Some(PushEvent::Snapshot(_))));

        bridge.rig().log("hello dashboard", Severity::Success);
        let relayed = client.recv().await.unwrap();
        match PushEnvelope::decode(relayed.to_str().unwrap()).unwrap() {
            Some(PushEvent::Log { message, severity }) => {
                assert_eq!(message, "hello dashboard");
                assert_eq!(severity, Severity::Success);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
