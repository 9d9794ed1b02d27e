use crate::prelude::{TransportError, TransportResult};
use crate::rig_interface::{Command, CommandReply, Method};
use crate::transport::CommandTransport;
use std::future::Future;

/// JSON-over-HTTP transport for the backend's `/api` routes.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl CommandTransport for HttpTransport {
    fn send(
        &self,
        command: Command,
    ) -> impl Future<Output = TransportResult<CommandReply>> + Send + 'static {
        let client = self.client.clone();
        let (method, path) = command.endpoint();
        let url = self.url(path);

        async move {
            let kind = command.kind();
            let request = match (&command, method) {
                (Command::UpdateSettings(settings), _) => client.post(&url).json(settings),
                (_, Method::Post) => client.post(&url),
                (_, Method::Get) => client.get(&url),
            };
            log::debug!("{} -> {}", kind.describe(), url);

            let response = request.send().await.map_err(network)?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(TransportError::Network(format!("{status}: {text}")));
            }
            let body = response.bytes().await.map_err(network)?;
            CommandReply::decode(kind, &body)
        }
    }
}

fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig_interface::{CommandKind, LinkStatus, RigSettings};
    use std::net::SocketAddr;
    use warp::Filter;

    async fn serve_backend() -> SocketAddr {
        let start = warp::path!("api" / "start_monitoring")
            .and(warp::post())
            .map(|| warp::reply::json(&serde_json::json!({"status": "started"})));
        let status = warp::path!("api" / "status").and(warp::get()).map(|| {
            warp::reply::json(&serde_json::json!({
                "smoke_level": 1200,
                "temperature": 24.5,
                "esp32_status": "online"
            }))
        });
        let settings = warp::path!("api" / "settings")
            .and(warp::post())
            .and(warp::body::json())
            .map(|body: RigSettings| {
                let status = if body.esp_ip.is_empty() { "rejected" } else { "updated" };
                warp::reply::json(&serde_json::json!({ "status": status }))
            });
        let broken = warp::path!("api" / "stop_alarm")
            .and(warp::post())
            .map(|| "<html>oops</html>");
        let failing = warp::path!("api" / "stop_monitoring").and(warp::post()).map(|| {
            warp::reply::with_status("boom", warp::http::StatusCode::INTERNAL_SERVER_ERROR)
        });

        let routes = start.or(status).or(settings).or(broken).or(failing);
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    #[tokio::test]
    async fn start_and_status_round_trip() {
        let addr = serve_backend().await;
        let transport = HttpTransport::new(format!("http://{addr}/"));

        assert_eq!(
            transport.send(Command::StartMonitoring).await,
            Ok(CommandReply::Started)
        );
        match transport.send(Command::FetchStatus).await.unwrap() {
            CommandReply::Status(snapshot) => {
                assert_eq!(snapshot.smoke_level, 1200.0);
                assert_eq!(snapshot.esp32_status, LinkStatus::Online);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn settings_body_is_posted_as_json() {
        let addr = serve_backend().await;
        let transport = HttpTransport::new(format!("http://{addr}"));
        let reply = transport
            .send(Command::UpdateSettings(RigSettings {
                esp_ip: "192.168.2.131".into(),
                smoke_threshold: 2600.0,
                temp_threshold: 60.0,
            }))
            .await;
        assert_eq!(reply, Ok(CommandReply::SettingsUpdated));
    }

    #[tokio::test]
    async fn malformed_body_and_server_error_are_classified() {
        let addr = serve_backend().await;
        let transport = HttpTransport::new(format!("http://{addr}"));

        assert!(matches!(
            transport.send(Command::StopAlarm).await,
            Err(TransportError::Protocol(_))
        ));
        match transport.send(Command::StopMonitoring).await {
            Err(TransportError::Network(message)) => assert!(message.contains("500")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let transport = HttpTransport::new("http://127.0.0.1:9");
        assert!(matches!(
            transport.send(Command::LoadSettings).await,
            Err(TransportError::Network(_))
        ));
        assert_eq!(Command::LoadSettings.kind(), CommandKind::LoadSettings);
    }
}
