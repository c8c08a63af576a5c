use super::ServerApi;
use crate::error::ApiError;
use crate::model::{
    ClientConfig, Empty, Envelope, EnvelopeStatus, ServerItem, ServerList, ServerRecord,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// reqwest-backed client for the server manager REST API.
#[derive(Clone)]
pub struct HttpServerApi {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpServerApi {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .context("build http client")?;
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid base URL: {}", cfg.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("base URL cannot carry a path: {}", cfg.base_url);
        }
        Ok(Self { http, base_url })
    }

    /// `{base}/server/<segments...>`, keeping any path prefix of the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push("server")
            .extend(segments);
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<Envelope<T>, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %resp.url(), "request failed");
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        // Error envelopes may omit `data`, so check the status before the payload.
        let head: EnvelopeHead = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        if head.status == EnvelopeStatus::Error {
            warn!(message = %head.message, "server reported an error");
            return Err(ApiError::ServerReported(head.message));
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[derive(Deserialize)]
struct EnvelopeHead {
    status: EnvelopeStatus,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl ServerApi for HttpServerApi {
    async fn list_servers(&self) -> Result<Envelope<ServerList>, ApiError> {
        let url = self.endpoint(&["list"])?;
        debug!(%url, "listing servers");
        let resp = self.http.get(url).send().await?;
        Self::decode(resp).await
    }

    async fn ping_server(&self, ip_address: &str) -> Result<Envelope<ServerItem>, ApiError> {
        let url = self.endpoint(&["ping", ip_address])?;
        debug!(%url, "pinging server");
        let resp = self.http.get(url).send().await?;
        Self::decode(resp).await
    }

    async fn save_server(&self, server: &ServerRecord) -> Result<Envelope<ServerItem>, ApiError> {
        let url = self.endpoint(&["save"])?;
        debug!(%url, name = %server.name, "saving server");
        let resp = self.http.post(url).json(server).send().await?;
        Self::decode(resp).await
    }

    async fn delete_server(&self, id: i64) -> Result<Envelope<Empty>, ApiError> {
        let url = self.endpoint(&["delete", &id.to_string()])?;
        debug!(%url, "deleting server");
        let resp = self.http.delete(url).send().await?;
        Self::decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ServerStatus, StatusFilter};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpServerApi {
        HttpServerApi::new(&ClientConfig {
            base_url: server.uri(),
            request_timeout: Duration::from_secs(5),
            user_agent: "server-status-cli/test".into(),
        })
        .unwrap()
    }

    fn server_json(id: i64, ip: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "ipAddress": ip,
            "name": format!("srv-{id}"),
            "memory": "16 GB",
            "type": "Personal PC",
            "imageUrl": "http://localhost:8080/server/image/server1.png",
            "status": status
        })
    }

    #[tokio::test]
    async fn list_servers_decodes_envelope() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timeStamp": "2024-03-01T10:15:30",
                "statusCode": 200,
                "status": "OK",
                "message": "Servers retrieved",
                "data": {"servers": [
                    server_json(1, "192.168.1.160", "SERVER_UP"),
                    server_json(2, "192.168.1.58", "SERVER_DOWN")
                ]}
            })))
            .mount(&mock)
            .await;

        let env = client_for(&mock).list_servers().await.unwrap();
        assert_eq!(env.message, "Servers retrieved");
        assert_eq!(env.data.servers.len(), 2);
        assert_eq!(env.data.servers[1].status, ServerStatus::Down);
    }

    #[tokio::test]
    async fn ping_uses_ip_path_segment() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/ping/192.168.1.160"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "message": "Ping success",
                "data": {"server": server_json(1, "192.168.1.160", "SERVER_UP")}
            })))
            .mount(&mock)
            .await;

        let env = client_for(&mock).ping_server("192.168.1.160").await.unwrap();
        assert_eq!(env.data.server.id, Some(1));
        assert_eq!(env.message, "Ping success");
    }

    #[tokio::test]
    async fn save_posts_record_without_id() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/server/save"))
            .and(body_json(json!({
                "ipAddress": "10.0.0.9",
                "name": "new",
                "memory": "4 GB",
                "type": "VM",
                "imageUrl": "",
                "status": "SERVER_DOWN"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": "CREATED",
                "message": "Server created",
                "data": {"server": server_json(9, "10.0.0.9", "SERVER_DOWN")}
            })))
            .mount(&mock)
            .await;

        let record = ServerRecord {
            id: None,
            ip_address: "10.0.0.9".into(),
            name: "new".into(),
            memory: "4 GB".into(),
            server_type: "VM".into(),
            image_url: String::new(),
            status: ServerStatus::Down,
        };
        let env = client_for(&mock).save_server(&record).await.unwrap();
        assert_eq!(env.data.server.id, Some(9));
    }

    #[tokio::test]
    async fn delete_hits_id_path() {
        let mock = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/server/delete/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "message": "Server deleted",
                "data": {"deleted": true}
            })))
            .mount(&mock)
            .await;

        let env = client_for(&mock).delete_server(7).await.unwrap();
        assert_eq!(env.message, "Server deleted");
    }

    #[tokio::test]
    async fn http_error_maps_to_status_code() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/list"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock)
            .await;

        let err = client_for(&mock).list_servers().await.unwrap_err();
        assert_eq!(err, ApiError::Status(500));
        assert_eq!(err.to_string(), "An error occurred - Error code: 500");
    }

    #[tokio::test]
    async fn error_envelope_is_server_reported() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/ping/10.0.0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "NOT_FOUND",
                "message": "Server not found",
                "data": {"server": server_json(1, "10.0.0.1", "SERVER_DOWN")}
            })))
            .mount(&mock)
            .await;

        let err = client_for(&mock).ping_server("10.0.0.1").await.unwrap_err();
        assert_eq!(err, ApiError::ServerReported("Server not found".into()));
    }

    #[tokio::test]
    async fn error_envelope_without_data_keeps_server_message() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/ping/10.0.0.4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "NOT_FOUND",
                "statusCode": 404,
                "message": "Server not found"
            })))
            .mount(&mock)
            .await;

        let err = client_for(&mock).ping_server("10.0.0.4").await.unwrap_err();
        assert_eq!(err, ApiError::ServerReported("Server not found".into()));
        assert_eq!(err.to_string(), "Server not found");
    }

    #[tokio::test]
    async fn ok_envelope_without_data_is_decode_error() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "message": "?"})),
            )
            .mount(&mock)
            .await;

        let err = client_for(&mock).list_servers().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let api = HttpServerApi::new(&ClientConfig {
            base_url: "http://127.0.0.1:9".into(),
            request_timeout: Duration::from_secs(2),
            user_agent: "server-status-cli/test".into(),
        })
        .unwrap();
        let err = api.list_servers().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn filter_defaults_to_client_side_projection() {
        let mock = MockServer::start().await;
        let api = client_for(&mock);
        let current = Envelope::ok("Servers retrieved", ServerList::default());
        let out = api.filter_servers(StatusFilter::Up, &current).await.unwrap();
        assert!(out.data.servers.is_empty());
        assert_eq!(out.message, "No servers of SERVER_UP found");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let api = HttpServerApi::new(&ClientConfig {
            base_url: "http://example.test/api/".into(),
            request_timeout: Duration::from_secs(1),
            user_agent: "t".into(),
        })
        .unwrap();
        let url = api.endpoint(&["delete", "3"]).unwrap();
        assert_eq!(url.as_str(), "http://example.test/api/server/delete/3");
    }
}
