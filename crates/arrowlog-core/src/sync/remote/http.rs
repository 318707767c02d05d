//! HTTP client for the sheets-backed remote store.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{PushReceipt, RemoteError, RemoteStore};
use crate::models::{normalize_sessions, AppMeta, Session};
use crate::util::{compact_text, normalize_base_url, normalize_text_option};

/// Remote store reached over the sheets JSON API.
#[derive(Clone)]
pub struct HttpRemoteStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpRemoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpRemoteStore")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpRemoteStore {
    /// Builds a client for an explicit API base URL.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let base_url = normalize_base_url(base_url).ok_or_else(|| {
            RemoteError::InvalidConfiguration(
                "API base URL must include http:// or https://".to_string(),
            )
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            token: normalize_text_option(token),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, route: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{route}", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        route: &str,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(map_status(status, &body));
        }
        serde_json::from_str(&body)
            .map_err(|error| RemoteError::InvalidPayload(format!("{route}: {error}")))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapResponse {
    spreadsheet_id: String,
    #[serde(default)]
    spreadsheet_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushRequest<'a> {
    spreadsheet_id: &'a str,
    sessions: &'a [Session],
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl RemoteStore for HttpRemoteStore {
    async fn bootstrap(&self) -> Result<AppMeta, RemoteError> {
        let route = "/api/sheets/bootstrap";
        let response = self.request(reqwest::Method::POST, route).send().await?;
        let payload: BootstrapResponse = Self::read_json(response, route).await?;

        let store_id = normalize_text_option(Some(payload.spreadsheet_id)).ok_or_else(|| {
            RemoteError::InvalidPayload("bootstrap returned an empty spreadsheetId".to_string())
        })?;
        let title = normalize_text_option(payload.spreadsheet_title)
            .unwrap_or_else(|| "Archery Log".to_string());
        tracing::debug!("Remote store resolved to {store_id}");
        Ok(AppMeta::new(store_id, title))
    }

    async fn pull(&self, store_id: &str) -> Result<Vec<Session>, RemoteError> {
        let route = "/api/sheets/pull";
        let response = self
            .request(reqwest::Method::GET, route)
            .query(&[("spreadsheetId", store_id)])
            .send()
            .await?;
        let mut payload: PullResponse = Self::read_json(response, route).await?;
        normalize_sessions(&mut payload.sessions);
        tracing::debug!("Pulled {} sessions", payload.sessions.len());
        Ok(payload.sessions)
    }

    async fn push(&self, store_id: &str, sessions: &[Session]) -> Result<PushReceipt, RemoteError> {
        let route = "/api/sheets/push";
        let response = self
            .request(reqwest::Method::POST, route)
            .json(&PushRequest {
                spreadsheet_id: store_id,
                sessions,
            })
            .send()
            .await?;
        Self::read_json(response, route).await
    }
}

fn map_status(status: StatusCode, body: &str) -> RemoteError {
    let message = parse_error_message(body).unwrap_or_else(|| {
        let compact = compact_text(body);
        if compact.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            compact
        }
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::Quota(message),
        _ => RemoteError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn parse_error_message(body: &str) -> Option<String> {
    let payload = serde_json::from_str::<ErrorBody>(body).ok()?;
    normalize_text_option(payload.error.or(payload.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> HttpRemoteStore {
        HttpRemoteStore::new(
            &server.uri(),
            Some("token-123".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn session_json(id: &str) -> serde_json::Value {
        json!({
            "sessionId": id,
            "sessionDate": "2024-05-01",
            "createdAt": "2024-05-01T17:00:00.000Z",
            "updatedAt": "2024-05-01T18:00:00.000Z",
            "location": "Club field",
            "notes": "",
            "isLocalOnly": false,
            "photos": [],
            "ends": [{
                "endId": "0190a0b0-0000-7000-8000-000000000001",
                "endIndex": 1,
                "distanceMeters": 18,
                "shots": [
                    {"shotId": "0190a0b0-0000-7000-8000-0000000000a1", "shotIndex": 1, "score": 10, "value": "X"},
                    {"shotId": "0190a0b0-0000-7000-8000-0000000000a2", "shotIndex": 2, "score": 7, "value": "7"},
                    {"shotId": "0190a0b0-0000-7000-8000-0000000000a3", "shotIndex": 3, "score": 0, "value": "M"}
                ]
            }]
        })
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        let err = HttpRemoteStore::new("api.example.com", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidConfiguration(_)));
    }

    #[test]
    fn debug_redacts_token() {
        let store = HttpRemoteStore::new(
            "https://api.example.com/",
            Some("secret".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        let debug = format!("{store:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(store.base_url(), "https://api.example.com");
    }

    #[tokio::test]
    async fn bootstrap_reads_spreadsheet_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sheets/bootstrap"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "sheet-1",
                "spreadsheetTitle": "Archery Log"
            })))
            .mount(&server)
            .await;

        let meta = store(&server).bootstrap().await.unwrap();

        assert_eq!(meta, AppMeta::new("sheet-1", "Archery Log"));
    }

    #[tokio::test]
    async fn pull_parses_sessions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sheets/pull"))
            .and(query_param("spreadsheetId", "sheet-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sessions": [session_json("0190a0b0-0000-7000-8000-00000000000f")]
            })))
            .mount(&server)
            .await;

        let sessions = store(&server).pull("sheet-1").await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].ends[0].total(), 17);
        assert_eq!(sessions[0].location, "Club field");
    }

    #[tokio::test]
    async fn pull_rejects_inconsistent_shots() {
        let server = MockServer::start().await;
        let mut bad = session_json("0190a0b0-0000-7000-8000-00000000000f");
        bad["ends"][0]["shots"][1]["score"] = json!(9);
        Mock::given(method("GET"))
            .and(path("/api/sheets/pull"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sessions": [bad] })))
            .mount(&server)
            .await;

        let err = store(&server).pull("sheet-1").await.unwrap_err();

        assert!(matches!(err, RemoteError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn pulled_coordinates_and_end_photos_survive_a_push() {
        let server = MockServer::start().await;
        let mut row = session_json("0190a0b0-0000-7000-8000-00000000000f");
        row["locationLat"] = json!(37.77);
        row["locationLng"] = json!(-122.41);
        row["ends"][0]["photoFileId"] = json!("drive-file-1");
        row["ends"][0]["photoName"] = json!("end-1.jpg");
        row["ends"][0]["photoUploadedAt"] = json!("2024-05-01T17:30:00.000Z");
        Mock::given(method("GET"))
            .and(path("/api/sheets/pull"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sessions": [row] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/sheets/push"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "syncedAt": "2024-05-01T18:30:00.000Z"
            })))
            .mount(&server)
            .await;

        let remote = store(&server);
        let sessions = remote.pull("sheet-1").await.unwrap();
        assert!(sessions[0].coordinates.is_some());
        remote.push("sheet-1", &sessions).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let push = requests
            .iter()
            .find(|request| request.url.path() == "/api/sheets/push")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&push.body).unwrap();
        let sent = &body["sessions"][0];
        assert_eq!(sent["locationLat"], 37.77);
        assert_eq!(sent["locationLng"], -122.41);
        assert_eq!(sent["ends"][0]["photoFileId"], "drive-file-1");
        assert_eq!(sent["ends"][0]["photoName"], "end-1.jpg");
        assert!(sent.get("coordinates").is_none());
    }

    #[tokio::test]
    async fn push_sends_spreadsheet_id_and_reads_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sheets/push"))
            .and(body_partial_json(json!({ "spreadsheetId": "sheet-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "syncedAt": "2024-05-01T18:30:00.000Z",
                "counts": {"sessions": 0, "ends": 0, "shots": 0},
                "persisted": {"sessions": 0, "ends": 0, "shots": 0}
            })))
            .mount(&server)
            .await;

        let receipt = store(&server).push("sheet-1", &[]).await.unwrap();

        assert_eq!(receipt.synced_at, "2024-05-01T18:30:00.000Z");
        assert_eq!(receipt.persisted.map(|c| c.sessions), Some(0));
    }

    #[tokio::test]
    async fn status_codes_map_to_distinct_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sheets/bootstrap"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "Session expired" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sheets/pull"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/sheets/push"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = store(&server);
        match store.bootstrap().await.unwrap_err() {
            RemoteError::Auth(message) => assert_eq!(message, "Session expired"),
            other => panic!("expected auth error, got {other:?}"),
        }
        match store.pull("sheet-1").await.unwrap_err() {
            RemoteError::Quota(message) => assert_eq!(message, "slow down"),
            other => panic!("expected quota error, got {other:?}"),
        }
        match store.push("sheet-1", &[]).await.unwrap_err() {
            RemoteError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "HTTP 500");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
