use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::DashboardConfig;
use crate::error::TransportError;

/// One-shot REST snapshots the view can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Snapshot {
    AcStatus,
    AvgRates,
    OutsideStats,
    GcodeList,
}

impl Snapshot {
    pub const ALL: [Snapshot; 4] = [
        Snapshot::AcStatus,
        Snapshot::AvgRates,
        Snapshot::OutsideStats,
        Snapshot::GcodeList,
    ];

    /// The inbound event kind the snapshot body is applied as, if any.
    pub fn event_kind(self) -> Option<&'static str> {
        match self {
            Snapshot::AcStatus => Some("ac_snapshot"),
            Snapshot::AvgRates => Some("hvac_avg_rates"),
            Snapshot::OutsideStats => Some("outside_stats"),
            Snapshot::GcodeList => None,
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    pub fn new(config: &DashboardConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Some(cookie) = &config.session_cookie {
            let value =
                HeaderValue::from_str(cookie).map_err(|e| TransportError::BadHeader(e.to_string()))?;
            headers.insert(header::COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn snapshot_url(&self, snapshot: Snapshot, outside_location: &str) -> Url {
        let mut url = self.url(match snapshot {
            Snapshot::AcStatus => "/api/ac/status",
            Snapshot::AvgRates => "/api/hvac/avg_rates_today",
            Snapshot::OutsideStats => "/api/esp32_temphum",
            Snapshot::GcodeList => "/api/gcode",
        });
        if snapshot == Snapshot::OutsideStats {
            url.query_pairs_mut().append_pair("location", outside_location);
        }
        url
    }

    pub fn url(&self, path: &str) -> Url {
        let base_path = self.base_url.path().trim_end_matches('/');
        let mut url = self.base_url.clone();
        url.set_path(&format!("{base_path}{path}"));
        url.set_query(None);
        url
    }

    pub async fn get_json(&self, url: Url) -> Result<Value, TransportError> {
        debug!("GET {}", url);
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(body)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!("POST {} {}", url, body);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        // Some endpoints answer with an empty body
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(base: &str) -> HttpClient {
        HttpClient::new(&DashboardConfig {
            base_url: Url::parse(base).unwrap(),
            session_cookie: Some("session=abc".into()),
            http_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn urls_keep_base_path() {
        let c = client("https://home.example.net/dash/");
        assert_eq!(
            c.url("/api/gcode").as_str(),
            "https://home.example.net/dash/api/gcode"
        );
    }

    #[test]
    fn outside_stats_url_carries_location() {
        let c = client("http://10.0.0.2:5000");
        let url = c.snapshot_url(Snapshot::OutsideStats, "Parveke");
        assert_eq!(
            url.as_str(),
            "http://10.0.0.2:5000/api/esp32_temphum?location=Parveke"
        );
        let url = c.snapshot_url(Snapshot::AcStatus, "Parveke");
        assert_eq!(url.as_str(), "http://10.0.0.2:5000/api/ac/status");
    }

    #[tokio::test]
    async fn post_bodies_must_be_json_or_empty() {
        let app = axum::Router::new()
            .route("/api/garbled", axum::routing::post(|| async { "<html>queued</html>" }))
            .route("/api/empty", axum::routing::post(|| async {}))
            .route(
                "/api/json",
                axum::routing::post(|| async { axum::Json(serde_json::json!({"ok": true})) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let c = client(&format!("http://{addr}"));
        let body = serde_json::json!({"action": "turn_on"});
        assert!(matches!(
            c.post_json("/api/garbled", &body).await,
            Err(TransportError::InvalidJson(_))
        ));
        assert_eq!(c.post_json("/api/empty", &body).await.unwrap(), Value::Null);
        assert_eq!(
            c.post_json("/api/json", &body).await.unwrap(),
            serde_json::json!({"ok": true})
        );
    }

    #[test]
    fn snapshot_kinds() {
        assert_eq!(Snapshot::AcStatus.event_kind(), Some("ac_snapshot"));
        assert_eq!(Snapshot::GcodeList.event_kind(), None);
    }
}
