use super::{ DeliveryError, MessageSender };

use async_trait::async_trait;
use base64::{ engine::general_purpose::STANDARD, Engine as _ };
use chrono::{ DateTime, Utc };
use hmac::{ Hmac, Mac };
use log::debug;
use reqwest::{ Client as HttpClient, header::CONTENT_TYPE };
use serde::Serialize;
use sha2::{ Digest, Sha256 };
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("connection string is missing '{0}'")]
    MissingField(&'static str),
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("access key is not valid base64")]
    InvalidAccessKey,
}

/// Parsed `endpoint=...;accesskey=...` connection string.
#[derive(Clone)]
pub struct AcsConnection {
    pub endpoint: Url,
    access_key: Vec<u8>,
}

impl FromStr for AcsConnection {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut endpoint = None;
        let mut access_key = None;
        for part in s.split(';').filter(|p| !p.trim().is_empty()) {
            let mut kv = part.splitn(2, '=');
            let key = kv.next().unwrap_or("").trim().to_lowercase();
            let value = kv.next().unwrap_or("").trim();
            match key.as_str() {
                "endpoint" => {
                    endpoint = Some(value.to_string());
                }
                "accesskey" => {
                    access_key = Some(value.to_string());
                }
                _ => {}
            }
        }

        let endpoint = endpoint.ok_or(ConnectionStringError::MissingField("endpoint"))?;
        let access_key = access_key.ok_or(ConnectionStringError::MissingField("accesskey"))?;

        let normalized = format!("{}/", endpoint.trim_end_matches('/'));
        let endpoint = Url::parse(&normalized).map_err(|_|
            ConnectionStringError::InvalidEndpoint(endpoint.clone())
        )?;
        if endpoint.host_str().is_none() {
            return Err(ConnectionStringError::InvalidEndpoint(normalized));
        }
        let access_key = STANDARD.decode(access_key.as_bytes()).map_err(|_|
            ConnectionStringError::InvalidAccessKey
        )?;

        Ok(Self { endpoint, access_key })
    }
}

impl AcsConnection {
    /// HMAC-SHA256 request headers: `x-ms-date`, `x-ms-content-sha256` and `Authorization`.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        body: &[u8],
        now: DateTime<Utc>
    ) -> Result<Vec<(&'static str, String)>, DeliveryError> {
        let date = now.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let content_hash = STANDARD.encode(Sha256::digest(body));

        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            (None, _) => {
                return Err(DeliveryError::Signing(format!("URL has no host: {}", url)));
            }
        };
        let path_and_query = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        let string_to_sign = format!("{}\n{}\n{};{};{}", method, path_and_query, date, host, content_hash);
        let mut mac = HmacSha256::new_from_slice(&self.access_key).map_err(|e|
            DeliveryError::Signing(e.to_string())
        )?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(
            vec![
                ("x-ms-date", date),
                ("x-ms-content-sha256", content_hash),
                (
                    "Authorization",
                    format!(
                        "HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature={}",
                        signature
                    ),
                )
            ]
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextNotificationContent<'a> {
    channel_registration_id: &'a Uuid,
    to: &'a [String],
    kind: &'a str,
    content: &'a str,
}

/// Client for the Azure Communication Services advanced messaging API.
pub struct AcsNotificationClient {
    http: HttpClient,
    connection: AcsConnection,
    send_url: Url,
}

impl AcsNotificationClient {
    pub fn new(
        connection: AcsConnection,
        api_version: &str,
        timeout: Duration
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut send_url = connection.endpoint.join("messages/notifications:send")?;
        send_url.query_pairs_mut().append_pair("api-version", api_version);
        let http = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self { http, connection, send_url })
    }

    pub fn send_url(&self) -> &Url {
        &self.send_url
    }
}

#[async_trait]
impl MessageSender for AcsNotificationClient {
    async fn send_text(
        &self,
        channel_registration_id: &Uuid,
        to: &[String],
        content: &str
    ) -> Result<(), DeliveryError> {
        let payload = TextNotificationContent {
            channel_registration_id,
            to,
            kind: "text",
            content,
        };
        let body = serde_json::to_vec(&payload).map_err(|e| DeliveryError::Signing(e.to_string()))?;
        let headers = self.connection.sign("POST", &self.send_url, &body, Utc::now())?;

        let mut req = self.http
            .post(self.send_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        for (name, value) in headers {
            req = req.header(name, value);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Service { status: status.as_u16(), message });
        }
        debug!("Notification accepted with status {}", status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CONN: &str = "endpoint=https://acs-demo.communication.azure.com/;accesskey=c2VjcmV0LWtleQ==";

    #[test]
    fn parses_connection_string() {
        let conn: AcsConnection = CONN.parse().unwrap();
        assert_eq!(conn.endpoint.as_str(), "https://acs-demo.communication.azure.com/");
        assert_eq!(conn.access_key, b"secret-key".to_vec());
    }

    #[test]
    fn parses_without_trailing_slash_and_mixed_case_keys() {
        let conn: AcsConnection = "Endpoint=https://acs.example.com;AccessKey=a2V5"
            .parse()
            .unwrap();
        assert_eq!(conn.endpoint.as_str(), "https://acs.example.com/");
    }

    #[test]
    fn rejects_incomplete_connection_string() {
        assert_eq!(
            "endpoint=https://acs.example.com/".parse::<AcsConnection>().err(),
            Some(ConnectionStringError::MissingField("accesskey"))
        );
        assert_eq!(
            "endpoint=https://acs.example.com/;accesskey=***".parse::<AcsConnection>().err(),
            Some(ConnectionStringError::InvalidAccessKey)
        );
    }

    #[test]
    fn send_url_includes_api_version() {
        let client = AcsNotificationClient::new(
            CONN.parse().unwrap(),
            "2024-02-01",
            Duration::from_secs(5)
        ).unwrap();
        assert_eq!(
            client.send_url().as_str(),
            "https://acs-demo.communication.azure.com/messages/notifications:send?api-version=2024-02-01"
        );
    }

    #[test]
    fn signing_produces_expected_headers() {
        let conn: AcsConnection = CONN.parse().unwrap();
        let url = Url::parse("https://acs-demo.communication.azure.com/messages/notifications:send?api-version=2024-02-01").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 5, 3, 14, 30, 0).unwrap();

        let headers = conn.sign("POST", &url, b"", now).unwrap();

        assert_eq!(headers[0], ("x-ms-date", "Sat, 03 May 2025 14:30:00 GMT".to_string()));
        assert_eq!(
            headers[1],
            ("x-ms-content-sha256", "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=".to_string())
        );
        assert_eq!(
            headers[2],
            (
                "Authorization",
                "HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature=9eK9qhOORahQdq1uNzEpGKIhn5sCUk959KTAAOXjBlE=".to_string(),
            )
        );

        let again = conn.sign("POST", &url, b"", now).unwrap();
        assert_eq!(headers, again);
        let other_body = conn.sign("POST", &url, b"{}", now).unwrap();
        assert_ne!(headers[2], other_body[2]);
    }
}
