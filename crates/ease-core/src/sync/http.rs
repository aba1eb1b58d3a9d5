use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

use super::api::{
    ApiErrorBody, CreateReflectionRequest, CreateWorryRequest, ReflectionEnvelope,
    RegisterRequest, RegisteredAccount, RemoteRecord, RemoteSettings, SettingsEnvelope,
    UpdateWorryStatusRequest, WorryStatus,
};
use super::{RemoteSync, SyncError};
use crate::model::ValidationError;

/// Cookie the web app's auth layer reads the session token from.
pub const DEFAULT_SESSION_COOKIE: &str = "next-auth.session-token";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking JSON client for the Ease web API.
#[derive(Debug, Clone)]
pub struct HttpSync {
    base_url: String,
    session: Option<String>,
    cookie_name: String,
    agent: ureq::Agent,
}

impl HttpSync {
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("ease/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            agent,
        }
    }

    #[must_use]
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send<B, T>(
        &self,
        method: &str,
        path: &str,
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<T, SyncError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let mut request = self
            .agent
            .request(method, &url)
            .set("Accept", "application/json");

        if authenticated {
            let Some(token) = &self.session else {
                return Err(SyncError::Unauthorized);
            };
            request = request.set("Cookie", &format!("{}={token}", self.cookie_name));
        }

        tracing::debug!(method, url = %url, "remote request");
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(response) => response.into_json::<T>().map_err(|err| SyncError::Decode {
                url,
                reason: err.to_string(),
            }),
            Err(ureq::Error::Status(401, _)) => Err(SyncError::Unauthorized),
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_json::<ApiErrorBody>()
                    .map_or_else(|_| format!("HTTP {status}"), |body| body.error);
                Err(SyncError::Api { status, message })
            }
            Err(ureq::Error::Transport(transport)) => Err(SyncError::Transport {
                url,
                reason: transport.to_string(),
            }),
        }
    }
}

impl RemoteSync for HttpSync {
    fn create_worry(&self, request: &CreateWorryRequest) -> Result<RemoteRecord, SyncError> {
        request.validate()?;
        self.send("POST", "/api/worries", Some(request), true)
    }

    fn update_worry_status(&self, remote_id: &str, status: WorryStatus) -> Result<(), SyncError> {
        if !status.is_patchable() {
            return Err(SyncError::Invalid(ValidationError::Format {
                field: "status",
                reason: "only RESOLVED or ARCHIVED may be set",
            }));
        }
        let path = format!("/api/worries/{remote_id}");
        let _: serde_json::Value = self.send(
            "PATCH",
            &path,
            Some(&UpdateWorryStatusRequest { status }),
            true,
        )?;
        Ok(())
    }

    fn create_reflection(
        &self,
        request: &CreateReflectionRequest,
    ) -> Result<RemoteRecord, SyncError> {
        let envelope: ReflectionEnvelope =
            self.send("POST", "/api/reflections", Some(request), true)?;
        Ok(envelope.reflection)
    }

    fn load_settings(&self) -> Result<Option<RemoteSettings>, SyncError> {
        let envelope: SettingsEnvelope =
            self.send::<(), _>("GET", "/api/user/settings", None, true)?;
        Ok(envelope.settings)
    }

    fn save_settings(&self, settings: &RemoteSettings) -> Result<(), SyncError> {
        settings.validate()?;
        let _: serde_json::Value = self.send("POST", "/api/user/settings", Some(settings), true)?;
        Ok(())
    }

    fn register(&self, request: &RegisterRequest) -> Result<RegisteredAccount, SyncError> {
        request.validate()?;
        self.send("POST", "/api/auth/register", Some(request), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::api::ApiCategory;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve exactly one request with a canned response and hand back the
    /// raw request text.
    fn one_shot(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0_usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut body = vec![0_u8; content_length];
            reader.read_exact(&mut body).unwrap();
            head.push_str(&String::from_utf8_lossy(&body));

            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            tx.send(head).unwrap();
        });

        (format!("http://{addr}"), rx)
    }

    fn worry_request() -> CreateWorryRequest {
        CreateWorryRequest {
            title: "Interview".into(),
            description: Some("I might fail".into()),
            category: ApiCategory::Work,
            body_feeling: None,
            intensity: 7,
        }
    }

    #[test]
    fn create_worry_sends_session_cookie_and_reads_id() {
        let (base, seen) = one_shot("201 Created", r#"{"_id":"abc123","title":"Interview"}"#);
        let client = HttpSync::new(&base, DEFAULT_TIMEOUT).with_session("tok");

        let record = client.create_worry(&worry_request()).unwrap();
        assert_eq!(record.id, "abc123");

        let request = seen.recv().unwrap();
        assert!(request.starts_with("POST /api/worries "));
        assert!(request.contains("next-auth.session-token=tok"));
        assert!(request.contains(r#""title":"Interview""#));
    }

    #[test]
    fn missing_session_fails_before_sending() {
        let client = HttpSync::new("http://127.0.0.1:9", DEFAULT_TIMEOUT);
        assert!(matches!(
            client.create_worry(&worry_request()),
            Err(SyncError::Unauthorized)
        ));
    }

    #[test]
    fn invalid_request_is_not_sent() {
        let client = HttpSync::new("http://127.0.0.1:9", DEFAULT_TIMEOUT).with_session("tok");
        let mut request = worry_request();
        request.intensity = 0;
        assert!(matches!(
            client.create_worry(&request),
            Err(SyncError::Invalid(_))
        ));
        assert!(matches!(
            client.update_worry_status("id", WorryStatus::Active),
            Err(SyncError::Invalid(_))
        ));
    }

    #[test]
    fn api_error_body_is_surfaced() {
        let (base, _seen) = one_shot("409 Conflict", r#"{"error":"User already exists"}"#);
        let client = HttpSync::new(&base, DEFAULT_TIMEOUT);
        let err = client
            .register(&RegisterRequest {
                email: "a@b.c".into(),
                password: "pw".into(),
                name: None,
            })
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(err, SyncError::Api { message, .. } if message == "User already exists"));
    }

    #[test]
    fn unauthorized_status_maps_to_unauthorized() {
        let (base, _seen) = one_shot("401 Unauthorized", r#"{"error":"Unauthorized"}"#);
        let client = HttpSync::new(&base, DEFAULT_TIMEOUT).with_session("expired");
        assert!(matches!(client.load_settings(), Err(SyncError::Unauthorized)));
    }

    #[test]
    fn settings_load_reads_envelope() {
        let (base, seen) = one_shot(
            "200 OK",
            r#"{"settings":{"reflectionTime":"21:00","customCategories":[],"notifications":true}}"#,
        );
        let client = HttpSync::new(&base, DEFAULT_TIMEOUT)
            .with_session("tok")
            .with_cookie_name("__Secure-next-auth.session-token");
        let settings = client.load_settings().unwrap().unwrap();
        assert_eq!(settings.reflection_time.as_deref(), Some("21:00"));
        assert!(seen
            .recv()
            .unwrap()
            .contains("__Secure-next-auth.session-token=tok"));
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpSync::new(&format!("http://{addr}/"), DEFAULT_TIMEOUT).with_session("tok");
        let err = client
            .update_worry_status("w1", WorryStatus::Resolved)
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport { .. }));
    }
}
