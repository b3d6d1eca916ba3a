pub mod checksum;
pub mod options;
pub mod response;

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use options::CreateOptions;
use response::{Meeting, Recording};

/// How many `getMeetingInfo` polls `end` makes before giving up.
const END_CONFIRM_ATTEMPTS: u32 = 10;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum BbbError {
    Http(reqwest::Error),
    Url(url::ParseError),
    Xml(String),
    Failed { message_key: String, message: String },
}

impl fmt::Display for BbbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BbbError::Http(e) => write!(f, "HTTP error: {e}"),
            BbbError::Url(e) => write!(f, "invalid URL: {e}"),
            BbbError::Xml(e) => write!(f, "bad response body: {e}"),
            BbbError::Failed { message_key, message } => {
                write!(f, "server returned {message_key}: {message}")
            }
        }
    }
}

impl From<reqwest::Error> for BbbError {
    fn from(e: reqwest::Error) -> Self {
        BbbError::Http(e)
    }
}

impl From<url::ParseError> for BbbError {
    fn from(e: url::ParseError) -> Self {
        BbbError::Url(e)
    }
}

/// Client for a BigBlueButton-compatible conferencing API. Every request
/// carries its parameters as query fields plus a `checksum` computed over the
/// action name, the canonical parameter encoding, and the shared secret.
pub struct Bbb {
    base: Url,
    secret: String,
    http: Client,
    poll_interval: Duration,
}

impl Bbb {
    pub fn new(base_url: &str, secret: &str) -> Result<Self, BbbError> {
        let mut base = Url::parse(base_url)?;
        // Url::join treats the last path segment as a file unless the path
        // ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            secret: secret.to_string(),
            http: Client::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Override the spacing between `end` confirmation polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build the signed URL for an action. Signing is skipped when the
    /// parameters already carry a `checksum` field.
    fn make_url(&self, action: &str, mut params: Vec<(String, String)>) -> Result<Url, BbbError> {
        if !params.iter().any(|(key, _)| key == "checksum") {
            let canonical = checksum::canonical_query(&params);
            params.push((
                "checksum".to_string(),
                checksum::checksum(action, &canonical, &self.secret),
            ));
        }
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let mut url = self.base.join(action)?;
        url.query_pairs_mut()
            .clear()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(url)
    }

    async fn call(&self, action: &str, params: Vec<(String, String)>) -> Result<String, BbbError> {
        let url = self.make_url(action, params)?;
        let response = self.http.get(url).send().await?;
        Ok(response.text().await?)
    }

    /// Create a meeting. When `options.documents` is non-empty the request is
    /// a POST carrying the generated `<modules>` body; otherwise it is a
    /// query-only GET. The choice depends solely on document content.
    pub async fn create(
        &self,
        meeting_id: &str,
        options: &CreateOptions,
    ) -> Result<Meeting, BbbError> {
        let mut params = vec![("meetingID".to_string(), meeting_id.to_string())];
        params.extend(options.params());
        let url = self.make_url("create", params)?;

        let response = if options.documents.is_empty() {
            self.http.get(url).send().await?
        } else {
            let body = options::modules_xml(&options.documents);
            self.http
                .post(url)
                .header("Content-Type", "text/xml")
                .body(body)
                .send()
                .await?
        };
        response::meeting(&response.text().await?)
    }

    /// Build the signed join URL for a participant. No request is issued; the
    /// URL is handed to the client to open itself. Extra parameters are
    /// passed through to the server.
    pub fn join_url(
        &self,
        full_name: &str,
        meeting_id: &str,
        password: &str,
        extra: &[(String, String)],
    ) -> Result<String, BbbError> {
        let mut params = vec![
            ("fullName".to_string(), full_name.to_string()),
            ("meetingID".to_string(), meeting_id.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        params.extend_from_slice(extra);
        Ok(self.make_url("join", params)?.to_string())
    }

    pub async fn is_meeting_running(&self, meeting_id: &str) -> bool {
        let params = vec![("meetingID".to_string(), meeting_id.to_string())];
        match self.call("isMeetingRunning", params).await {
            Ok(body) => response::bool_field(&body, "running").unwrap_or(false),
            Err(_) => false,
        }
    }

    /// End a meeting and confirm it is gone by polling `getMeetingInfo` up to
    /// a fixed bound. Any poll error -- a FAILED returncode, an undecodable
    /// body, or a transport failure -- counts as confirmation. That conflates
    /// "meeting gone" with "info request failed"; it is the documented
    /// behavior of this endpoint, kept as-is.
    pub async fn end(&self, meeting_id: &str, password: &str) -> bool {
        let params = vec![
            ("meetingID".to_string(), meeting_id.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        if self.call("end", params).await.is_err() {
            return false;
        }
        for _ in 0..END_CONFIRM_ATTEMPTS {
            if self.meeting_info(meeting_id, password).await.is_err() {
                return true;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        false
    }

    pub async fn meeting_info(
        &self,
        meeting_id: &str,
        password: &str,
    ) -> Result<Meeting, BbbError> {
        let params = vec![
            ("meetingID".to_string(), meeting_id.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        let body = self.call("getMeetingInfo", params).await?;
        response::meeting(&body)
    }

    /// List all meetings. Failures yield an empty list.
    pub async fn meetings(&self) -> Vec<Meeting> {
        match self.call("getMeetings", Vec::new()).await {
            Ok(body) => response::meetings(&body).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// List recordings, optionally filtered to the given meeting IDs.
    /// Failures yield an empty list.
    pub async fn recordings(&self, meeting_ids: &[String]) -> Vec<Recording> {
        let mut params = Vec::new();
        if !meeting_ids.is_empty() {
            params.push(("meetingID".to_string(), meeting_ids.join(",")));
        }
        match self.call("getRecordings", params).await {
            Ok(body) => response::recordings(&body).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Publish or unpublish recordings. An empty ID list short-circuits to
    /// `false` without issuing a request.
    pub async fn publish_recordings(&self, record_ids: &[String], publish: bool) -> bool {
        if record_ids.is_empty() {
            return false;
        }
        let params = vec![
            ("recordID".to_string(), record_ids.join(",")),
            ("publish".to_string(), publish.to_string()),
        ];
        match self.call("publishRecordings", params).await {
            Ok(body) => response::bool_field(&body, "published").unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Delete recordings. An empty ID list short-circuits to `false`.
    pub async fn delete_recordings(&self, record_ids: &[String]) -> bool {
        if record_ids.is_empty() {
            return false;
        }
        let params = vec![("recordID".to_string(), record_ids.join(","))];
        match self.call("deleteRecordings", params).await {
            Ok(body) => response::bool_field(&body, "deleted").unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Unsigned GET of the API base URL; failures yield an empty string.
    pub async fn server_version(&self) -> String {
        let response = match self.http.get(self.base.clone()).send().await {
            Ok(r) => r,
            Err(_) => return String::new(),
        };
        match response.text().await {
            Ok(body) => response::text_field(&body, "version").unwrap_or_default(),
            Err(_) => String::new(),
        }
    }
}
