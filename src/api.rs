// CMS client module: a small blocking HTTP client that talks to the
// WordPress REST API (and the legacy XML-RPC endpoint). Each method here is
// exactly one request/response cycle; choosing between them is the job of
// `strategy`.

use crate::config::ServerConfig;
use crate::error::{ConfigError, Error, Result};
use crate::source::Payload;
use crate::xmlrpc;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Header carrying the shared secret for the sideload endpoint.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Media id and public URL reported by whichever endpoint accepted the upload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MediaResponse {
    pub id: u64,
    pub source_url: String,
}

/// Wire shape of the REST media and sideload replies. Sideload plugins answer
/// with `url`, `source_url` or both; `source_url` wins when both are present.
#[derive(Deserialize, Debug)]
struct MediaReply {
    id: u64,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl MediaReply {
    fn into_response(self, body: &str) -> Result<MediaResponse> {
        let source_url = self
            .source_url
            .or(self.url)
            .ok_or_else(|| Error::Decode(format!("media reply without source_url or url: {body}")))?;
        Ok(MediaResponse {
            id: self.id,
            source_url,
        })
    }
}

/// Profile returned by `users/me`. Fields beyond the common ones are kept in
/// `extra` so `whoami --json` can show everything the server sent.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Fixed liveness payload. Answering it never touches the network.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Health {
    pub status: String,
}

pub fn health() -> Health {
    Health {
        status: "ok".into(),
    }
}

#[derive(Serialize)]
struct SideloadRequest<'a> {
    url: &'a str,
}

/// Blocking client bound to one server configuration.
#[derive(Clone)]
pub struct MediaClient {
    client: Client,
    config: ServerConfig,
}

impl MediaClient {
    /// Build the HTTP client. The blocking client's default 30s timeout is
    /// replaced with the configured one (none unless `WP_TIMEOUT_SECS` is set).
    pub fn new(config: ServerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|source| Error::Transport {
                url: config.base_url().to_string(),
                source,
            })?;
        Ok(MediaClient { client, config })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Underlying HTTP client, shared with the content resolver.
    pub fn http(&self) -> &Client {
        &self.client
    }

    fn basic_auth(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let creds = self.config.require_basic()?;
        Ok(req.header(AUTHORIZATION, creds.header_value()))
    }

    fn send(&self, url: &str, req: RequestBuilder) -> Result<Response> {
        req.send().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// Body of a 2xx reply. Non-2xx replies become `Auth`/`Upload` errors with
    /// the body kept verbatim; a 2xx body that cannot be read is a transport
    /// failure.
    fn success_body(url: &str, res: Response) -> Result<String> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(Error::from_status(status.as_u16(), body));
        }
        res.text().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })
    }

    fn json_or_error<T: DeserializeOwned>(url: &str, res: Response) -> Result<T> {
        let body = Self::success_body(url, res)?;
        serde_json::from_str(&body).map_err(|e| Error::Decode(format!("{e}: {body}")))
    }

    fn media_or_error(url: &str, res: Response) -> Result<MediaResponse> {
        let body = Self::success_body(url, res)?;
        let reply: MediaReply =
            serde_json::from_str(&body).map_err(|e| Error::Decode(format!("{e}: {body}")))?;
        reply.into_response(&body)
    }

    /// POST the raw bytes with `Content-Disposition: attachment`.
    pub fn upload_binary(&self, payload: &Payload) -> Result<MediaResponse> {
        let url = self.config.media_endpoint();
        let disposition = content_disposition(payload.filename())?;
        debug!(%url, filename = payload.filename(), bytes = payload.len(), "binary upload");

        let req = self
            .client
            .post(&url)
            .header(CONTENT_DISPOSITION, disposition)
            .header(CONTENT_TYPE, payload.content_type())
            .body(payload.bytes().to_vec());
        let res = self.send(&url, self.basic_auth(req)?)?;
        Self::media_or_error(&url, res)
    }

    /// POST a multipart form with a single `file` field.
    pub fn upload_multipart(&self, payload: &Payload) -> Result<MediaResponse> {
        let url = self.config.media_endpoint();
        debug!(%url, filename = payload.filename(), bytes = payload.len(), "multipart upload");

        let part = multipart::Part::bytes(payload.bytes().to_vec())
            .file_name(payload.filename().to_string())
            .mime_str(payload.content_type())
            .map_err(|source| Error::Transport {
                url: url.clone(),
                source,
            })?;
        let form = multipart::Form::new().part("file", part);

        let req = self.client.post(&url).multipart(form);
        let res = self.send(&url, self.basic_auth(req)?)?;
        Self::media_or_error(&url, res)
    }

    /// Ask the server to fetch `source_url` itself.
    pub fn sideload(&self, source_url: &str) -> Result<MediaResponse> {
        let url = self.config.sideload_endpoint();
        let key = self
            .config
            .api_key()
            .ok_or(ConfigError::Missing("WP_API_KEY"))?;
        debug!(%url, source = source_url, "sideload request");

        let req = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, key)
            .json(&SideloadRequest { url: source_url });
        let res = self.send(&url, req)?;
        Self::media_or_error(&url, res)
    }

    /// Legacy `wp.uploadFile` over XML-RPC. The public URL is derived from the
    /// uploads directory convention and the relative path the call returns.
    pub fn upload_xmlrpc(&self, payload: &Payload) -> Result<MediaResponse> {
        let url = self.config.xmlrpc_endpoint();
        let creds = self.config.require_basic()?;
        debug!(%url, filename = payload.filename(), bytes = payload.len(), "xml-rpc upload");

        let body = xmlrpc::upload_file_call(
            &creds.username,
            &creds.secret,
            payload.filename(),
            payload.content_type(),
            payload.bytes(),
        );
        let req = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body);
        let res = self.send(&url, req)?;
        let text = Self::success_body(&url, res)?;

        let uploaded = xmlrpc::parse_upload_response(&text)?;
        let source_url = match (uploaded.file.as_deref(), uploaded.url) {
            (Some(file), _) => self.config.public_upload_url(file),
            (None, Some(url)) => url,
            (None, None) => {
                return Err(Error::Decode(format!(
                    "xml-rpc response without file or url: {text}"
                )))
            }
        };
        Ok(MediaResponse {
            id: uploaded.id,
            source_url,
        })
    }

    /// Check that the configured credentials authenticate.
    pub fn whoami(&self) -> Result<UserProfile> {
        let url = self.config.users_me_endpoint();
        let req = self.basic_auth(self.client.get(&url))?;
        let res = self.send(&url, req)?;
        Self::json_or_error(&url, res)
    }
}

/// `attachment; filename="<name>"`. Quotes and control characters are
/// dropped from the name; non-ASCII bytes are passed through as obs-text.
fn content_disposition(filename: &str) -> Result<HeaderValue> {
    let clean: String = filename
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    if clean.is_empty() {
        return Err(Error::InvalidFilename(filename.to_string()));
    }
    HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", clean).as_bytes())
        .map_err(|_| Error::InvalidFilename(filename.to_string()))
}
