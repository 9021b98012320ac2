// Content resolver: turns a source descriptor (local path or http(s) URL)
// into an immutable payload of bytes plus the filename it will be uploaded
// under.

use crate::error::FetchError;
use crate::mime;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use url::Url;

/// Some image hosts refuse requests without a browser-looking agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// A source descriptor after classification by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Remote(Url),
    Local(PathBuf),
}

impl Source {
    /// `http`/`https` URLs are remote; anything else is a filesystem path.
    pub fn classify(descriptor: &str) -> Self {
        match Url::parse(descriptor) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Source::Remote(url),
            _ => Source::Local(PathBuf::from(descriptor)),
        }
    }

    /// Last path segment, if there is a usable one.
    pub fn filename(&self) -> Option<String> {
        match self {
            Source::Remote(url) => filename_from_url(url),
            Source::Local(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }
}

fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Name used when the source has no path segment to borrow one from.
pub fn generated_filename(content_type: Option<&str>) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let ext = content_type.and_then(mime::extension_for).unwrap_or("bin");
    format!("upload-{}.{}", secs, ext)
}

/// Bytes to upload plus the name and content type they go up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
    filename: String,
    content_type: &'static str,
}

impl Payload {
    /// The content type is guessed from the filename extension.
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let content_type = mime::guess(&filename);
        Payload {
            bytes,
            filename,
            content_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Resolve `descriptor` into a payload. Remote sources cost exactly one GET.
pub fn resolve(client: &Client, descriptor: &str) -> Result<Payload, FetchError> {
    match Source::classify(descriptor) {
        Source::Remote(url) => fetch_remote(client, &url),
        Source::Local(path) => read_local(&path),
    }
}

fn fetch_remote(client: &Client, url: &Url) -> Result<Payload, FetchError> {
    debug!(%url, "fetching remote source");
    let res = client
        .get(url.clone())
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().unwrap_or_default();
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = res.bytes().map_err(|source| FetchError::Network {
        url: url.to_string(),
        source,
    })?;

    let filename = filename_from_url(url)
        .unwrap_or_else(|| generated_filename(content_type.as_deref()));
    debug!(%url, bytes = bytes.len(), %filename, "remote source fetched");
    Ok(Payload::new(bytes.to_vec(), filename))
}

fn read_local(path: &Path) -> Result<Payload, FetchError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FetchError::NotFound(path.to_path_buf())
        } else {
            FetchError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let filename = Source::Local(path.to_path_buf())
        .filename()
        .unwrap_or_else(|| generated_filename(None));
    Ok(Payload::new(bytes, filename))
}
