// Upload strategy resolver.
//
// Each declared [`UploadMode`] expands into an ordered plan of strategies.
// The first step runs; if it fails with 403 Forbidden and another step
// follows, the next step runs instead. Any other outcome ends the plan.

use crate::api::{MediaClient, MediaResponse};
use crate::config::UploadMode;
use crate::error::{Error, Result};
use crate::source::{self, Payload, Source};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// One request/response cycle against the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Binary,
    Multipart,
    Sideload,
    XmlRpc,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Binary => "binary",
            Strategy::Multipart => "multipart",
            Strategy::Sideload => "sideload",
            Strategy::XmlRpc => "xmlrpc",
        }
    }

    /// Whether this strategy needs the bytes client-side.
    pub fn needs_payload(self) -> bool {
        !matches!(self, Strategy::Sideload)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered strategies for a declared mode.
pub fn plan(mode: UploadMode) -> Vec<Strategy> {
    match mode {
        UploadMode::Binary => vec![Strategy::Binary, Strategy::XmlRpc],
        UploadMode::Multipart => vec![Strategy::Multipart, Strategy::XmlRpc],
        UploadMode::Sideload => vec![Strategy::Sideload],
    }
}

/// Media id and public URL, tagged with the strategy that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub id: u64,
    pub source_url: String,
    pub strategy: Strategy,
}

impl UploadResult {
    fn tagged(media: MediaResponse, strategy: Strategy) -> Self {
        UploadResult {
            id: media.id,
            source_url: media.source_url,
            strategy,
        }
    }
}

/// What a single strategy step gets to work with.
enum Input<'a> {
    Bytes(&'a Payload),
    Url(&'a str),
}

fn run_step(client: &MediaClient, step: Strategy, input: &Input<'_>) -> Result<MediaResponse> {
    match (step, input) {
        (Strategy::Binary, Input::Bytes(p)) => client.upload_binary(p),
        (Strategy::Multipart, Input::Bytes(p)) => client.upload_multipart(p),
        (Strategy::XmlRpc, Input::Bytes(p)) => client.upload_xmlrpc(p),
        (Strategy::Sideload, Input::Url(u)) => client.sideload(u),
        (Strategy::Sideload, Input::Bytes(p)) => {
            Err(Error::SideloadNeedsUrl(p.filename().to_string()))
        }
        (_, Input::Url(u)) => Err(Error::SideloadNeedsUrl((*u).to_string())),
    }
}

fn execute(client: &MediaClient, steps: &[Strategy], input: Input<'_>) -> Result<UploadResult> {
    for (i, &step) in steps.iter().enumerate() {
        info!(strategy = %step, "uploading");
        match run_step(client, step, &input) {
            Ok(media) => {
                info!(strategy = %step, id = media.id, url = %media.source_url, "upload accepted");
                return Ok(UploadResult::tagged(media, step));
            }
            Err(err) if err.is_forbidden() && i + 1 < steps.len() => {
                warn!(strategy = %step, next = %steps[i + 1], error = %err, "server answered 403, falling back");
            }
            Err(err) => return Err(err),
        }
    }
    // plan() always yields at least one step, and the last step returns.
    unreachable!("strategy plan was empty")
}

/// Upload an already-resolved payload using the configured mode. Sideload
/// cannot be used here because there is no source URL to hand the server.
pub fn upload_payload(client: &MediaClient, payload: &Payload) -> Result<UploadResult> {
    let steps = plan(client.config().mode());
    execute(client, &steps, Input::Bytes(payload))
}

/// Resolve `descriptor` and upload it with the configured mode.
pub fn upload(client: &MediaClient, descriptor: &str) -> Result<UploadResult> {
    upload_with_mode(client, descriptor, client.config().mode())
}

/// Like [`upload`] but with an explicit mode instead of the configured one.
///
/// In sideload mode the source is never fetched client-side: the server gets
/// the URL and does the fetching.
pub fn upload_with_mode(
    client: &MediaClient,
    descriptor: &str,
    mode: UploadMode,
) -> Result<UploadResult> {
    let steps = plan(mode);
    if steps.iter().any(|s| s.needs_payload()) {
        let payload = source::resolve(client.http(), descriptor)?;
        info!(filename = payload.filename(), bytes = payload.len(), "source resolved");
        return execute(client, &steps, Input::Bytes(&payload));
    }

    match Source::classify(descriptor) {
        Source::Remote(_) => execute(client, &steps, Input::Url(descriptor)),
        Source::Local(_) => Err(Error::SideloadNeedsUrl(descriptor.to_string())),
    }
}
