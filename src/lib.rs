// Library root
// -----------
// Fetch an image from a local path or a URL and push it into a WordPress
// media library. The binary (`main.rs`) is a thin clap front-end over these
// modules.
//
// Module responsibilities:
// - `config`: immutable server configuration read from the environment.
// - `source`: resolves a path or URL into bytes plus a filename.
// - `api`: one method per HTTP round trip against the CMS.
// - `strategy`: picks the upload strategy and applies the 403 fallback.
// - `xmlrpc`, `mime`: encoding helpers for the above.
// - `ui`: command handlers that print results for the CLI.
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod mime;
pub mod source;
pub mod strategy;
pub mod ui;
pub mod xmlrpc;

pub use api::{MediaClient, UserProfile};
pub use config::{ServerConfig, UploadMode};
pub use error::{ConfigError, Error, FetchError, Result};
pub use source::Payload;
pub use strategy::{Strategy, UploadResult};
