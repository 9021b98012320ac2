// Legacy `wp.uploadFile` call over XML-RPC: request encoding and a small
// response scanner. Only the shapes WordPress returns for this one method are
// understood; this is not a general XML-RPC implementation.

use crate::error::Error;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

const BLOG_ID: u32 = 1;

static MEMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<member>\s*<name>\s*([^<]*?)\s*</name>\s*<value>\s*(?:<(?:string|int|i4|i8|boolean|double)>)?(<!\[CDATA\[.*?\]\]>|[^<]*)",
    )
    .expect("static regex")
});

/// Successful `wp.uploadFile` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: u64,
    /// Path relative to the uploads directory, when the server reports one.
    pub file: Option<String>,
    /// Absolute URL as reported by the server.
    pub url: Option<String>,
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode character data: a CDATA section is taken literally, otherwise the
/// five predefined entities and decimal/hex character references are expanded.
/// Unknown or malformed references are kept as written.
fn unescape(s: &str) -> String {
    if let Some(inner) = s
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
    {
        return inner.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let c = match &rest[1..semi] {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                r if r.starts_with("#x") || r.starts_with("#X") => {
                    u32::from_str_radix(&r[2..], 16).ok().and_then(char::from_u32)
                }
                r if r.starts_with('#') => r[1..].parse::<u32>().ok().and_then(char::from_u32),
                _ => None,
            }?;
            Some((c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Body of a `wp.uploadFile` method call.
pub fn upload_file_call(
    username: &str,
    secret: &str,
    name: &str,
    content_type: &str,
    bits: &[u8],
) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\"?>",
            "<methodCall><methodName>wp.uploadFile</methodName><params>",
            "<param><value><int>{blog}</int></value></param>",
            "<param><value><string>{user}</string></value></param>",
            "<param><value><string>{secret}</string></value></param>",
            "<param><value><struct>",
            "<member><name>name</name><value><string>{name}</string></value></member>",
            "<member><name>type</name><value><string>{ty}</string></value></member>",
            "<member><name>bits</name><value><base64>{bits}</base64></value></member>",
            "<member><name>overwrite</name><value><boolean>0</boolean></value></member>",
            "</struct></value></param>",
            "</params></methodCall>"
        ),
        blog = BLOG_ID,
        user = escape(username),
        secret = escape(secret),
        name = escape(name),
        ty = escape(content_type),
        bits = STANDARD.encode(bits),
    )
}

fn members(body: &str) -> HashMap<String, String> {
    MEMBER_RE
        .captures_iter(body)
        .map(|c| (c[1].to_string(), unescape(c[2].trim())))
        .collect()
}

/// Decode a method response. Faults become `Auth` (code 403) or `Upload`
/// errors carrying the raw body.
pub fn parse_upload_response(body: &str) -> Result<UploadedFile, Error> {
    let fields = members(body);

    if body.contains("<fault>") {
        let code = fields
            .get("faultCode")
            .and_then(|c| c.parse::<u16>().ok())
            .unwrap_or(500);
        return Err(Error::from_status(code, body.to_string()));
    }

    let id = fields
        .get("id")
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| Error::Decode(format!("xml-rpc response without numeric id: {body}")))?;

    let non_empty = |k: &str| fields.get(k).filter(|v| !v.is_empty()).cloned();
    Ok(UploadedFile {
        id,
        file: non_empty("file"),
        url: non_empty("url"),
    })
}
