//! Connection URL for the remote-control channel.
//!
//! ```text
//! wss://<host>:<port>/api/v2/channels/samsung.remote.control?name=<base64(app)>&token=<token>
//! ```
//!
//! The encoded name is also what the TV echoes back in its paired-client
//! list, so it must be derived the same way every time.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::config::RemoteConfig;
use crate::error::TvError;

/// Base64 (standard alphabet, padded) of the application name.
pub fn encoded_app_name(app_name: &str) -> String {
    STANDARD.encode(app_name.as_bytes())
}

/// Build the channel URL from `config`.
///
/// `token` is only appended when the config carries a non-empty token, and
/// is percent-encoded so it reaches the TV unchanged. The base64 name is
/// sent as-is, padding included.
pub fn build_url(config: &RemoteConfig) -> Result<Url, TvError> {
    // Bare IPv6 literals need brackets to be read as a host.
    let host = if config.host.contains(':') && !config.host.starts_with('[') {
        format!("[{}]", config.host)
    } else {
        config.host.clone()
    };
    let path = config.path.trim_start_matches('/');

    let mut raw = format!(
        "{}://{}:{}/{}?name={}",
        config.scheme,
        host,
        config.port,
        path,
        encoded_app_name(&config.app_name)
    );
    if let Some(token) = config.token() {
        raw.push_str("&token=");
        raw.extend(byte_serialize(token.as_bytes()));
    }

    let url = Url::parse(&raw).map_err(|e| TvError::UrlConstructionFailed(e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(TvError::UrlConstructionFailed("missing host".into()));
    }
    Ok(url)
}

// ── Tests ────────────────────────────────────────────────────────
