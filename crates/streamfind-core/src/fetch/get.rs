//! Bounded GET returning the (lossily decoded) body.

use super::{prepare, FetchError, RequestOptions};

/// Bodies larger than this are truncated; pages and embeds are far smaller.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Result of a GET: final status after redirects and the body text.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u32,
    pub body: String,
}

/// GETs `url` and returns status and body. HTTP error statuses are not errors
/// here; callers decide what a 4xx/5xx means for them.
pub fn get_text(url: &str, opts: &RequestOptions) -> Result<Fetched, FetchError> {
    let (status, bytes) = get_bytes(url, opts, MAX_BODY_BYTES)?;
    Ok(Fetched {
        status,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// GETs at most `limit` bytes of `url`'s body.
pub fn get_prefix(url: &str, opts: &RequestOptions, limit: usize) -> Result<(u32, Vec<u8>), FetchError> {
    get_bytes(url, opts, limit)
}

fn get_bytes(url: &str, opts: &RequestOptions, limit: usize) -> Result<(u32, Vec<u8>), FetchError> {
    let mut easy = prepare(url, opts)?;
    easy.get(true)?;

    let mut body: Vec<u8> = Vec::new();
    let mut truncated = false;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            let room = limit.saturating_sub(body.len());
            if data.len() > room {
                body.extend_from_slice(&data[..room]);
                truncated = true;
                // Short write makes libcurl abort the transfer.
                return Ok(0);
            }
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()
    };
    match performed {
        Ok(()) => {}
        Err(e) if truncated && e.is_write_error() => {
            tracing::debug!("GET {} truncated at {} bytes", url, limit);
        }
        Err(e) => return Err(e.into()),
    }

    let status = easy.response_code()?;
    Ok((status, body))
}
