//! HEAD existence check.

use super::{prepare, FetchError, RequestOptions};

/// Performs a HEAD request (following redirects) and returns the final status code.
pub fn head_status(url: &str, opts: &RequestOptions) -> Result<u32, FetchError> {
    let mut easy = prepare(url, opts)?;
    easy.nobody(true)?;
    easy.perform()?;
    Ok(easy.response_code()?)
}
