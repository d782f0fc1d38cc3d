//! GitHub blob-page URL rewriting
//!
//! `https://github.com/<owner>/<repo>/blob/<ref>/<path>` serves an HTML page;
//! the file itself lives at `https://raw.githubusercontent.com/<owner>/<repo>/<ref>/<path>`.

use url::Url;

use crate::constants::http::{GITHUB_HOST, GITHUB_RAW_HOST};
use crate::errors::{DownloadError, DownloadResult};

/// Raw-content URL for a GitHub blob page, or None if `url` is not one.
///
/// Release asset links are left alone since they already serve the file.
pub fn convert_github_url(url: &Url) -> Option<Url> {
    if url.host_str() != Some(GITHUB_HOST) {
        return None;
    }

    let path = url.path();
    if !path.contains("/blob/") || path.contains("/releases/") {
        return None;
    }

    let mut raw = url.clone();
    raw.set_host(Some(GITHUB_RAW_HOST)).ok()?;
    raw.set_path(&path.replacen("/blob/", "/", 1));
    Some(raw)
}

/// Parse a configured URL, rewriting GitHub blob pages to raw content
pub fn resolve_download_url(raw: &str) -> DownloadResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| DownloadError::InvalidUrl {
        url: raw.to_string(),
        error: e.to_string(),
    })?;
    Ok(convert_github_url(&url).unwrap_or(url))
}
