//! One-shot HTTP read of the source table.
//!
//! The fetch is the only network interaction in a run: a single GET with no
//! retry. Any failure, including a non-success status, aborts the run as
//! [`DivergenceError::Fetch`].

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::DivergenceError;

/// Fetches `url` and returns the response body as raw bytes.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, DivergenceError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| fetch_error(url, &e))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client
        .execute(req)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_error(url, &e))?;

    let body = resp.bytes().await.map_err(|e| fetch_error(url, &e))?;
    Ok(body.to_vec())
}

fn fetch_error(url: &str, e: &dyn std::fmt::Display) -> DivergenceError {
    DivergenceError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    }
}
