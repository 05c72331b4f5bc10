//! Best-effort asset acquisition: vendor page scraping and chunked
//! download with progress reporting.
//!
//! Download links are not stable URLs; they are scraped from a vendor
//! listing page with a fixed-prefix/fixed-suffix pattern. Both
//! resolution and download are single-attempt by contract - retry and
//! backoff are the caller's business, and "no link found" is a normal,
//! reportable outcome rather than an error.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;

use crate::error::FetchError;
use crate::net::probe::Reachability;

/// Streaming chunk size for downloads.
const CHUNK_SIZE: usize = 64 * 1024;

/// Result of a download attempt that did not error.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Asset written to this temporary path, ready for one-shot install
    Downloaded(PathBuf),

    /// Network was unreachable at request time; nothing was attempted
    SkippedNoNetwork,
}

/// Resolves and retrieves vendor assets over HTTP.
pub struct AssetFetcher {
    client: reqwest::blocking::Client,
    probe: Box<dyn Reachability>,
}

impl AssetFetcher {
    /// Build a fetcher gated by the given reachability probe.
    ///
    /// The HTTP client carries a connect timeout but no overall request
    /// timeout: vendor installers are large and download time is
    /// unbounded by design.
    pub fn new(probe: Box<dyn Reachability>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()?;
        Ok(AssetFetcher { client, probe })
    }

    /// Fetch a vendor listing page and extract the first URL matching
    /// `pattern`. `Ok(None)` means the page loaded but carried no
    /// matching link.
    pub fn resolve_download_url(
        &self,
        listing_page_url: &str,
        pattern: &Regex,
    ) -> Result<Option<String>, FetchError> {
        log::info!("Resolving download link from {}", listing_page_url);
        let body = self.client.get(listing_page_url).send()?.text()?;

        match pattern.find(&body) {
            Some(m) => {
                let url = m.as_str().to_string();
                log::info!("Resolved download link: {}", url);
                Ok(Some(url))
            }
            None => {
                log::warn!("No download link matching pattern on {}", listing_page_url);
                Ok(None)
            }
        }
    }

    /// Stream `url` to a temporary file in fixed-size chunks, logging
    /// percentage progress when the total size is known.
    ///
    /// Reachability is re-checked immediately before the request even
    /// if the caller probed earlier: acquisition is long-running and
    /// conditions may have changed. One attempt per call; transport and
    /// I/O failures surface as errors for the caller to report.
    pub fn download(&self, url: &str, suffix: &str) -> Result<FetchOutcome, FetchError> {
        if !self.probe.is_reachable() {
            log::warn!("Network unreachable, skipping download of {}", url);
            return Ok(FetchOutcome::SkippedNoNetwork);
        }

        log::info!("Downloading {}", url);
        let mut response = self.client.get(url).send()?.error_for_status()?;
        let total = response.content_length();

        let tmp = tempfile::Builder::new()
            .prefix("provision-asset-")
            .suffix(suffix)
            .tempfile()?;
        // Detach from auto-delete: the path outlives this call and is
        // handed to the step runner. OS temp cleanup reclaims it.
        let (mut file, path) = tmp.keep().map_err(|e| e.error)?;

        let mut buffer = [0u8; CHUNK_SIZE];
        let mut downloaded: u64 = 0;
        let mut last_reported_pct: u64 = 0;
        loop {
            let read = response.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])?;
            downloaded += read as u64;

            if let Some(total) = total.filter(|t| *t > 0) {
                let pct = downloaded * 100 / total;
                if pct / 10 > last_reported_pct / 10 {
                    log::info!("Download progress: {}%", pct);
                    last_reported_pct = pct;
                }
            }
        }
        file.flush()?;

        log::info!("Downloaded {} bytes to {:?}", downloaded, path);
        Ok(FetchOutcome::Downloaded(path))
    }
}
