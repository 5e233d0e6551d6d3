//! Archive download

use crate::progress::{DownloadProgress, ProgressSink};
use crate::{DepsError, DepsResult};
use std::io::Read;
use std::time::{Duration, Instant};

/// Source of archive bytes
pub trait Fetcher {
    fn fetch(&self, url: &str, progress: &mut dyn ProgressSink) -> DepsResult<Vec<u8>>;
}

/// Blocking HTTP(S) downloads
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    chunk_size: usize,
}

impl HttpFetcher {
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;

    pub fn new() -> DepsResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("nova/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            // No overall timeout; large archives on slow links are expected.
            .timeout(None)
            .build()
            .map_err(|error| DepsError::Network {
                url: String::new(),
                error,
            })?;

        Ok(Self {
            client,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Redirects are followed by the client; anything else outside 2xx/3xx fails
pub fn check_status(url: &str, status: u16) -> DepsResult<()> {
    if (200..400).contains(&status) {
        Ok(())
    } else {
        Err(DepsError::HttpStatus {
            url: url.to_string(),
            status,
        })
    }
}

/// Largest buffer reserved up front from an advertised `Content-Length`
pub const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Bytes to reserve before the first chunk arrives
///
/// The advertised length is only a hint; beyond the cap the buffer grows as
/// data actually arrives.
pub fn initial_capacity(total: Option<u64>) -> usize {
    let capped = total.unwrap_or(0).min(MAX_PREALLOC);
    usize::try_from(capped).unwrap_or(0)
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, progress: &mut dyn ProgressSink) -> DepsResult<Vec<u8>> {
        let network = |error| DepsError::Network {
            url: url.to_string(),
            error,
        };

        let mut response = self.client.get(url).send().map_err(network)?;
        check_status(url, response.status().as_u16())?;

        let total = response.content_length();
        progress.started(total);
        tracing::debug!(url, ?total, "downloading");

        let start = Instant::now();
        let mut data = Vec::with_capacity(initial_capacity(total));
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let read = response
                .read(&mut chunk)
                .map_err(|e| DepsError::io(url, e))?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
            progress.progress(&DownloadProgress {
                downloaded: data.len() as u64,
                total,
                elapsed: start.elapsed(),
            });
        }

        progress.finished(&DownloadProgress {
            downloaded: data.len() as u64,
            total,
            elapsed: start.elapsed(),
        });
        Ok(data)
    }
}
