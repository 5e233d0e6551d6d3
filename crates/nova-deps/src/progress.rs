//! Advisory download and extraction progress

use std::time::Duration;

/// Snapshot of an in-flight download
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    /// From `Content-Length`, when the server sends one
    pub total: Option<u64>,
    pub elapsed: Duration,
}

impl DownloadProgress {
    /// Throughput in megabits per second
    pub fn mbps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.downloaded as f64 / secs / (1u64 << 17) as f64
    }

    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> Option<f64> {
        self.total
            .filter(|&t| t > 0)
            .map(|t| (self.downloaded as f64 / t as f64).min(1.0))
    }

    /// Estimated time remaining at the average rate so far
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total?;
        if self.downloaded == 0 {
            return None;
        }
        let remaining = total.saturating_sub(self.downloaded) as f64;
        let rate = self.downloaded as f64 / self.elapsed.as_secs_f64().max(f64::EPSILON);
        Some(Duration::from_secs_f64(remaining / rate))
    }
}

/// Receives progress events; none of them affect control flow
pub trait ProgressSink {
    fn downloading(&mut self, _dependency: &str, _url: &str) {}

    fn started(&mut self, _total: Option<u64>) {}

    fn progress(&mut self, _progress: &DownloadProgress) {}

    fn finished(&mut self, _progress: &DownloadProgress) {}

    fn extracting(&mut self, _dependency: &str, _archive_path: &str) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mbps() {
        let progress = DownloadProgress {
            downloaded: 1 << 20,
            total: None,
            elapsed: Duration::from_secs(1),
        };
        assert!((progress.mbps() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_eta_and_fraction() {
        let progress = DownloadProgress {
            downloaded: 250,
            total: Some(1000),
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(progress.fraction(), Some(0.25));
        assert_eq!(progress.eta(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_unknown_total() {
        let progress = DownloadProgress {
            downloaded: 10,
            total: None,
            elapsed: Duration::ZERO,
        };
        assert_eq!(progress.fraction(), None);
        assert_eq!(progress.eta(), None);
        assert_eq!(progress.mbps(), 0.0);
    }
}
