// ── Runtime device configuration ──
//
// Describes *how* to talk to one device. Built by the CLI (or any other
// consumer) and handed in; core never reads config files.

use std::time::Duration;

use url::Url;

/// Default bound on every GET/PATCH/POST.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default background polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for a single device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device root URL (e.g., `http://192.168.1.50`).
    pub url: Url,
    /// Request timeout. Expiry is reported as a timeout failure.
    pub timeout: Duration,
    /// How often the background poller refreshes. Zero disables polling.
    pub poll_interval: Duration,
}

impl DeviceConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
