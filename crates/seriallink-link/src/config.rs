use std::time::Duration;

use seriallink_frame::{FrameConfig, DEFAULT_MAX_LINE_LENGTH};

/// How long `request` waits for a matching response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the outgoing message queue.
pub const WRITER_CHANNEL_SIZE: usize = 32;

/// Capacity of each listener queue.
pub const LISTENER_CHANNEL_SIZE: usize = 32;

/// Tunables for a [`Link`](crate::Link).
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Window for a request to be answered. Default: 5 s.
    pub request_timeout: Duration,
    /// Outgoing queue capacity. Default: 32.
    pub writer_capacity: usize,
    /// Per-listener queue capacity. Default: 32.
    pub listener_capacity: usize,
    /// Longest accepted line, in bytes. Default: 64 KiB.
    pub max_line_length: usize,
}

impl LinkConfig {
    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_line_length: self.max_line_length,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            request_timeout: REQUEST_TIMEOUT,
            writer_capacity: WRITER_CHANNEL_SIZE,
            listener_capacity: LISTENER_CHANNEL_SIZE,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}
