//! Client tunables.
//!
//! Every limit and timeout the client applies lives in [`ClientConfig`]. The
//! defaults match what classic HTTP/1.1 clients hard-code.

use std::net::SocketAddr;
use std::time::Duration;

/// Default port used when a host string carries none.
pub const HTTP_PORT: u16 = 80;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MSS: usize = 16 * 1024;
const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;
const DEFAULT_MAX_LINE: usize = 64 * 1024;
const DEFAULT_MAX_HEADERS: usize = 100;
const DEFAULT_MAX_AMOUNT: usize = 1024 * 1024;

/// Configuration shared by a connection and the responses it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub source_address: Option<SocketAddr>,
    pub default_port: u16,
    /// Whether `send()` opens the transport on demand.
    pub auto_open: bool,
    pub debug_level: u32,
    /// Bodies shorter than this are written together with the request head.
    pub mss: usize,
    pub block_size: usize,
    pub max_line: usize,
    pub max_headers: usize,
    /// Upper bound for a single transport read.
    pub max_amount: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            source_address: None,
            default_port: HTTP_PORT,
            auto_open: true,
            debug_level: 0,
            mss: DEFAULT_MSS,
            block_size: DEFAULT_BLOCK_SIZE,
            max_line: DEFAULT_MAX_LINE,
            max_headers: DEFAULT_MAX_HEADERS,
            max_amount: DEFAULT_MAX_AMOUNT,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
///
/// ```
/// use std::time::Duration;
/// use micro_http_client::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .read_timeout(Duration::from_millis(500))
///     .max_headers(32)
///     .build();
/// assert_eq!(config.max_headers, 32);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

macro_rules! setter {
    ($name:ident: $ty:ty) => {
        #[must_use]
        pub fn $name(mut self, $name: $ty) -> Self {
            self.config.$name = $name;
            self
        }
    };
}

impl ClientConfigBuilder {
    setter!(connect_timeout: Duration);
    setter!(read_timeout: Duration);
    setter!(default_port: u16);
    setter!(auto_open: bool);
    setter!(debug_level: u32);
    setter!(mss: usize);
    setter!(block_size: usize);
    setter!(max_line: usize);
    setter!(max_headers: usize);
    setter!(max_amount: usize);

    #[must_use]
    pub fn source_address(mut self, source_address: SocketAddr) -> Self {
        self.config.source_address = Some(source_address);
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
