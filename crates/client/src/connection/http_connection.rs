use std::fmt;
use std::mem;

use bytes::BytesMut;
use http::header::HeaderName;
use http::{Method, Uri};
use tokio_util::codec::Encoder;
use tracing::{debug, trace};

use crate::codec::{HeadEncoder, HeadLine, HeaderDecoder, StatusLineDecoder};
use crate::config::ClientConfig;
use crate::connection::{PendingResponse, RequestBody, Response};
use crate::ensure;
use crate::protocol::{ConnectionState, HttpError, SendError, StateError};
use crate::transport::{
    ConnectTarget, Connector, OnTimeout, PeerIdentity, TcpConnector, Transport, TransportHandle,
    WeakTransportHandle,
};

/// A client-side HTTP/1.1 connection to one host.
///
/// The connection drives one request/response exchange at a time through the
/// states described in [`ConnectionState`]:
///
/// 1. [`put_request`](Self::put_request) buffers the request line and the
///    synthesized `Host` / `Accept-Encoding` headers
/// 2. [`put_header`](Self::put_header) buffers further header lines
/// 3. [`end_headers`](Self::end_headers) flushes the head and the body,
///    connecting first when needed
/// 4. [`get_response`](Self::get_response) parses the response head and hands
///    out a [`Response`] for the body
///
/// [`request`](Self::request) composes the first three steps. Calls made out
/// of order fail with a [`StateError`] and leave the buffered request alone.
///
/// The transport belongs to one exchange: once a response is handed out, the
/// connection gives up its share and the response keeps the transport until
/// its body is read. The next request opens a new transport.
pub struct HttpConnection<C: Connector = TcpConnector> {
    host: String,
    port: u16,
    config: ClientConfig,
    connector: C,
    transport: Option<TransportHandle<C::Io>>,
    /// The transport of the unread persistent response, if any.
    handed_out: Option<WeakTransportHandle<C::Io>>,
    /// The request head being assembled.
    buffer: BytesMut,
    state: ConnectionState,
    method: Option<Method>,
    tunnel: Option<TunnelTarget>,
    debug_level: u32,
}

#[derive(Debug, Clone)]
struct TunnelTarget {
    host: String,
    port: u16,
    headers: Vec<(String, String)>,
}

impl HttpConnection<TcpConnector> {
    /// A TCP connection with the default configuration.
    ///
    /// `host` may carry the port (`example.com:8080`, `[::1]:8080`) when `port` is `None`.
    pub fn new(host: &str, port: Option<u16>) -> Result<Self, HttpError> {
        Self::with_config(host, port, ClientConfig::default(), TcpConnector)
    }
}

impl<C: Connector> HttpConnection<C> {
    pub fn with_config(host: &str, port: Option<u16>, config: ClientConfig, connector: C) -> Result<Self, HttpError> {
        let (host, port) = split_host_port(host, port, config.default_port)?;
        Ok(Self {
            host,
            port,
            debug_level: config.debug_level,
            config,
            connector,
            transport: None,
            handed_out: None,
            buffer: BytesMut::new(),
            state: ConnectionState::Idle,
            method: None,
            tunnel: None,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Values above 0 log the bytes sent and the response head received at `debug` level.
    pub fn set_debug_level(&mut self, level: u32) {
        self.debug_level = level;
    }

    /// Routes the connection through an HTTP proxy: the connection's own
    /// host and port become the proxy, `host`/`port` the tunnel destination.
    ///
    /// `headers` are sent with the `CONNECT` request, e.g. `Proxy-Authorization`.
    pub fn set_tunnel(&mut self, host: &str, port: Option<u16>, headers: &[(&str, &str)]) -> Result<(), HttpError> {
        ensure!(self.transport.is_none(), StateError::TunnelAfterConnect.into());

        let (host, port) = split_host_port(host, port, self.config.default_port)?;
        let headers = headers.iter().map(|&(name, value)| (name.to_owned(), value.to_owned())).collect();
        self.tunnel = Some(TunnelTarget { host, port, headers });
        Ok(())
    }

    /// The identity of the peer while connected.
    pub async fn peer_identity(&self) -> Option<PeerIdentity> {
        match &self.transport {
            Some(transport) => Some(transport.lock().await.peer_identity()),
            None => None,
        }
    }

    /// Opens a new transport, replacing the current one, and sets up the tunnel if one is configured.
    pub async fn connect(&mut self) -> Result<(), HttpError> {
        self.release_transport().await;

        let target = ConnectTarget {
            host: self.host.clone(),
            port: self.port,
            timeout: self.config.connect_timeout,
            source_address: self.config.source_address,
        };
        let io = self.connector.connect(&target).await.map_err(HttpError::connect)?;
        debug!(host = %self.host, port = self.port, "connected");

        let transport = Transport::new(io, self.config.read_timeout, self.config.max_amount);
        self.transport = Some(TransportHandle::new(transport));

        if let Err(e) = self.establish_tunnel().await {
            debug!(cause = %e, "tunnel setup failed, closing connection");
            self.close().await;
            return Err(e);
        }
        Ok(())
    }

    async fn establish_tunnel(&self) -> Result<(), HttpError> {
        let (Some(tunnel), Some(handle)) = (&self.tunnel, &self.transport) else {
            return Ok(());
        };

        let mut head = BytesMut::new();
        HeadEncoder.encode(HeadLine::Connect { host: &tunnel.host, port: tunnel.port }, &mut head)?;
        for (name, value) in &tunnel.headers {
            HeadEncoder.encode(HeadLine::Header { name: name.as_bytes(), values: &[value.as_bytes()] }, &mut head)?;
        }
        HeadEncoder.encode(HeadLine::End, &mut head)?;

        let mut transport = handle.lock().await;
        transport.write_all_and_flush(&head).await.map_err(SendError::from)?;

        let status = transport.decode(&mut StatusLineDecoder::new(self.config.max_line), OnTimeout::Fail).await?;
        if status.status != 200 {
            return Err(HttpError::tunnel_failed(status.status, status.reason.trim()));
        }

        // proxy headers are of no interest
        let mut headers = HeaderDecoder::new(self.config.max_line, usize::MAX);
        transport.decode(&mut headers, OnTimeout::Fail).await?;

        debug!(host = %tunnel.host, port = tunnel.port, "tunnel established");
        Ok(())
    }

    /// Closes the transport and any unread response's transport, then
    /// forgets the response.
    ///
    /// Safe to call repeatedly.
    pub async fn close(&mut self) {
        self.release_transport().await;
        if let Some(tracker) = self.state.tracker() {
            tracker.mark_closed();
        }
        if let Some(handed_out) = self.handed_out.take()
            && let Err(e) = handed_out.shutdown().await
        {
            debug!(cause = %e, "failed to shutdown the response's transport");
        }
        self.state = ConnectionState::Idle;
        self.buffer.clear();
        self.method = None;
    }

    async fn release_transport(&mut self) {
        if let Some(transport) = self.transport.take() {
            trace!(owners = transport.owners(), "connection releases its transport");
            if let Err(e) = transport.release().await {
                debug!(cause = %e, "failed to shutdown transport");
            }
        }
    }

    /// Applies a state transition, leaving the state untouched when it is illegal.
    fn transition<F>(&mut self, f: F) -> Result<(), &'static str>
    where
        F: FnOnce(ConnectionState) -> Result<ConnectionState, ConnectionState>,
    {
        match f(mem::take(&mut self.state)) {
            Ok(next) => {
                self.state = next;
                Ok(())
            }
            Err(current) => {
                let name = current.name();
                self.state = current;
                Err(name)
            }
        }
    }

    /// Starts a request: buffers `METHOD target HTTP/1.1` and, unless skipped,
    /// the `Host` and `Accept-Encoding: identity` headers.
    ///
    /// An empty `target` is sent as `/`.
    pub fn put_request(
        &mut self,
        method: &Method,
        target: &str,
        skip_host: bool,
        skip_accept_encoding: bool,
    ) -> Result<(), HttpError> {
        ensure!(target.is_ascii(), HttpError::invalid_url(format!("non-ASCII request target: {target:?}")));

        self.state = mem::take(&mut self.state).forget_finished();
        self.transition(ConnectionState::start_request)
            .map_err(|state| StateError::CannotSendRequest { state })?;

        let target = if target.is_empty() { "/" } else { target };
        self.buffer.clear();
        HeadEncoder.encode(HeadLine::Request { method, target }, &mut self.buffer)?;
        self.method = Some(method.clone());

        if !skip_host {
            let host = self.host_header(target);
            self.put_header("Host", &[host])?;
        }
        if !skip_accept_encoding {
            self.put_header("Accept-Encoding", &["identity"])?;
        }
        Ok(())
    }

    /// The `Host` value for a request to `target`.
    fn host_header(&self, target: &str) -> String {
        if target.starts_with("http")
            && let Some(authority) = target
                .parse::<Uri>()
                .ok()
                .filter(|uri| uri.scheme().is_some())
                .and_then(|uri| uri.authority().cloned())
        {
            return authority.as_str().to_owned();
        }

        let (host, port) = match &self.tunnel {
            Some(tunnel) => (tunnel.host.as_str(), tunnel.port),
            None => (self.host.as_str(), self.port),
        };
        let host = if host.contains(':') { format!("[{host}]") } else { host.to_owned() };
        if port == self.config.default_port { host } else { format!("{host}:{port}") }
    }

    /// Buffers a header line; several values are folded onto continuation lines.
    pub fn put_header<V: AsRef<[u8]>>(&mut self, name: &str, values: &[V]) -> Result<(), HttpError> {
        if !self.state.accepts_headers() {
            return Err(StateError::CannotSendHeader { state: self.state.name() }.into());
        }
        ensure!(HeaderName::from_bytes(name.as_bytes()).is_ok(), SendError::invalid_header(name).into());

        let values: Vec<&[u8]> = values.iter().map(AsRef::as_ref).collect();
        HeadEncoder.encode(HeadLine::Header { name: name.as_bytes(), values: &values }, &mut self.buffer)?;
        Ok(())
    }

    /// Ends the head and sends it, followed by `body`.
    ///
    /// In-memory bodies shorter than the configured MSS go out in the same
    /// write as the head.
    pub async fn end_headers(&mut self, body: Option<RequestBody>) -> Result<(), HttpError> {
        if !self.state.accepts_headers() {
            return Err(StateError::CannotSendHeader { state: self.state.name() }.into());
        }
        // a body that cannot be encoded leaves the request unsent
        let body = body.map(RequestBody::encode_text).transpose()?;

        self.transition(ConnectionState::finish_request)
            .map_err(|state| StateError::CannotSendHeader { state })?;

        HeadEncoder.encode(HeadLine::End, &mut self.buffer)?;
        let mut head = self.buffer.split();

        match body {
            Some(RequestBody::Bytes(body)) if body.len() < self.config.mss => {
                head.extend_from_slice(&body);
                self.send(head.freeze()).await
            }
            Some(body) => {
                self.send(head.freeze()).await?;
                self.send(body).await
            }
            None => self.send(head.freeze()).await,
        }
    }

    /// Sends a complete request: request line, headers and body.
    ///
    /// Caller supplied `Host` and `Accept-Encoding` replace the synthesized
    /// ones. A `Content-Length` is added for bodies of known length unless the
    /// caller set one.
    pub async fn request(
        &mut self,
        method: &Method,
        target: &str,
        body: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<(), HttpError> {
        let has_header = |name: &str| headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name));
        self.put_request(method, target, has_header("host"), has_header("accept-encoding"))?;

        if let Some(body) = &body
            && !has_header("content-length")
            && let Some(length) = body.content_length()
        {
            self.put_header("Content-Length", &[length.to_string()])?;
        }

        for &(name, value) in headers {
            self.put_header(name, &[value])?;
        }

        self.end_headers(body).await
    }

    /// Writes `data` to the transport, connecting first when allowed.
    pub async fn send<B: Into<RequestBody>>(&mut self, data: B) -> Result<(), HttpError> {
        if self.transport.is_none() {
            ensure!(self.config.auto_open, SendError::NotConnected.into());
            self.connect().await?;
        }
        let Some(handle) = &self.transport else {
            return Err(SendError::NotConnected.into());
        };

        let body: RequestBody = data.into();
        let mut transport = handle.lock().await;
        body.write_to(&mut *transport, self.config.block_size, self.debug_level > 0).await?;
        Ok(())
    }

    /// Reads the response head of the request just sent.
    ///
    /// Only legal once the request is sent and any earlier response is
    /// finished. A response that will close the connection is handed over
    /// completely; otherwise the connection remembers it until it is read. On
    /// error the connection is closed.
    pub async fn get_response(&mut self) -> Result<Response<C::Io>, HttpError> {
        self.state = mem::take(&mut self.state).forget_finished();
        if !matches!(self.state, ConnectionState::RequestSent) {
            return Err(StateError::ResponseNotReady { state: self.state.name() }.into());
        }
        let Some(handle) = self.transport.clone() else {
            return Err(SendError::NotConnected.into());
        };

        let method = self.method.take().unwrap_or_default();
        let pending = PendingResponse::new(handle, method, self.config.clone(), self.debug_level);
        let response = match pending.begin().await {
            Ok(response) => response,
            Err(e) => {
                debug!(cause = %e, "failed to read response, closing connection");
                self.close().await;
                return Err(e.into());
            }
        };

        if response.will_close() {
            self.state = ConnectionState::Idle;
            self.handed_out = None;
        } else {
            self.state = ConnectionState::UnreadResponse(response.tracker());
            self.handed_out = self.transport.as_ref().map(TransportHandle::downgrade);
        }
        self.release_transport().await;

        Ok(response)
    }
}

/// Splits `host[:port]`; an explicit `port` wins over one in `host`.
fn split_host_port(host: &str, port: Option<u16>, default_port: u16) -> Result<(String, u16), HttpError> {
    if let Some(port) = port {
        return Ok((host.to_owned(), port));
    }

    let colon = host.rfind(':');
    let bracket = host.rfind(']');
    let (host, port) = match colon {
        Some(i) if bracket.is_none_or(|j| i > j) => {
            let port = &host[i + 1..];
            let port = if port.is_empty() {
                default_port
            } else {
                port.parse::<u16>()
                    .ok()
                    .ok_or_else(|| HttpError::invalid_url(format!("nonnumeric port: '{port}'")))?
            };
            (&host[..i], port)
        }
        _ => (host, default_port),
    };

    let host = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
    Ok((host.to_owned(), port))
}

impl<C: Connector> fmt::Debug for HttpConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .field("connected", &self.transport.is_some())
            .field("tunnel", &self.tunnel)
            .finish_non_exhaustive()
    }
}
