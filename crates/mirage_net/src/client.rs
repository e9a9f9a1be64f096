use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, StatusCode};
use mirage_core::{Browser, HandshakeSpec};
use tokio::time::timeout;
use tracing::debug;

use crate::dialer::Ja3Dialer;
use crate::engine::{HandshakeEngine, NegotiatedProtocol, TlsOptions};
use crate::error::ClientError;
use crate::transport::DialStream;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A fully collected HTTP response, regardless of which framing carried it.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// HTTP client that presents a fixed JA3 fingerprint on every HTTPS
/// connection. Plain `http://` traffic bypasses the custom handshake
/// entirely and rides the platform-default transport.
pub struct Ja3Client {
    dialer: Ja3Dialer,
    browser: Option<Browser>,
    timeout: Duration,
    plain: reqwest::Client,
}

impl Ja3Client {
    /// Client impersonating a preset browser identity; its User-Agent is
    /// applied to requests that carry none.
    pub fn new(browser: Browser) -> Result<Self, ClientError> {
        let mut client = Self::with_str(&browser.ja3)?;
        client.browser = Some(browser);
        Ok(client)
    }

    /// Client built from a bare JA3 string; no User-Agent default applies.
    pub fn with_str(ja3: &str) -> Result<Self, ClientError> {
        let spec = HandshakeSpec::from_ja3(ja3)?;
        Ok(Self {
            dialer: Ja3Dialer::new(spec),
            browser: None,
            timeout: DEFAULT_TIMEOUT,
            plain: reqwest::Client::new(),
        })
    }

    /// Overall deadline bounding dial + handshake + response head.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables server-certificate verification on the fingerprinted path.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.dialer = self.dialer.with_insecure(insecure);
        self
    }

    /// Replaces the TLS options (server name, trust behavior) wholesale.
    pub fn tls_options(mut self, options: TlsOptions) -> Self {
        self.dialer = self.dialer.with_options(options);
        self
    }

    /// Swaps the handshake engine behind the dialer.
    pub fn engine(mut self, engine: Arc<dyn HandshakeEngine>) -> Self {
        self.dialer = self.dialer.with_engine(engine);
        self
    }

    pub async fn get(&self, url: &str) -> Result<Response, ClientError> {
        self.execute(
            Request::builder()
                .method(Method::GET)
                .uri(url)
                .body(Bytes::new())?,
        )
        .await
    }

    pub async fn head(&self, url: &str) -> Result<Response, ClientError> {
        self.execute(
            Request::builder()
                .method(Method::HEAD)
                .uri(url)
                .body(Bytes::new())?,
        )
        .await
    }

    pub async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: impl Into<Bytes>,
    ) -> Result<Response, ClientError> {
        self.execute(
            Request::builder()
                .method(Method::POST)
                .uri(url)
                .header(CONTENT_TYPE, content_type)
                .body(body.into())?,
        )
        .await
    }

    /// POST with the pairs form-urlencoded as the body.
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<Response, ClientError> {
        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.post(url, "application/x-www-form-urlencoded", Bytes::from(body))
            .await
    }

    /// Generic entry point. Applies the preset User-Agent when the caller
    /// set none, then routes by scheme.
    pub async fn execute(&self, mut req: Request<Bytes>) -> Result<Response, ClientError> {
        if !req.headers().contains_key(USER_AGENT) {
            if let Some(browser) = &self.browser {
                if !browser.user_agent.is_empty() {
                    let ua = HeaderValue::from_str(&browser.user_agent)
                        .map_err(http::Error::from)?;
                    req.headers_mut().insert(USER_AGENT, ua);
                }
            }
        }

        if req.uri().scheme_str() == Some("http") {
            return self.execute_plain(req).await;
        }

        // The deadline covers dial, handshake, and the response head; body
        // collection runs untimed.
        let after = self.timeout;
        let pending = timeout(after, self.start_exchange(req))
            .await
            .map_err(|_| ClientError::Deadline { after })??;
        pending.collect().await
    }

    async fn execute_plain(&self, req: Request<Bytes>) -> Result<Response, ClientError> {
        let (parts, body) = req.into_parts();
        let mut builder = self.plain.request(parts.method, parts.uri.to_string());
        for (name, value) in parts.headers.iter() {
            builder = builder.header(name, value);
        }
        let resp = builder.body(body.to_vec()).send().await?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(Response {
            status,
            headers,
            body,
        })
    }

    async fn start_exchange(&self, req: Request<Bytes>) -> Result<PendingResponse, ClientError> {
        let uri = req.uri().clone();
        let host = uri
            .host()
            .ok_or_else(|| ClientError::MissingHost {
                uri: uri.to_string(),
            })?
            .to_string();
        let port = uri.port_u16().unwrap_or(443);

        let conn = self.dialer.dial(&host, port).await?;
        match conn.protocol {
            NegotiatedProtocol::H2 => start_h2(conn.stream, req).await,
            NegotiatedProtocol::Http11 => start_http1(conn.stream, req, &host).await,
            NegotiatedProtocol::Unexpected(alpn) => Err(ClientError::UnexpectedProtocol { alpn }),
        }
    }
}

/// A response whose head has arrived but whose body is still on the wire.
enum PendingResponse {
    H1(http::Response<hyper::Body>),
    H2(http::Response<h2::RecvStream>),
}

impl PendingResponse {
    async fn collect(self) -> Result<Response, ClientError> {
        match self {
            PendingResponse::H1(resp) => {
                let (parts, body) = resp.into_parts();
                let body = hyper::body::to_bytes(body).await?;
                Ok(Response {
                    status: parts.status,
                    headers: parts.headers,
                    body,
                })
            }
            PendingResponse::H2(resp) => {
                let (parts, mut recv) = resp.into_parts();
                let mut buf = BytesMut::new();
                while let Some(chunk) = recv.data().await {
                    let chunk = chunk?;
                    let _ = recv.flow_control().release_capacity(chunk.len());
                    buf.extend_from_slice(&chunk);
                }
                Ok(Response {
                    status: parts.status,
                    headers: parts.headers,
                    body: buf.freeze(),
                })
            }
        }
    }
}

async fn start_http1(
    stream: DialStream,
    req: Request<Bytes>,
    host: &str,
) -> Result<PendingResponse, ClientError> {
    let (mut sender, conn) = hyper::client::conn::handshake(stream).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!("http/1.1 connection task ended: {e}");
        }
    });

    // hyper's conn API wants origin-form targets and an explicit Host header.
    let (mut parts, body) = req.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();
    parts.uri = path.parse()?;
    if !parts.headers.contains_key(HOST) {
        parts
            .headers
            .insert(HOST, HeaderValue::from_str(host).map_err(http::Error::from)?);
    }

    let req = Request::from_parts(parts, hyper::Body::from(body));
    let resp = sender.send_request(req).await?;
    Ok(PendingResponse::H1(resp))
}

async fn start_h2(stream: DialStream, req: Request<Bytes>) -> Result<PendingResponse, ClientError> {
    let (client, h2_conn) = h2::client::handshake(stream).await?;
    tokio::spawn(async move {
        if let Err(e) = h2_conn.await {
            debug!("h2 connection driver ended: {e}");
        }
    });

    let (parts, body) = req.into_parts();
    let mut builder = Request::builder().method(parts.method).uri(parts.uri);
    for (name, value) in parts.headers.iter() {
        // Host travels as :authority on h2.
        if name != HOST {
            builder = builder.header(name, value);
        }
    }
    let request = builder.body(())?;

    let mut client = client.ready().await?;
    let end_of_stream = body.is_empty();
    let (response, mut send_stream) = client.send_request(request, end_of_stream)?;
    if !end_of_stream {
        send_stream.send_data(body, true)?;
    }

    Ok(PendingResponse::H2(response.await?))
}
