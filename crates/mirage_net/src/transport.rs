use std::net::SocketAddr;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Boxed duplex byte stream: raw TCP before the handshake, TLS after.
pub type DialStream = Box<dyn RawStream>;

pub trait RawStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> RawStream for T {}

pub struct TransportBuilder;

impl TransportBuilder {
    /// Opens a TCP connection with pre-flight socket configuration applied
    /// before any network activity: Nagle disabled, non-blocking mode for
    /// tokio, optional local interface binding.
    pub async fn connect(
        addr: SocketAddr,
        local_addr: Option<SocketAddr>,
    ) -> std::io::Result<TcpStream> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nodelay(true)?;
        socket.set_nonblocking(true)?;

        if let Some(la) = local_addr {
            socket.bind(&SockAddr::from(la))?;
        }

        match socket.connect(&SockAddr::from(addr)) {
            Ok(()) => {}
            // Expected for a non-blocking connect in progress.
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            #[cfg(unix)]
            Err(e) if e.raw_os_error() == Some(libc::EINPROGRESS) => {}
            Err(e) => return Err(e),
        }

        let stream = TcpStream::from_std(socket.into())?;
        stream.writable().await?;
        if let Some(e) = stream.take_error()? {
            return Err(e);
        }
        Ok(stream)
    }

    /// Erases a concrete stream type behind the [`DialStream`] alias.
    pub fn into_stream<S>(stream: S) -> DialStream
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        Box::new(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connects_to_loopback_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            sock.read_exact(&mut buf).await.unwrap();
            sock.write_all(&buf).await.unwrap();
        });

        let mut stream = TransportBuilder::connect(addr, None).await.unwrap();
        stream.write_all(b"ping").await.unwrap();
        let mut echo = [0u8; 4];
        stream.read_exact(&mut echo).await.unwrap();
        assert_eq!(&echo, b"ping");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connect_surfaces_an_error() {
        // Bind then drop so the port is very likely closed.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        assert!(TransportBuilder::connect(addr, None).await.is_err());
    }
}
