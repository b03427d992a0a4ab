//! The Gopher request cycle.
//!
//! One fetch = one connection: connect (optionally TLS-wrap), send
//! `selector [TAB query] CRLF`, read until the server closes, hand back
//! the complete payload. There is no framing in the protocol -- the
//! close *is* the end-of-response signal.

use std::net::TcpStream;
use std::time::Duration;

use burrow_types::error::{BurrowError, Result};
use burrow_types::GopherAddress;

use crate::stream::{NetworkStream, StdNetworkStream};
use crate::tls::TlsProvider;

/// Maximum response size (4 MB).
pub const MAX_RESPONSE_SIZE: usize = 4 * 1024 * 1024;

/// TCP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read timeout.
const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetch a Gopher resource, blocking until the full response arrived.
///
/// `query` is appended tab-separated for search (itemtype `7`) requests.
/// TLS is used when `addr.use_tls` is set; requesting TLS without a
/// provider is a connection error.
pub fn fetch(
    addr: &GopherAddress,
    query: Option<&str>,
    tls: Option<&dyn TlsProvider>,
) -> Result<Vec<u8>> {
    let tcp = tcp_connect(&addr.host, addr.port)?;
    let mut stream: Box<dyn NetworkStream> = Box::new(StdNetworkStream::new(tcp));

    if addr.use_tls {
        let provider = tls.ok_or_else(|| {
            BurrowError::Connection("TLS requested but no TLS support is available".to_string())
        })?;
        stream = provider.connect_tls(stream, &addr.host)?;
    }

    let request = match query {
        Some(q) => format!("{}\t{}\r\n", addr.selector, q),
        None => format!("{}\r\n", addr.selector),
    };
    log::debug!("fetch {}:{} {:?}", addr.host, addr.port, request.trim_end());

    write_all(&mut *stream, request.as_bytes())
        .map_err(|e| BurrowError::Transfer(format!("send request: {e}")))?;

    let body = read_response(&mut *stream, MAX_RESPONSE_SIZE)?;
    let _ = stream.close();
    log::debug!("fetched {} bytes from {}", body.len(), addr.host);
    Ok(body)
}

/// Open a TCP connection with a connect timeout.
fn tcp_connect(host: &str, port: u16) -> Result<TcpStream> {
    use std::net::ToSocketAddrs;

    let addr = format!("{host}:{port}")
        .to_socket_addrs()
        .map_err(|e| BurrowError::Connection(format!("DNS resolution failed: {e}")))?
        .next()
        .ok_or_else(|| BurrowError::Connection(format!("no addresses for {host}:{port}")))?;

    let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|e| BurrowError::Connection(format!("connect to {host}:{port}: {e}")))?;

    stream
        .set_read_timeout(Some(READ_TIMEOUT))
        .map_err(|e| BurrowError::Connection(format!("set read timeout: {e}")))?;

    Ok(stream)
}

/// Write the full buffer, looping over short writes.
fn write_all(stream: &mut dyn NetworkStream, mut data: &[u8]) -> Result<()> {
    while !data.is_empty() {
        let n = stream.write(data)?;
        if n == 0 {
            return Err(BurrowError::Transfer("peer stopped accepting data".to_string()));
        }
        data = &data[n..];
    }
    Ok(())
}

/// Read until the peer closes, enforcing a size cap.
fn read_response(stream: &mut dyn NetworkStream, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if body.len() + n > limit {
                    return Err(BurrowError::Transfer("response too large".to_string()));
                }
                body.extend_from_slice(&chunk[..n]);
            },
            Err(BurrowError::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                return Err(BurrowError::Transfer("read timed out".to_string()));
            },
            Err(BurrowError::Io(e)) => {
                return Err(BurrowError::Transfer(format!("read: {e}")));
            },
            Err(e) => return Err(e),
        }
    }
    Ok(body)
}
