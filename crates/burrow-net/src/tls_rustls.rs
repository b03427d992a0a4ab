//! [`TlsProvider`] backed by rustls + ring.
//!
//! Enabled by the `tls-rustls` feature. Trusts Mozilla's root CA bundle
//! via webpki-roots.

use std::io::{self, Read, Write};
use std::sync::Arc;

use rustls::ClientConfig;
use rustls::pki_types::ServerName;

use burrow_types::error::{BurrowError, Result};

use crate::stream::NetworkStream;
use crate::tls::TlsProvider;

/// Shared, reusable TLS client configuration (one per process).
pub struct RustlsTlsProvider {
    config: Arc<ClientConfig>,
}

impl RustlsTlsProvider {
    /// Build a provider that trusts Mozilla's root CA bundle.
    pub fn new() -> Self {
        let root_store =
            rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for RustlsTlsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TlsProvider for RustlsTlsProvider {
    fn connect_tls(
        &self,
        stream: Box<dyn NetworkStream>,
        server_name: &str,
    ) -> Result<Box<dyn NetworkStream>> {
        let sni = ServerName::try_from(server_name.to_owned())
            .map_err(|e| BurrowError::Connection(format!("invalid server name: {e}")))?;

        let conn = rustls::ClientConnection::new(Arc::clone(&self.config), sni)
            .map_err(|e| BurrowError::Connection(format!("TLS init: {e}")))?;

        RustlsStream::handshake(conn, stream).map(|s| Box::new(s) as Box<dyn NetworkStream>)
    }
}

// ---------------------------------------------------------------------------
// Adapter: bridge rustls's `Read`/`Write` to our `NetworkStream` trait
// ---------------------------------------------------------------------------

/// A TLS-wrapped network stream.
///
/// Uses [`rustls::ClientConnection`] for the crypto and delegates raw
/// I/O to the inner blocking [`NetworkStream`].
struct RustlsStream {
    tls: rustls::ClientConnection,
    inner: Box<dyn NetworkStream>,
    /// Data decrypted by rustls but not yet consumed by the caller.
    plaintext_buf: Vec<u8>,
}

impl RustlsStream {
    /// Drive the TLS handshake to completion over the blocking stream.
    fn handshake(
        mut tls: rustls::ClientConnection,
        mut inner: Box<dyn NetworkStream>,
    ) -> Result<Self> {
        let mut adapter = IoAdapter::new(&mut *inner);
        while tls.is_handshaking() {
            if tls.wants_write() {
                tls.write_tls(&mut adapter)
                    .map_err(|e| BurrowError::Connection(format!("TLS handshake send: {e}")))?;
            }
            if tls.wants_read() {
                let n = tls
                    .read_tls(&mut adapter)
                    .map_err(|e| BurrowError::Connection(format!("TLS handshake recv: {e}")))?;
                if n == 0 {
                    return Err(BurrowError::Connection(
                        "peer closed during TLS handshake".to_string(),
                    ));
                }
                tls.process_new_packets()
                    .map_err(|e| BurrowError::Connection(format!("TLS handshake: {e}")))?;
            }
        }
        // Flush any remaining handshake bytes.
        while tls.wants_write() {
            tls.write_tls(&mut adapter)
                .map_err(|e| BurrowError::Connection(format!("TLS handshake send: {e}")))?;
        }

        Ok(Self {
            tls,
            inner,
            plaintext_buf: Vec::new(),
        })
    }

    /// Pump ciphertext from the network into rustls and move any
    /// resulting plaintext into `self.plaintext_buf`. Returns `true`
    /// at EOF from the peer.
    fn pull_plaintext(&mut self) -> Result<bool> {
        let mut adapter = IoAdapter::new(&mut *self.inner);

        let eof = match self.tls.read_tls(&mut adapter) {
            Ok(0) => true,
            Ok(_) => false,
            Err(e) => {
                return Err(BurrowError::Transfer(format!("TLS read: {e}")));
            },
        };

        self.tls
            .process_new_packets()
            .map_err(|e| BurrowError::Transfer(format!("TLS process: {e}")))?;

        // Drain plaintext into our buffer.
        let mut tmp = [0u8; 8192];
        loop {
            match self.tls.reader().read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => self.plaintext_buf.extend_from_slice(&tmp[..n]),
                // rustls reports "no plaintext available" as WouldBlock.
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                // Truncated close without close_notify; Gopher servers
                // routinely just drop the socket, so treat it as EOF.
                Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(BurrowError::Transfer(format!("TLS plaintext: {e}"))),
            }
        }

        Ok(eof)
    }
}

impl NetworkStream for RustlsStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        // Serve buffered plaintext first, pumping the socket as needed.
        while self.plaintext_buf.is_empty() {
            if self.pull_plaintext()? {
                break;
            }
        }

        if self.plaintext_buf.is_empty() {
            return Ok(0); // EOF
        }

        let n = buf.len().min(self.plaintext_buf.len());
        buf[..n].copy_from_slice(&self.plaintext_buf[..n]);
        self.plaintext_buf.drain(..n);
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let n = self
            .tls
            .writer()
            .write(data)
            .map_err(|e| BurrowError::Transfer(format!("TLS write: {e}")))?;

        let mut adapter = IoAdapter::new(&mut *self.inner);
        while self.tls.wants_write() {
            self.tls
                .write_tls(&mut adapter)
                .map_err(|e| BurrowError::Transfer(format!("TLS flush: {e}")))?;
        }

        Ok(n)
    }

    fn close(&mut self) -> Result<()> {
        self.tls.send_close_notify();
        let mut adapter = IoAdapter::new(&mut *self.inner);
        let _ = self.tls.write_tls(&mut adapter);
        self.inner.close()
    }
}

// ---------------------------------------------------------------------------
// IoAdapter: bridge NetworkStream to std::io::Read + std::io::Write
// ---------------------------------------------------------------------------

/// Thin wrapper that lets rustls call `std::io::Read` / `Write` on a
/// `&mut dyn NetworkStream`.
struct IoAdapter<'a> {
    inner: &'a mut dyn NetworkStream,
}

impl<'a> IoAdapter<'a> {
    fn new(inner: &'a mut dyn NetworkStream) -> Self {
        Self { inner }
    }
}

impl io::Read for IoAdapter<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner
            .read(buf)
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

impl io::Write for IoAdapter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .write(buf)
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_is_constructible() {
        let provider = RustlsTlsProvider::new();
        let _: &dyn TlsProvider = &provider;
    }

    #[test]
    fn rejects_invalid_server_name() {
        let provider = RustlsTlsProvider::new();
        // An IP-with-garbage string is not a valid DNS name or IP.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let tcp = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
        let stream: Box<dyn NetworkStream> = Box::new(crate::StdNetworkStream::new(tcp));
        let result = provider.connect_tls(stream, "not a hostname");
        assert!(result.is_err());
    }
}
