//! TLS provider abstraction.
//!
//! A [`TlsProvider`] wraps a plain TCP [`NetworkStream`] in a TLS
//! session. The fetch path takes the provider as an optional capability,
//! so the client works (plaintext only) when no provider is compiled in.

use burrow_types::error::Result;

use crate::stream::NetworkStream;

/// Provides TLS client connections.
pub trait TlsProvider: Send + Sync {
    /// Wrap `stream` in a TLS client session, performing the handshake.
    ///
    /// `server_name` is used for SNI and certificate verification.
    fn connect_tls(
        &self,
        stream: Box<dyn NetworkStream>,
        server_name: &str,
    ) -> Result<Box<dyn NetworkStream>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_types::error::BurrowError;

    struct MockTlsProvider;

    impl TlsProvider for MockTlsProvider {
        fn connect_tls(
            &self,
            stream: Box<dyn NetworkStream>,
            server_name: &str,
        ) -> Result<Box<dyn NetworkStream>> {
            if server_name == "bad.example.org" {
                return Err(BurrowError::Connection("mock TLS error".to_string()));
            }
            Ok(stream) // pass-through for testing
        }
    }

    #[test]
    fn trait_is_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockTlsProvider>();

        let provider = MockTlsProvider;
        let _: &dyn TlsProvider = &provider;
    }
}
