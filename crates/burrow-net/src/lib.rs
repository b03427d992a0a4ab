//! Networking for burrow: blocking TCP transport, the Gopher request
//! cycle, and the TLS provider abstraction.

mod fetch;
mod stream;
pub mod tls;
#[cfg(feature = "tls-rustls")]
pub mod tls_rustls;

pub use fetch::{MAX_RESPONSE_SIZE, fetch};
pub use stream::{NetworkStream, StdNetworkStream};
pub use tls::TlsProvider;
#[cfg(feature = "tls-rustls")]
pub use tls_rustls::RustlsTlsProvider;
