//! Byte-stream abstraction over TCP.
//!
//! The [`NetworkStream`] trait lets the TLS provider wrap a plain socket
//! without either side depending on a concrete transport type.

use std::io::{Read, Write};
use std::net::TcpStream;

use burrow_types::error::{BurrowError, Result};

/// A bidirectional byte stream. Reads are blocking; a return of `Ok(0)`
/// means the peer closed its side.
pub trait NetworkStream: Send {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn write(&mut self, data: &[u8]) -> Result<usize>;
    fn close(&mut self) -> Result<()>;
}

/// Blocking `std::net` stream.
pub struct StdNetworkStream {
    stream: TcpStream,
}

impl StdNetworkStream {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

impl NetworkStream for StdNetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(BurrowError::Io)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.stream.write(data).map_err(BurrowError::Io)
    }

    fn close(&mut self) -> Result<()> {
        self.stream
            .shutdown(std::net::Shutdown::Both)
            .map_err(BurrowError::Io)
    }
}
