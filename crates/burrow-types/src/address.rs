//! Gopher resource addresses.
//!
//! A [`GopherAddress`] names one resource in Gopherspace: host, port,
//! itemtype, selector, optional search query, and whether the connection
//! should be TLS-wrapped. Addresses are immutable once constructed and
//! compare structurally.

use std::fmt;

use crate::DEFAULT_PORT;
use crate::error::{BurrowError, Result};

/// A parsed Gopher resource locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GopherAddress {
    pub host: String,
    pub port: u16,
    /// Single-character Gopher item type (`0`, `1`, `7`, `g`, `I`, ...).
    /// Unknown types are passed through untouched.
    pub itemtype: char,
    pub selector: String,
    /// Search term for itemtype `7` requests.
    pub query: Option<String>,
    pub use_tls: bool,
}

impl GopherAddress {
    /// Build an address from explicit parts. Lenient: the itemtype is
    /// taken as-is (servers emit all sorts of types).
    pub fn from_parts(host: &str, port: u16, itemtype: char, selector: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            itemtype,
            selector: selector.to_string(),
            query: None,
            use_tls: false,
        }
    }

    /// Parse a user-typed URL-like string.
    ///
    /// Accepts `gopher://host/1selector`, `gophers://` (TLS), bare
    /// `host[:port][/...]` without a scheme, and the RFC 4266 convention
    /// of a leading itemtype character in the path. A bare hostname maps
    /// to itemtype `1` with an empty selector.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(BurrowError::Address("empty address".to_string()));
        }

        // Scheme prefix decides TLS; absence means plain gopher.
        let (use_tls, rest) = match input.find("://") {
            Some(idx) => {
                let scheme = input[..idx].to_ascii_lowercase();
                let rest = &input[idx + 3..];
                match scheme.as_str() {
                    "gopher" => (false, rest),
                    "gophers" => (true, rest),
                    other => {
                        return Err(BurrowError::Address(format!(
                            "unsupported scheme: {other}"
                        )));
                    },
                }
            },
            None => (false, input),
        };

        // Split off the search query.
        let (rest, query) = match rest.find('?') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_string())),
            None => (rest, None),
        };

        // Split authority from path.
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };

        // Parse host and optional port from the authority.
        let (host, port) = match authority.rfind(':') {
            Some(i) => {
                let port_str = &authority[i + 1..];
                let port = port_str.parse::<u16>().map_err(|_| {
                    BurrowError::Address(format!("invalid port: {port_str}"))
                })?;
                if port == 0 {
                    return Err(BurrowError::Address("port out of range: 0".to_string()));
                }
                (&authority[..i], port)
            },
            None => (authority, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(BurrowError::Address(format!("no host in '{input}'")));
        }

        // RFC 4266: the first path character after `/` is the itemtype.
        let (itemtype, selector) = match path.strip_prefix('/') {
            None | Some("") => ('1', String::new()),
            Some(rest) => {
                let mut chars = rest.char_indices();
                match chars.next() {
                    Some((_, ty)) if ty.is_ascii_graphic() => {
                        let selector = chars
                            .next()
                            .map(|(i, _)| rest[i..].to_string())
                            .unwrap_or_default();
                        (ty, selector)
                    },
                    _ => {
                        return Err(BurrowError::Address(format!(
                            "invalid itemtype character in '{input}'"
                        )));
                    },
                }
            },
        };

        Ok(Self {
            host: host.to_string(),
            port,
            itemtype,
            selector,
            query,
            use_tls,
        })
    }

    /// Copy of this address with the TLS flag replaced.
    pub fn with_tls(&self, use_tls: bool) -> Self {
        Self {
            use_tls,
            ..self.clone()
        }
    }

    /// Copy of this address with the search query replaced.
    pub fn with_query(&self, query: Option<String>) -> Self {
        Self {
            query,
            ..self.clone()
        }
    }

    /// Address of the parent menu: the selector with its last path
    /// segment removed, as a menu (itemtype `1`).
    pub fn parent(&self) -> Self {
        let parent_selector = match self.selector.rfind('/') {
            Some(0) | None => String::new(),
            Some(i) => self.selector[..i].to_string(),
        };
        Self {
            host: self.host.clone(),
            port: self.port,
            itemtype: '1',
            selector: parent_selector,
            query: None,
            use_tls: self.use_tls,
        }
    }

    /// Address of the server's root menu.
    pub fn root(&self) -> Self {
        Self {
            host: self.host.clone(),
            port: self.port,
            itemtype: '1',
            selector: String::new(),
            query: None,
            use_tls: self.use_tls,
        }
    }
}

impl fmt::Display for GopherAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.use_tls { "gophers" } else { "gopher" };
        write!(f, "{scheme}://{}", self.host)?;
        if self.port != DEFAULT_PORT {
            write!(f, ":{}", self.port)?;
        }
        write!(f, "/{}{}", self.itemtype, self.selector)?;
        if let Some(ref q) = self.query {
            write!(f, "?{q}")?;
        }
        Ok(())
    }
}
