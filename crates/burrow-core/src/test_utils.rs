//! Shared test fixtures.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use burrow_types::error::{BurrowError, Result};
use burrow_types::{GopherAddress, Item};

use crate::nav::Transport;

/// Canned-response transport that records every fetch. Tests keep a
/// clone to inspect traffic after the navigator takes its copy.
#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    inner: Rc<FakeInner>,
}

#[derive(Default)]
struct FakeInner {
    responses: RefCell<HashMap<String, Vec<u8>>>,
    fetches: RefCell<Vec<(GopherAddress, Option<String>)>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register the response body served for `selector`.
    pub(crate) fn respond(self, selector: &str, body: &[u8]) -> Self {
        self.inner
            .responses
            .borrow_mut()
            .insert(selector.to_string(), body.to_vec());
        self
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.inner.fetches.borrow().len()
    }

    /// The nth recorded fetch: effective address and query.
    pub(crate) fn fetched(&self, n: usize) -> (GopherAddress, Option<String>) {
        self.inner.fetches.borrow()[n].clone()
    }
}

impl Transport for FakeTransport {
    fn fetch(&self, addr: &GopherAddress, query: Option<&str>) -> Result<Vec<u8>> {
        self.inner
            .fetches
            .borrow_mut()
            .push((addr.clone(), query.map(str::to_string)));
        self.inner
            .responses
            .borrow()
            .get(&addr.selector)
            .cloned()
            .ok_or_else(|| BurrowError::Connection(format!("no route to {addr}")))
    }
}

/// Serialize menu rows plus the `.` terminator.
pub(crate) fn menu_body(rows: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for row in rows {
        body.push_str(row);
        body.push_str("\r\n");
    }
    body.push_str(".\r\n");
    body.into_bytes()
}

/// Shorthand item builder against example.org:70.
pub(crate) fn item(ty: char, display: &str, selector: &str) -> Item {
    Item::new(
        display,
        GopherAddress::from_parts("example.org", 70, ty, selector),
    )
}
