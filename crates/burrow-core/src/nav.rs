//! The navigation state machine.
//!
//! One [`Navigator`] owns the whole session: the current index that
//! numeric references resolve against, the last menu and last document,
//! the append-only history, the back stack, the tour queue, and named
//! marks. Every operation mutates state only on success -- a failed
//! fetch, bad reference, or handler problem leaves the previous view
//! intact.

use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;

use burrow_types::error::{BurrowError, Result};
use burrow_types::{GopherAddress, Item};

use crate::classify::classify;
use crate::decode::{self, CharsetDetector};
use crate::handlers::{HandlerRegistry, Resolution};
use crate::index::Index;
use crate::menu::Menu;

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// The navigator's view of the network: one blocking request, the whole
/// response. Injected so the state machine is testable offline.
pub trait Transport {
    fn fetch(&self, addr: &GopherAddress, query: Option<&str>) -> Result<Vec<u8>>;
}

/// Production transport backed by burrow-net.
pub struct NetTransport {
    tls: Option<Box<dyn burrow_net::TlsProvider>>,
}

impl NetTransport {
    pub fn new() -> Self {
        #[cfg(feature = "tls-rustls")]
        let tls: Option<Box<dyn burrow_net::TlsProvider>> =
            Some(Box::new(burrow_net::RustlsTlsProvider::new()));
        #[cfg(not(feature = "tls-rustls"))]
        let tls: Option<Box<dyn burrow_net::TlsProvider>> = None;
        Self { tls }
    }
}

impl Default for NetTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for NetTransport {
    fn fetch(&self, addr: &GopherAddress, query: Option<&str>) -> Result<Vec<u8>> {
        burrow_net::fetch(addr, query, self.tls.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Pages and snapshots
// ---------------------------------------------------------------------------

/// A fetched, interpreted non-menu response.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The item this document was fetched through.
    pub item: Item,
    pub raw: Vec<u8>,
    /// Decoded text for `text/*` content; `None` for binary payloads.
    pub text: Option<String>,
    pub mime: String,
}

/// One interpreted response, cacheable and restorable.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Menu(Menu),
    Document(Document),
}

/// Everything `back()` needs to restore a prior view.
#[derive(Debug, Clone)]
struct Snapshot {
    current_item: Option<Item>,
    current_index: Index,
    last_menu: Index,
    last_document: Option<Document>,
    page_offset: usize,
}

// ---------------------------------------------------------------------------
// Page cache (LRU, byte-bounded)
// ---------------------------------------------------------------------------

/// Cache budget in payload bytes.
const CACHE_MAX_BYTES: usize = 2 * 1024 * 1024;

/// LRU page cache keyed by canonical address + query.
struct PageCache {
    entries: HashMap<String, (Page, usize)>,
    /// Front = most recently used, back = least recently used.
    order: VecDeque<String>,
    current_size: usize,
    max_size: usize,
}

impl PageCache {
    fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            current_size: 0,
            max_size,
        }
    }

    fn get(&mut self, key: &str) -> Option<&Page> {
        if self.entries.contains_key(key) {
            self.order.retain(|k| k != key);
            self.order.push_front(key.to_string());
            self.entries.get(key).map(|(page, _)| page)
        } else {
            None
        }
    }

    fn insert(&mut self, key: String, page: Page, cost: usize) {
        if cost > self.max_size {
            return;
        }
        if let Some((_, old_cost)) = self.entries.remove(&key) {
            self.current_size -= old_cost;
            self.order.retain(|k| k != &key);
        }
        while self.current_size + cost > self.max_size {
            let Some(evicted_key) = self.order.pop_back() else {
                break;
            };
            if let Some((_, evicted_cost)) = self.entries.remove(&evicted_key) {
                self.current_size -= evicted_cost;
            }
        }
        self.current_size += cost;
        self.order.push_front(key.clone());
        self.entries.insert(key, (page, cost));
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.current_size = 0;
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// Items shown per page by the empty-line pager.
const PAGE_SIZE: usize = 10;

/// The session state machine.
pub struct Navigator {
    transport: Box<dyn Transport>,
    detector: Option<Box<dyn CharsetDetector>>,
    pub handlers: HandlerRegistry,
    /// Fallback charset for the text decoder (`set encoding ...`).
    pub encoding: String,
    /// Session-wide TLS default (`set tls on|off`).
    pub use_tls: bool,

    current_index: Index,
    last_menu: Index,
    last_document: Option<Document>,
    /// The location being viewed (last successful visit).
    current_item: Option<Item>,
    history: Vec<(Item, SystemTime)>,
    back_stack: Vec<Snapshot>,
    tour: VecDeque<Item>,
    marks: HashMap<char, Item>,
    cache: PageCache,
    page_offset: usize,
}

impl Navigator {
    pub fn new(transport: Box<dyn Transport>, handlers: HandlerRegistry) -> Self {
        Self {
            transport,
            detector: None,
            handlers,
            encoding: decode::DEFAULT_FALLBACK.to_string(),
            use_tls: false,
            current_index: Index::default(),
            last_menu: Index::default(),
            last_document: None,
            current_item: None,
            history: Vec::new(),
            back_stack: Vec::new(),
            tour: VecDeque::new(),
            marks: HashMap::new(),
            cache: PageCache::new(CACHE_MAX_BYTES),
            page_offset: 0,
        }
    }

    /// Install a charset-detection capability.
    pub fn set_detector(&mut self, detector: Box<dyn CharsetDetector>) {
        self.detector = Some(detector);
    }

    // -- Accessors used by the interpreter and tests --

    pub fn current_index(&self) -> &Index {
        &self.current_index
    }

    pub fn last_menu(&self) -> &Index {
        &self.last_menu
    }

    pub fn last_document(&self) -> Option<&Document> {
        self.last_document.as_ref()
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.current_item.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn tour_len(&self) -> usize {
        self.tour.len()
    }

    /// Seed the current index without a fetch (bookmarks startup).
    pub fn seed_index(&mut self, index: Index) {
        self.current_index = index;
    }

    // -- Reference resolution --

    /// Resolve a single reference -- a 1-based index into the current
    /// index, or a mark label -- without touching any state.
    pub fn resolve(&self, reference: &str) -> Result<Item> {
        let reference = reference.trim();
        if let Ok(n) = reference.parse::<usize>() {
            return self.current_index.get(n).cloned().ok_or_else(|| {
                BurrowError::Reference(format!(
                    "index {n} out of range (1-{})",
                    self.current_index.len()
                ))
            });
        }
        let mut chars = reference.chars();
        if let (Some(label), None) = (chars.next(), chars.next())
            && label.is_alphabetic()
        {
            return self
                .marks
                .get(&label)
                .cloned()
                .ok_or_else(|| BurrowError::Reference(format!("no mark '{label}'")));
        }
        Err(BurrowError::Reference(format!(
            "not an index or mark: {reference}"
        )))
    }

    /// Resolve a reference that may be a range (`2-5`) into items, in
    /// order. Fails wholesale on any bad endpoint -- nothing partial.
    pub fn resolve_range(&self, reference: &str) -> Result<Vec<Item>> {
        let reference = reference.trim();
        if let Some((lo, hi)) = reference.split_once('-')
            && let (Ok(lo), Ok(hi)) = (lo.trim().parse::<usize>(), hi.trim().parse::<usize>())
        {
            if lo == 0 || hi < lo {
                return Err(BurrowError::Reference(format!("bad range: {reference}")));
            }
            return (lo..=hi)
                .map(|n| {
                    self.current_index.get(n).cloned().ok_or_else(|| {
                        BurrowError::Reference(format!(
                            "index {n} out of range (1-{})",
                            self.current_index.len()
                        ))
                    })
                })
                .collect();
        }
        Ok(vec![self.resolve(reference)?])
    }

    // -- Visiting --

    /// Fetch and interpret an item, updating the view state. Returns the
    /// text to print. `query` is the search term for itemtype `7`.
    pub fn visit(&mut self, item: &Item, query: Option<&str>) -> Result<String> {
        let addr = self.effective_address(item);
        let bytes = self.transport.fetch(&addr, query)?;
        let cost = bytes.len();
        let page = self.interpret(item, &addr, bytes);

        self.cache.insert(page_key(&addr, query), page.clone(), cost);
        Ok(self.install(item.clone(), page))
    }

    /// Refetch the current location, bypassing the cache.
    pub fn reload(&mut self) -> Result<String> {
        let item = self
            .current_item
            .clone()
            .ok_or_else(|| BurrowError::Command("nothing to reload yet".to_string()))?;
        self.visit(&item, None)
    }

    /// Turn raw bytes into a page according to the item's type.
    fn interpret(&self, item: &Item, addr: &GopherAddress, bytes: Vec<u8>) -> Page {
        if item.itemtype == '1' || item.itemtype == '7' {
            let text = decode::decode(&bytes, &self.encoding, self.detector.as_deref());
            Page::Menu(Menu::parse(&text))
        } else {
            let mime = classify(item.itemtype, &addr.selector, &bytes);
            let text = if mime.starts_with("text/") {
                Some(decode::decode(&bytes, &self.encoding, self.detector.as_deref()))
            } else {
                None
            };
            Page::Document(Document {
                item: item.clone(),
                raw: bytes,
                text,
                mime,
            })
        }
    }

    /// Install a page as the current view, push the back stack, append
    /// history, and produce the output to print.
    fn install(&mut self, item: Item, page: Page) -> String {
        self.push_snapshot();
        let output = match page {
            Page::Menu(menu) => {
                let index = Index::new(menu.items());
                let rendered = menu.render();
                self.current_index = index.clone();
                self.last_menu = index;
                self.page_offset = 0;
                rendered
            },
            Page::Document(doc) => {
                let output = self.render_document(&doc);
                self.last_document = Some(doc);
                output
            },
        };
        self.history.push((item.clone(), SystemTime::now()));
        self.current_item = Some(item);
        output
    }

    /// Render or dispatch a document. Handler trouble is reported in
    /// the output -- the document still counts as visited.
    fn render_document(&self, doc: &Document) -> String {
        match self.handlers.resolve(&doc.mime) {
            Resolution::PrintText => doc.text.clone().unwrap_or_else(|| {
                decode::decode(&doc.raw, &self.encoding, self.detector.as_deref())
            }),
            Resolution::Template(_) | Resolution::None => {
                match self.handlers.dispatch(&doc.mime, &doc.raw) {
                    Ok(_) => String::new(),
                    Err(e) => format!("{e}"),
                }
            },
        }
    }

    fn effective_address(&self, item: &Item) -> GopherAddress {
        if self.use_tls && !item.address.use_tls {
            item.address.with_tls(true)
        } else {
            item.address.clone()
        }
    }

    fn push_snapshot(&mut self) {
        if self.current_item.is_none() {
            return; // nothing on screen yet
        }
        self.back_stack.push(Snapshot {
            current_item: self.current_item.clone(),
            current_index: self.current_index.clone(),
            last_menu: self.last_menu.clone(),
            last_document: self.last_document.clone(),
            page_offset: self.page_offset,
        });
    }

    // -- Pager --

    /// Print the next page of the last menu (the empty-line command).
    pub fn menu_page(&mut self) -> String {
        if self.page_offset >= self.last_menu.len() {
            return String::new();
        }
        let end = self.page_offset + PAGE_SIZE;
        let out = self
            .last_menu
            .render_range(self.page_offset, Some(end), false);
        self.page_offset = end;
        out
    }

    // -- Index overlays --

    /// Case-insensitive filter of the current index. Destructive to the
    /// current index but composable -- searching a search is legal.
    pub fn search(&mut self, term: &str) -> String {
        let needle = term.to_lowercase();
        let filtered: Vec<Item> = self
            .current_index
            .items()
            .iter()
            .filter(|item| item.display.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        self.current_index = Index::new(filtered);
        if self.current_index.is_empty() {
            "No results found.".to_string()
        } else {
            self.current_index.render(false)
        }
    }

    /// Show the visit history, oldest first, as the current index.
    pub fn history_index(&mut self) -> String {
        let items: Vec<Item> = self.history.iter().map(|(item, _)| item.clone()).collect();
        self.current_index = Index::new(items);
        self.current_index.render(true)
    }

    /// Return to the last menu listing, discarding any search/history/
    /// links overlay.
    pub fn restore_menu(&mut self) -> String {
        self.current_index = self.last_menu.clone();
        self.current_index.render(false)
    }

    /// Scan the last document for URL-looking tokens and make them the
    /// current index. Heuristic by design.
    pub fn links(&mut self) -> Result<String> {
        let doc = self
            .last_document
            .as_ref()
            .ok_or_else(|| BurrowError::Command("no document to scan for links".to_string()))?;
        let text = doc
            .text
            .as_ref()
            .ok_or_else(|| BurrowError::Command("last document is binary".to_string()))?;

        let items: Vec<Item> = text
            .split_whitespace()
            .filter(|word| word.contains("://") && word.contains('.'))
            .filter_map(|word| {
                let word = word.trim_end_matches(['.', ',', ')', '>', ';']);
                GopherAddress::parse(word)
                    .ok()
                    .map(|addr| Item::new(word, addr))
            })
            .collect();
        self.current_index = Index::new(items);
        Ok(self.current_index.render(true))
    }

    // -- Back stack --

    /// Pop the navigation stack and restore that view from its snapshot
    /// -- no refetch. History is a log, not a stack: it keeps growing.
    pub fn back(&mut self) -> Result<String> {
        let snap = self
            .back_stack
            .pop()
            .ok_or_else(|| BurrowError::Command("already at the start of the session".to_string()))?;
        self.current_item = snap.current_item;
        self.current_index = snap.current_index;
        self.last_menu = snap.last_menu;
        self.last_document = snap.last_document;
        self.page_offset = snap.page_offset;
        Ok(self.current_index.render(false))
    }

    // -- Next / previous in the last menu --

    /// Visit the item after the last document's origin in the last menu.
    pub fn next(&mut self) -> Result<String> {
        self.step(1)
    }

    /// Visit the item before the last document's origin in the last menu.
    pub fn previous(&mut self) -> Result<String> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Result<String> {
        let origin = self
            .last_document
            .as_ref()
            .map(|doc| doc.item.clone())
            .or_else(|| self.current_item.clone())
            .ok_or(BurrowError::NoNextItem)?;
        let pos = self.last_menu.position(&origin).ok_or(BurrowError::NoNextItem)?;
        let target = pos
            .checked_add_signed(delta)
            .and_then(|n| self.last_menu.get(n).cloned())
            .ok_or(BurrowError::NoNextItem)?;
        self.visit(&target, None)
    }

    // -- Tour --

    /// Resolve references (ranges allowed) against the current index and
    /// append them to the tour queue. All-or-nothing.
    pub fn tour_enqueue(&mut self, references: &[&str]) -> Result<String> {
        let mut batch = Vec::new();
        for reference in references {
            batch.extend(self.resolve_range(reference)?);
        }
        let added = batch.len();
        self.tour.extend(batch);
        Ok(format!("{added} waypoint(s) added ({} queued).", self.tour.len()))
    }

    /// Visit the next tour waypoint.
    pub fn tour_advance(&mut self) -> Result<String> {
        let item = self.tour.front().cloned().ok_or(BurrowError::EmptyTour)?;
        let output = self.visit(&item, None)?;
        self.tour.pop_front();
        Ok(output)
    }

    // -- Marks --

    /// Bind a single-letter label to the location being viewed.
    pub fn mark(&mut self, label: char) -> Result<()> {
        if !label.is_alphabetic() {
            return Err(BurrowError::Reference(format!(
                "invalid mark '{label}', must be one letter"
            )));
        }
        let item = self
            .current_item
            .clone()
            .ok_or_else(|| BurrowError::Command("you need to go somewhere first".to_string()))?;
        self.marks.insert(label, item);
        Ok(())
    }

    /// List the current marks.
    pub fn list_marks(&self) -> String {
        let mut labels: Vec<&char> = self.marks.keys().collect();
        labels.sort();
        let mut out = String::new();
        for label in labels {
            let item = &self.marks[label];
            out.push_str(&format!("[{label}] {} ({})\n", item.display, item.address));
        }
        out
    }

    /// Jump to a mark: served from the page cache when the page is
    /// still there, refetched otherwise.
    pub fn go_mark(&mut self, label: char) -> Result<String> {
        let item = self
            .marks
            .get(&label)
            .cloned()
            .ok_or_else(|| BurrowError::Reference(format!("no mark '{label}'")))?;
        self.visit_cached(&item)
    }

    /// Visit with cache preference (marks, tour revisits).
    fn visit_cached(&mut self, item: &Item) -> Result<String> {
        let addr = self.effective_address(item);
        let key = page_key(&addr, None);
        if let Some(page) = self.cache.get(&key).cloned() {
            log::debug!("cache hit for {addr}");
            return Ok(self.install(item.clone(), page));
        }
        self.visit(item, None)
    }

    /// Drop all cached pages (used by tests and `reload` semantics).
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    // -- Document utilities --

    /// Save the last document's raw bytes to `path`; refuses to
    /// overwrite.
    pub fn save_document(&self, path: &std::path::Path) -> Result<String> {
        let doc = self
            .last_document
            .as_ref()
            .ok_or_else(|| BurrowError::Command("no document to save".to_string()))?;
        if path.exists() {
            return Err(BurrowError::Command(format!(
                "file already exists: {}",
                path.display()
            )));
        }
        std::fs::write(path, &doc.raw)?;
        Ok(format!("Saved {} bytes to {}.", doc.raw.len(), path.display()))
    }

    /// Run the last document through an arbitrary handler template
    /// (`less %s`, `fold -w 80 -s %s`, ...).
    pub fn pipe_document(&self, template: &str) -> Result<String> {
        let doc = self
            .last_document
            .as_ref()
            .ok_or_else(|| BurrowError::Command("no document to show".to_string()))?;
        crate::handlers::run_template(template, &doc.raw)?;
        Ok(String::new())
    }
}

/// Cache key: canonical address plus search query.
fn page_key(addr: &GopherAddress, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{addr}\t{q}"),
        None => addr.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
