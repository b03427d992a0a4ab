//! The numbered lookup table that `go by number` resolves against.

use burrow_types::Item;

/// An ordered, 1-based addressable sequence of navigable items.
///
/// Produced by a fetched menu, a search, a history listing, a bookmarks
/// file, or a links scan of a document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Index {
    items: Vec<Item>,
}

impl Index {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up by 1-based position.
    pub fn get(&self, n: usize) -> Option<&Item> {
        if n == 0 {
            return None;
        }
        self.items.get(n - 1)
    }

    /// 1-based position of an item, if present.
    pub fn position(&self, item: &Item) -> Option<usize> {
        self.items.iter().position(|i| i == item).map(|p| p + 1)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Render a slice of the index: `[n] display` lines, with the item
    /// URL appended when `show_url` is set (history and links views).
    pub fn render_range(&self, offset: usize, end: Option<usize>, show_url: bool) -> String {
        let end = end.unwrap_or(self.items.len()).min(self.items.len());
        let mut out = String::new();
        for (i, item) in self.items[offset.min(end)..end].iter().enumerate() {
            let n = offset + i + 1;
            if show_url {
                out.push_str(&format!("[{n}] {} ({})\n", item.display, item.address));
            } else {
                out.push_str(&format!("[{n}] {}\n", item.display));
            }
        }
        out
    }

    pub fn render(&self, show_url: bool) -> String {
        self.render_range(0, None, show_url)
    }
}

impl From<Vec<Item>> for Index {
    fn from(items: Vec<Item>) -> Self {
        Self::new(items)
    }
}
