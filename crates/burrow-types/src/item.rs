//! Menu items and their tab-separated wire form.

use std::fmt;

use crate::address::GopherAddress;

/// One navigable row of a Gopher menu: the itemtype, the text the server
/// wants shown, and the address the row points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    pub itemtype: char,
    pub display: String,
    pub address: GopherAddress,
}

impl Item {
    /// Build an item pointing at `address`, displayed as `display`.
    pub fn new(display: &str, address: GopherAddress) -> Self {
        Self {
            itemtype: address.itemtype,
            display: display.to_string(),
            address,
        }
    }

    /// Parse one `itemtype+display TAB selector TAB host TAB port` menu
    /// line. Returns `None` for lines that don't carry all four fields
    /// or whose port is not a number -- callers treat those as info text.
    pub fn from_menu_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.splitn(4, '\t');
        let display_field = fields.next()?;
        let selector = fields.next()?;
        let host = fields.next()?;
        // Anything after the port (Gopher+ columns) is ignored.
        let port_field = fields.next()?.split('\t').next()?;
        let port = port_field.trim().parse::<u16>().ok()?;

        let mut chars = display_field.chars();
        let itemtype = chars.next()?;
        let display = chars.as_str().to_string();

        let address = GopherAddress::from_parts(host, port, itemtype, selector);
        Some(Self {
            itemtype,
            display,
            address,
        })
    }

    /// Serialize back to the tab-separated menu-line form (used verbatim
    /// by the bookmarks file). `display_override` replaces the stored
    /// display string when non-empty.
    pub fn to_menu_line(&self, display_override: &str) -> String {
        let display = if display_override.is_empty() {
            &self.display
        } else {
            display_override
        };
        format!(
            "{}{}\t{}\t{}\t{}",
            self.itemtype, display, self.address.selector, self.address.host, self.address.port
        )
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}
