//! Bookmark persistence: a flat file in menu-line format.
//!
//! The file is read and written verbatim -- one serialized menu line per
//! bookmark, parsed with the same leniency as a live menu.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use burrow_types::Item;
use burrow_types::error::Result;

use crate::index::Index;

/// Parse bookmark-file contents into an index. Unparsable lines are
/// skipped (they can't be navigated to anyway).
pub fn parse_bookmarks(contents: &str) -> Index {
    let items: Vec<Item> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(Item::from_menu_line)
        .collect();
    Index::new(items)
}

/// Append one bookmark line to the file, creating it if needed.
/// `name` overrides the item's display string when non-empty.
pub fn append_bookmark(path: &Path, item: &Item, name: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", item.to_menu_line(name))?;
    Ok(())
}

/// Load the bookmarks file into an index. A missing file is an empty
/// index, not an error.
pub fn load_bookmarks(path: &Path) -> Result<Index> {
    if !path.exists() {
        return Ok(Index::default());
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_bookmarks(&contents))
}
