//! Parser for Gopher menus (itemtype `1` and `7` responses).
//!
//! Converts the raw tab-separated menu format into a structured sequence
//! of [`MenuLine`] variants suitable for rendering or indexing.

use burrow_types::Item;

/// A parsed line from a Gopher menu.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuLine {
    /// Display-only text: an `i` info line, a server error (`3`) row,
    /// or any malformed line kept as-is. Menus in the wild are
    /// frequently non-conformant, so nothing here is a parse error.
    Info(String),
    /// A navigable item.
    Item(Item),
}

/// A parsed Gopher menu, in server emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub lines: Vec<MenuLine>,
}

impl Menu {
    /// Parse menu text. Splits on CRLF or bare LF and stops at the
    /// `.` terminator line.
    pub fn parse(input: &str) -> Self {
        let mut lines = Vec::new();

        for raw in input.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line == "." {
                break;
            }
            if line.is_empty() {
                continue;
            }
            lines.push(parse_menu_line(line));
        }

        Menu { lines }
    }

    /// The navigable items, in order. Info lines don't take part in
    /// numbering.
    pub fn items(&self) -> Vec<Item> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                MenuLine::Item(item) => Some(item.clone()),
                MenuLine::Info(_) => None,
            })
            .collect()
    }

    /// Render the menu for the terminal: info lines verbatim, items
    /// numbered 1-based in emission order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut n = 0;
        for line in &self.lines {
            match line {
                MenuLine::Info(text) => out.push_str(text),
                MenuLine::Item(item) => {
                    n += 1;
                    out.push_str(&format!("[{n}] {}", item.display));
                },
            }
            out.push('\n');
        }
        out
    }
}

/// Parse one non-terminator menu line.
fn parse_menu_line(line: &str) -> MenuLine {
    // Server error rows carry their message in the display field.
    if line.starts_with('3') {
        let msg = line[1..].split('\t').next().unwrap_or("");
        return MenuLine::Info(format!("Error from server: {msg}"));
    }
    if let Some(rest) = line.strip_prefix('i') {
        let text = rest.split('\t').next().unwrap_or("");
        return MenuLine::Info(text.to_string());
    }
    match Item::from_menu_line(line) {
        Some(item) => MenuLine::Item(item),
        None => MenuLine::Info(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_item_menu() {
        let menu = Menu::parse("1Phlog\t/phlog\texample.org\t70\r\n.\r\n");
        assert_eq!(menu.lines.len(), 1);
        let items = menu.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].itemtype, '1');
        assert_eq!(items[0].display, "Phlog");
        assert_eq!(items[0].address.host, "example.org");
        assert_eq!(items[0].address.port, 70);
        assert_eq!(items[0].address.selector, "/phlog");
    }

    #[test]
    fn parse_stops_at_terminator() {
        let menu = Menu::parse(
            "0One\t/one\texample.org\t70\r\n.\r\n0After\t/after\texample.org\t70\r\n",
        );
        assert_eq!(menu.items().len(), 1);
    }

    #[test]
    fn parse_accepts_bare_lf() {
        let menu = Menu::parse("0One\t/one\texample.org\t70\n0Two\t/two\texample.org\t70\n.\n");
        assert_eq!(menu.items().len(), 2);
    }

    #[test]
    fn info_lines_are_display_only() {
        let menu = Menu::parse(
            "iWelcome to the hole\t\terror.host\t1\r\n1Phlog\t/phlog\texample.org\t70\r\n.\r\n",
        );
        assert_eq!(menu.lines.len(), 2);
        assert_eq!(
            menu.lines[0],
            MenuLine::Info("Welcome to the hole".to_string())
        );
        assert_eq!(menu.items().len(), 1);
    }

    #[test]
    fn malformed_lines_become_info() {
        let menu = Menu::parse("this line has no tabs\r\n1Ok\t/ok\texample.org\t70\r\n.\r\n");
        assert_eq!(
            menu.lines[0],
            MenuLine::Info("this line has no tabs".to_string())
        );
        assert_eq!(menu.items().len(), 1);
    }

    #[test]
    fn bad_port_becomes_info() {
        let menu = Menu::parse("1Name\t/sel\thost\tseventy\r\n.\r\n");
        assert!(matches!(menu.lines[0], MenuLine::Info(_)));
    }

    #[test]
    fn server_error_row_becomes_info() {
        let menu = Menu::parse("3'/nope' does not exist\t\terror.host\t1\r\n.\r\n");
        assert_eq!(
            menu.lines[0],
            MenuLine::Info("Error from server: '/nope' does not exist".to_string())
        );
        assert!(menu.items().is_empty());
    }

    #[test]
    fn items_preserve_emission_order() {
        let menu = Menu::parse(
            "0Zebra\t/z\texample.org\t70\r\n0Alpha\t/a\texample.org\t70\r\n.\r\n",
        );
        let items = menu.items();
        assert_eq!(items[0].display, "Zebra");
        assert_eq!(items[1].display, "Alpha");
    }

    #[test]
    fn render_numbers_items_and_keeps_info_inline() {
        let menu = Menu::parse(
            "iAbout\t\tnull.host\t1\r\n1Phlog\t/phlog\texample.org\t70\r\n\
             0Notes\t/notes\texample.org\t70\r\n.\r\n",
        );
        let rendered = menu.render();
        assert_eq!(rendered, "About\n[1] Phlog\n[2] Notes\n");
    }

    #[test]
    fn round_trip_preserves_wire_fields() {
        let input = "1Phlog\t/phlog\texample.org\t70\r\n\
                     9Tarball\t/files/a.tar.gz\tfiles.example.org\t7070\r\n.\r\n";
        let menu = Menu::parse(input);
        let lines: Vec<String> = menu.items().iter().map(|i| i.to_menu_line("")).collect();
        assert_eq!(
            lines,
            vec![
                "1Phlog\t/phlog\texample.org\t70",
                "9Tarball\t/files/a.tar.gz\tfiles.example.org\t7070",
            ]
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_field() -> impl Strategy<Value = String> {
            // Printable text without tabs, CR, or LF.
            "[a-zA-Z0-9 ._/-]{0,20}"
        }

        proptest! {
            #[test]
            fn well_formed_lines_round_trip(
                ty in "[0-9a-zA-Z]",
                display in arb_field(),
                selector in arb_field(),
                host in "[a-z0-9.-]{1,20}",
                port in 1u16..,
            ) {
                // Itemtypes `3` and `i` are display-only by design.
                prop_assume!(ty != "3" && ty != "i");
                let line = format!("{ty}{display}\t{selector}\t{host}\t{port}");
                let menu = Menu::parse(&format!("{line}\r\n.\r\n"));
                let items = menu.items();
                prop_assert_eq!(items.len(), 1);
                prop_assert_eq!(items[0].to_menu_line(""), line);
            }

            #[test]
            fn parse_never_panics(input in ".{0,500}") {
                let _ = Menu::parse(&input);
            }
        }
    }
}
