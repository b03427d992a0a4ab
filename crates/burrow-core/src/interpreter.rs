//! Command parsing and dispatch.
//!
//! One REPL line parses into a tagged [`Command`]; `execute` applies it
//! to the navigator. Parsing never touches state, so an unknown or
//! ambiguous command leaves the session exactly where it was.

use std::path::{Path, PathBuf};

use burrow_types::error::{BurrowError, Result};
use burrow_types::{GopherAddress, Item};

use crate::bookmarks;
use crate::decode;
use crate::nav::Navigator;

/// The full command-name table. Any unambiguous non-empty prefix of
/// these names is accepted.
const COMMANDS: &[&str] = &[
    "add",
    "back",
    "bookmarks",
    "fold",
    "go",
    "handler",
    "help",
    "history",
    "less",
    "links",
    "ls",
    "mark",
    "next",
    "previous",
    "quit",
    "exit",
    "reload",
    "root",
    "save",
    "search",
    "set",
    "tour",
    "up",
    "url",
    "veronica",
];

/// Fixed abbreviations, checked before prefix matching (so `h` means
/// `history` even though `handler` and `help` share the prefix).
const ABBREVS: &[(&str, &str)] = &[
    ("a", "add"),
    ("b", "back"),
    ("bm", "bookmarks"),
    ("book", "bookmarks"),
    ("f", "fold"),
    ("g", "go"),
    ("h", "history"),
    ("hist", "history"),
    ("l", "less"),
    ("li", "links"),
    ("m", "mark"),
    ("n", "next"),
    ("p", "previous"),
    ("prev", "previous"),
    ("q", "quit"),
    ("r", "reload"),
    ("s", "save"),
    ("se", "search"),
    ("t", "tour"),
    ("v", "veronica"),
];

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Empty line: page through the last menu.
    MenuPage,
    /// Bare index number or mark label.
    VisitRef(String),
    Go(String),
    Reload,
    Up,
    Root,
    Back,
    Next,
    Previous,
    /// Re-list the last menu.
    Ls,
    History,
    Search(String),
    Links,
    /// Empty = advance the tour; otherwise enqueue references.
    Tour(Vec<String>),
    /// `None` lists marks.
    Mark(Option<String>),
    Save(String),
    Url,
    Less,
    Fold,
    /// Bookmark the current location, optionally renamed.
    Add(String),
    Bookmarks,
    Veronica(String),
    Handler {
        pattern: Option<String>,
        template: Option<String>,
    },
    Set {
        option: Option<(String, String)>,
    },
    Help,
    Quit,
}

/// What `execute` hands back to the REPL loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Lines to print.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Leave the session.
    Quit,
}

/// Source of interactive answers (the type-7 "Query term" prompt).
/// The REPL supplies stdin; tests and RC scripts supply canned text.
pub trait Prompter {
    fn prompt(&mut self, message: &str) -> Option<String>;
}

/// A prompter that always answers the same thing.
pub struct CannedPrompter(pub Option<String>);

impl Prompter for CannedPrompter {
    fn prompt(&mut self, _message: &str) -> Option<String> {
        self.0.clone()
    }
}

/// Parse one input line into a [`Command`].
pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::MenuPage);
    }
    if line == ".." {
        return Ok(Command::Up);
    }
    if let Some(term) = line.strip_prefix('/') {
        return Ok(Command::Search(term.trim().to_string()));
    }
    if line.parse::<usize>().is_ok() {
        return Ok(Command::VisitRef(line.to_string()));
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let word_lower = word.to_ascii_lowercase();

    let name = if let Some((_, full)) = ABBREVS.iter().find(|(ab, _)| *ab == word_lower) {
        full
    } else if let Some(full) = COMMANDS.iter().find(|c| **c == word_lower) {
        full
    } else {
        let matches: Vec<&str> = COMMANDS
            .iter()
            .filter(|c| c.starts_with(&word_lower))
            .copied()
            .collect();
        match matches.len() {
            1 => matches[0],
            0 => {
                // A lone letter that names no command is a mark jump.
                if rest.is_empty() && word.chars().count() == 1 {
                    return Ok(Command::VisitRef(word.to_string()));
                }
                return Err(BurrowError::Command(format!("unknown command: {word}")));
            },
            _ => {
                return Err(BurrowError::Command(format!(
                    "ambiguous command '{word}' ({})",
                    matches.join(", ")
                )));
            },
        }
    };

    build_command(name, rest)
}

/// Turn a resolved command name plus its argument text into a variant.
fn build_command(name: &str, rest: &str) -> Result<Command> {
    match name {
        "go" => {
            if rest.is_empty() {
                return Err(BurrowError::Command("go where?".to_string()));
            }
            Ok(Command::Go(rest.to_string()))
        },
        "reload" => Ok(Command::Reload),
        "up" => Ok(Command::Up),
        "root" => Ok(Command::Root),
        "back" => Ok(Command::Back),
        "next" => Ok(Command::Next),
        "previous" => Ok(Command::Previous),
        "ls" => Ok(Command::Ls),
        "history" => Ok(Command::History),
        "search" => Ok(Command::Search(rest.to_string())),
        "links" => Ok(Command::Links),
        "tour" => Ok(Command::Tour(
            rest.split_whitespace().map(str::to_string).collect(),
        )),
        "mark" => Ok(Command::Mark(if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        })),
        "save" => {
            if rest.is_empty() {
                return Err(BurrowError::Command("usage: save <filename>".to_string()));
            }
            Ok(Command::Save(rest.to_string()))
        },
        "url" => Ok(Command::Url),
        "less" => Ok(Command::Less),
        "fold" => Ok(Command::Fold),
        "add" => Ok(Command::Add(rest.to_string())),
        "bookmarks" => Ok(Command::Bookmarks),
        "veronica" => {
            if rest.is_empty() {
                return Err(BurrowError::Command("usage: veronica <term>".to_string()));
            }
            Ok(Command::Veronica(rest.to_string()))
        },
        "handler" => {
            let (pattern, template) = match rest.split_once(char::is_whitespace) {
                Some((p, t)) => (Some(p.to_string()), Some(t.trim().to_string())),
                None if rest.is_empty() => (None, None),
                None => (Some(rest.to_string()), None),
            };
            Ok(Command::Handler { pattern, template })
        },
        "set" => {
            let option = match rest.split_once(char::is_whitespace) {
                Some((key, value)) => Some((key.to_string(), value.trim().to_string())),
                None if rest.is_empty() => None,
                None => {
                    return Err(BurrowError::Command(format!("set {rest} to what?")));
                },
            };
            Ok(Command::Set { option })
        },
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(BurrowError::Command(format!("unknown command: {other}"))),
    }
}

/// The command executor: owns the collaborator paths, applies commands
/// to a navigator.
pub struct Interpreter {
    pub bookmarks_path: PathBuf,
}

/// Veronica-2 search engine location.
const VERONICA_HOST: &str = "gopher.floodgap.com";
const VERONICA_SELECTOR: &str = "/v2/vs";

impl Interpreter {
    pub fn new(bookmarks_path: PathBuf) -> Self {
        Self { bookmarks_path }
    }

    /// Parse and execute one line.
    pub fn run_line(
        &self,
        nav: &mut Navigator,
        line: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<Outcome> {
        let command = parse(line)?;
        self.execute(nav, command, prompter)
    }

    /// Apply one command. Failures leave the navigator untouched.
    pub fn execute(
        &self,
        nav: &mut Navigator,
        command: Command,
        prompter: &mut dyn Prompter,
    ) -> Result<Outcome> {
        match command {
            Command::MenuPage => Ok(Outcome::Text(nav.menu_page())),
            Command::VisitRef(reference) => {
                let item = nav.resolve(&reference)?;
                visit_item(nav, &item, prompter).map(Outcome::Text)
            },
            Command::Go(target) => self.go(nav, &target, prompter),
            Command::Reload => nav.reload().map(Outcome::Text),
            Command::Up => {
                let current = require_location(nav)?;
                let addr = current.address.parent();
                let item = Item::new(&addr.to_string(), addr);
                visit_item(nav, &item, prompter).map(Outcome::Text)
            },
            Command::Root => {
                let current = require_location(nav)?;
                let addr = current.address.root();
                let item = Item::new(&format!("Root of {}", addr.host), addr);
                visit_item(nav, &item, prompter).map(Outcome::Text)
            },
            Command::Back => nav.back().map(Outcome::Text),
            Command::Next => nav.next().map(Outcome::Text),
            Command::Previous => nav.previous().map(Outcome::Text),
            Command::Ls => Ok(Outcome::Text(nav.restore_menu())),
            Command::History => Ok(Outcome::Text(nav.history_index())),
            Command::Search(term) => Ok(Outcome::Text(nav.search(&term))),
            Command::Links => nav.links().map(Outcome::Text),
            Command::Tour(refs) => {
                if refs.is_empty() {
                    nav.tour_advance().map(Outcome::Text)
                } else {
                    let refs: Vec<&str> = refs.iter().map(String::as_str).collect();
                    nav.tour_enqueue(&refs).map(Outcome::Text)
                }
            },
            Command::Mark(None) => Ok(Outcome::Text(nav.list_marks())),
            Command::Mark(Some(label)) => {
                let label = single_char(&label)?;
                nav.mark(label)?;
                Ok(Outcome::None)
            },
            Command::Save(filename) => {
                nav.save_document(Path::new(&filename)).map(Outcome::Text)
            },
            Command::Url => {
                let current = require_location(nav)?;
                Ok(Outcome::Text(current.address.to_string()))
            },
            Command::Less => nav.pipe_document("less %s").map(|_| Outcome::None),
            Command::Fold => nav.pipe_document("fold -w 80 -s %s").map(|_| Outcome::None),
            Command::Add(name) => {
                let current = require_location(nav)?;
                bookmarks::append_bookmark(&self.bookmarks_path, &current, &name)?;
                Ok(Outcome::Text("Bookmarked.".to_string()))
            },
            Command::Bookmarks => {
                let index = bookmarks::load_bookmarks(&self.bookmarks_path)?;
                if index.is_empty() {
                    return Ok(Outcome::Text(
                        "No bookmarks yet -- try 'add' somewhere nice.".to_string(),
                    ));
                }
                let listing = index.render(true);
                nav.seed_index(index);
                Ok(Outcome::Text(listing))
            },
            Command::Veronica(term) => {
                let addr =
                    GopherAddress::from_parts(VERONICA_HOST, 70, '7', VERONICA_SELECTOR);
                let item = Item::new("Veronica-2 search", addr);
                nav.visit(&item, Some(&term)).map(Outcome::Text)
            },
            Command::Handler { pattern, template } => {
                self.handler_command(nav, pattern, template)
            },
            Command::Set { option } => set_command(nav, option),
            Command::Help => Ok(Outcome::Text(help_text())),
            Command::Quit => Ok(Outcome::Quit),
        }
    }

    fn go(
        &self,
        nav: &mut Navigator,
        target: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<Outcome> {
        // Single letters are mark jumps first, URLs second.
        if let Ok(label) = single_char(target)
            && label.is_alphabetic()
            && nav.resolve(target).is_ok()
        {
            return nav.go_mark(label).map(Outcome::Text);
        }
        let addr = GopherAddress::parse(target)?;
        let item = Item::new(target, addr);
        visit_item(nav, &item, prompter).map(Outcome::Text)
    }

    fn handler_command(
        &self,
        nav: &mut Navigator,
        pattern: Option<String>,
        template: Option<String>,
    ) -> Result<Outcome> {
        match (pattern, template) {
            (None, _) => {
                let list = nav.handlers.list();
                if list.is_empty() {
                    return Ok(Outcome::Text("(no handlers bound)".to_string()));
                }
                let mut out = String::new();
                for (pattern, template) in list {
                    out.push_str(&format!("{pattern:24} {template}\n"));
                }
                Ok(Outcome::Text(out))
            },
            (Some(pattern), None) => match nav.handlers.get(&pattern) {
                Some(template) => Ok(Outcome::Text(format!("{pattern}   {template}"))),
                None => Ok(Outcome::Text(format!("No handler set for {pattern}"))),
            },
            (Some(pattern), Some(template)) => {
                nav.handlers.set(&pattern, &template);
                if template.contains("%s") {
                    Ok(Outcome::None)
                } else {
                    Ok(Outcome::Text(
                        "Note: template has no %s placeholder, the file path \
                         will not be passed."
                            .to_string(),
                    ))
                }
            },
        }
    }
}

/// Visit an item, prompting for the search term on type-7 items that
/// don't already carry one.
fn visit_item(nav: &mut Navigator, item: &Item, prompter: &mut dyn Prompter) -> Result<String> {
    let query = if item.itemtype == '7' {
        match item.address.query.clone() {
            Some(q) => Some(q),
            None => prompter.prompt("Query term: "),
        }
    } else {
        None
    };
    nav.visit(item, query.as_deref())
}

fn require_location(nav: &Navigator) -> Result<Item> {
    nav.current_item()
        .cloned()
        .ok_or_else(|| BurrowError::Command("you need to go somewhere first".to_string()))
}

fn single_char(s: &str) -> Result<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(BurrowError::Command(format!("not a single character: {s}"))),
    }
}

fn set_command(nav: &mut Navigator, option: Option<(String, String)>) -> Result<Outcome> {
    match option {
        None => Ok(Outcome::Text(format!(
            "encoding {}\ntls {}",
            nav.encoding,
            if nav.use_tls { "on" } else { "off" }
        ))),
        Some((key, value)) => match key.as_str() {
            "encoding" => {
                if !decode::known_charset(&value) {
                    return Err(BurrowError::Command(format!("unknown charset: {value}")));
                }
                nav.encoding = value;
                Ok(Outcome::None)
            },
            "tls" => {
                nav.use_tls = match value.as_str() {
                    "on" => true,
                    "off" => false,
                    other => {
                        return Err(BurrowError::Command(format!(
                            "set tls on|off (not '{other}')"
                        )));
                    },
                };
                Ok(Outcome::None)
            },
            other => Err(BurrowError::Command(format!("unknown option: {other}"))),
        },
    }
}

fn help_text() -> String {
    "Navigation:\n\
     \x20 go <url|mark>   visit a URL or mark     <number>  visit by index\n\
     \x20 back, next, previous, up, root, reload  move around\n\
     \x20 tour <refs> / tour                      queue up / advance\n\
     \x20 mark <letter> / mark                    set / list marks\n\
     Index views:\n\
     \x20 ls, history, links, /term (search), <empty line> pages the menu\n\
     Documents:\n\
     \x20 less, fold, save <file>, url\n\
     Bookmarks:\n\
     \x20 add [name], bookmarks\n\
     Settings:\n\
     \x20 handler [pattern template], set encoding <charset>, set tls on|off\n\
     quit to leave."
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerRegistry;
    use crate::test_utils::{FakeTransport, item, menu_body};

    fn setup(transport: &FakeTransport) -> (Interpreter, Navigator) {
        let dir = std::env::temp_dir().join("burrow-interp-tests-nonexistent");
        let interp = Interpreter::new(dir);
        let nav = Navigator::new(Box::new(transport.clone()), HandlerRegistry::new());
        (interp, nav)
    }

    fn no_prompt() -> CannedPrompter {
        CannedPrompter(None)
    }

    // -- Parsing ------------------------------------------------------------

    #[test]
    fn empty_line_is_menu_page() {
        assert_eq!(parse("").unwrap(), Command::MenuPage);
        assert_eq!(parse("   ").unwrap(), Command::MenuPage);
    }

    #[test]
    fn bare_integer_is_a_reference() {
        assert_eq!(parse("3").unwrap(), Command::VisitRef("3".to_string()));
        assert_eq!(parse(" 12 ").unwrap(), Command::VisitRef("12".to_string()));
    }

    #[test]
    fn lone_unknown_letter_is_a_mark_reference() {
        assert_eq!(parse("x").unwrap(), Command::VisitRef("x".to_string()));
    }

    #[test]
    fn abbreviations_expand() {
        assert_eq!(parse("g example.org").unwrap(), Command::Go("example.org".into()));
        assert_eq!(parse("h").unwrap(), Command::History);
        assert_eq!(parse("hist").unwrap(), Command::History);
        assert_eq!(parse("bm").unwrap(), Command::Bookmarks);
        assert_eq!(parse("t 1-3").unwrap(), Command::Tour(vec!["1-3".into()]));
        assert_eq!(parse("q").unwrap(), Command::Quit);
    }

    #[test]
    fn unambiguous_prefixes_resolve() {
        assert_eq!(parse("hist").unwrap(), Command::History);
        assert_eq!(parse("bo").unwrap(), Command::Bookmarks);
        assert_eq!(parse("ve term").unwrap(), Command::Veronica("term".into()));
        assert_eq!(parse("rel").unwrap(), Command::Reload);
    }

    #[test]
    fn ambiguous_prefix_is_an_error() {
        // "u" could be either up or url, and has no fixed abbreviation.
        let err = parse("u").unwrap_err();
        assert!(matches!(err, BurrowError::Command(_)), "u: up vs url");
        let msg = format!("{err}");
        assert!(msg.contains("up") && msg.contains("url"), "{msg}");
    }

    #[test]
    fn unknown_command_is_an_error() {
        let err = parse("frobnicate now").unwrap_err();
        assert!(matches!(err, BurrowError::Command(_)));
    }

    #[test]
    fn slash_is_search() {
        assert_eq!(parse("/phlog").unwrap(), Command::Search("phlog".into()));
    }

    #[test]
    fn dotdot_is_up() {
        assert_eq!(parse("..").unwrap(), Command::Up);
    }

    #[test]
    fn go_without_target_is_an_error() {
        assert!(parse("go").is_err());
    }

    #[test]
    fn case_insensitive_command_names() {
        assert_eq!(parse("GO example.org").unwrap(), Command::Go("example.org".into()));
        assert_eq!(parse("Quit").unwrap(), Command::Quit);
    }

    #[test]
    fn handler_arities() {
        assert_eq!(
            parse("handler").unwrap(),
            Command::Handler {
                pattern: None,
                template: None
            }
        );
        assert_eq!(
            parse("handler image/png").unwrap(),
            Command::Handler {
                pattern: Some("image/png".into()),
                template: None
            }
        );
        assert_eq!(
            parse("handler image/png feh %s").unwrap(),
            Command::Handler {
                pattern: Some("image/png".into()),
                template: Some("feh %s".into())
            }
        );
    }

    #[test]
    fn set_arities() {
        assert_eq!(parse("set").unwrap(), Command::Set { option: None });
        assert_eq!(
            parse("set encoding koi8-r").unwrap(),
            Command::Set {
                option: Some(("encoding".into(), "koi8-r".into()))
            }
        );
        assert!(parse("set encoding").is_err());
    }

    // -- Execution ----------------------------------------------------------

    #[test]
    fn end_to_end_menu_then_numeric_visit() {
        let transport = FakeTransport::new()
            .respond("", &menu_body(&["1Phlog\tphlog\texample.org\t70"]))
            .respond("phlog", &menu_body(&["0Post\t/post\texample.org\t70"]));
        let (interp, mut nav) = setup(&transport);

        let out = interp
            .run_line(&mut nav, "go example.org", &mut no_prompt())
            .unwrap();
        assert_eq!(out, Outcome::Text("[1] Phlog\n".to_string()));
        let first = nav.current_index().get(1).unwrap();
        assert_eq!(first.itemtype, '1');
        assert_eq!(first.display, "Phlog");
        assert_eq!(first.address.host, "example.org");
        assert_eq!(first.address.port, 70);
        assert_eq!(first.address.selector, "phlog");

        let out = interp.run_line(&mut nav, "1", &mut no_prompt()).unwrap();
        assert_eq!(out, Outcome::Text("[1] Post\n".to_string()));
        assert_eq!(nav.history_len(), 2);
    }

    #[test]
    fn tour_scenario_from_the_repl() {
        let transport = FakeTransport::new()
            .respond(
                "",
                &menu_body(&[
                    "0One\t/one\texample.org\t70",
                    "0Two\t/two\texample.org\t70",
                    "0Three\t/three\texample.org\t70",
                ]),
            )
            .respond("/one", b"one\n")
            .respond("/two", b"two\n")
            .respond("/three", b"three\n");
        let (interp, mut nav) = setup(&transport);
        interp
            .run_line(&mut nav, "go example.org", &mut no_prompt())
            .unwrap();

        interp.run_line(&mut nav, "tour 1-3", &mut no_prompt()).unwrap();
        for expected in ["one\n", "two\n", "three\n"] {
            let out = interp.run_line(&mut nav, "tour", &mut no_prompt()).unwrap();
            assert_eq!(out, Outcome::Text(expected.to_string()));
        }
        let err = interp.run_line(&mut nav, "tour", &mut no_prompt()).unwrap_err();
        assert!(matches!(err, BurrowError::EmptyTour));
    }

    #[test]
    fn mark_and_go_mark_from_the_repl() {
        let transport = FakeTransport::new()
            .respond("", &menu_body(&["0A\t/a\texample.org\t70"]))
            .respond("/other", &menu_body(&["0B\t/b\texample.org\t70"]));
        let (interp, mut nav) = setup(&transport);
        interp
            .run_line(&mut nav, "go example.org", &mut no_prompt())
            .unwrap();
        interp.run_line(&mut nav, "mark x", &mut no_prompt()).unwrap();
        interp
            .run_line(&mut nav, "go example.org/1/other", &mut no_prompt())
            .unwrap();

        let fetches = transport.fetch_count();
        let out = interp.run_line(&mut nav, "go x", &mut no_prompt()).unwrap();
        assert_eq!(out, Outcome::Text("[1] A\n".to_string()));
        assert_eq!(transport.fetch_count(), fetches, "marked menu came from cache");
    }

    #[test]
    fn type7_prompts_for_query() {
        let transport = FakeTransport::new()
            .respond("", &menu_body(&["7Search\t/find\texample.org\t70"]))
            .respond("/find", &menu_body(&["0Hit\t/hit\texample.org\t70"]));
        let (interp, mut nav) = setup(&transport);
        interp
            .run_line(&mut nav, "go example.org", &mut no_prompt())
            .unwrap();

        let mut prompter = CannedPrompter(Some("needle".to_string()));
        interp.run_line(&mut nav, "1", &mut prompter).unwrap();
        assert_eq!(transport.fetched(1).1.as_deref(), Some("needle"));
    }

    #[test]
    fn failed_command_leaves_state_for_the_next_one() {
        let transport = FakeTransport::new().respond(
            "",
            &menu_body(&["0One\t/one\texample.org\t70"]),
        );
        let (interp, mut nav) = setup(&transport);
        interp
            .run_line(&mut nav, "go example.org", &mut no_prompt())
            .unwrap();
        let index_before = nav.current_index().clone();

        assert!(interp.run_line(&mut nav, "99", &mut no_prompt()).is_err());
        assert!(interp.run_line(&mut nav, "wat", &mut no_prompt()).is_err());
        assert_eq!(nav.current_index(), &index_before);
    }

    #[test]
    fn set_encoding_validates_charset() {
        let transport = FakeTransport::new();
        let (interp, mut nav) = setup(&transport);
        interp
            .run_line(&mut nav, "set encoding koi8-r", &mut no_prompt())
            .unwrap();
        assert_eq!(nav.encoding, "koi8-r");
        assert!(
            interp
                .run_line(&mut nav, "set encoding martian-9", &mut no_prompt())
                .is_err()
        );
        assert_eq!(nav.encoding, "koi8-r");
    }

    #[test]
    fn set_tls_toggles_session_default() {
        let transport = FakeTransport::new().respond("", &menu_body(&[]));
        let (interp, mut nav) = setup(&transport);
        interp
            .run_line(&mut nav, "set tls on", &mut no_prompt())
            .unwrap();
        assert!(nav.use_tls);
        interp
            .run_line(&mut nav, "go example.org", &mut no_prompt())
            .unwrap();
        assert!(transport.fetched(0).0.use_tls);
        interp
            .run_line(&mut nav, "set tls off", &mut no_prompt())
            .unwrap();
        assert!(!nav.use_tls);
    }

    #[test]
    fn handler_set_and_list() {
        let transport = FakeTransport::new();
        let (interp, mut nav) = setup(&transport);
        interp
            .run_line(&mut nav, "handler image/png feh %s", &mut no_prompt())
            .unwrap();
        let out = interp.run_line(&mut nav, "handler", &mut no_prompt()).unwrap();
        match out {
            Outcome::Text(text) => assert!(text.contains("image/png") && text.contains("feh %s")),
            other => panic!("expected text, got {other:?}"),
        }
        // Missing %s earns a note but still binds.
        let out = interp
            .run_line(&mut nav, "handler audio/* mpg123", &mut no_prompt())
            .unwrap();
        assert!(matches!(out, Outcome::Text(t) if t.contains("%s")));
        assert_eq!(nav.handlers.get("audio/*"), Some("mpg123"));
    }

    #[test]
    fn bookmarks_round_trip_through_the_file() {
        let transport = FakeTransport::new().respond(
            "",
            &menu_body(&["0A\t/a\texample.org\t70"]),
        );
        let dir = tempfile::tempdir().unwrap();
        let interp = Interpreter::new(dir.path().join("bookmarks.txt"));
        let mut nav = Navigator::new(Box::new(transport.clone()), HandlerRegistry::new());

        interp
            .run_line(&mut nav, "go example.org", &mut no_prompt())
            .unwrap();
        interp
            .run_line(&mut nav, "add my homepage", &mut no_prompt())
            .unwrap();

        let out = interp
            .run_line(&mut nav, "bookmarks", &mut no_prompt())
            .unwrap();
        match out {
            Outcome::Text(text) => assert!(text.contains("my homepage"), "{text}"),
            other => panic!("expected text, got {other:?}"),
        }
        assert_eq!(nav.current_index().len(), 1);
        assert_eq!(nav.current_index().get(1).unwrap().display, "my homepage");
    }

    #[test]
    fn url_prints_current_location() {
        let transport = FakeTransport::new().respond("", &menu_body(&[]));
        let (interp, mut nav) = setup(&transport);
        assert!(interp.run_line(&mut nav, "url", &mut no_prompt()).is_err());
        interp
            .run_line(&mut nav, "go example.org", &mut no_prompt())
            .unwrap();
        let out = interp.run_line(&mut nav, "url", &mut no_prompt()).unwrap();
        assert_eq!(out, Outcome::Text("gopher://example.org/1".to_string()));
    }

    #[test]
    fn veronica_queries_floodgap() {
        let transport = FakeTransport::new().respond(
            VERONICA_SELECTOR,
            &menu_body(&["0Hit\t/hit\texample.org\t70"]),
        );
        let (interp, mut nav) = setup(&transport);
        interp
            .run_line(&mut nav, "veronica kennedy", &mut no_prompt())
            .unwrap();
        let (addr, query) = transport.fetched(0);
        assert_eq!(addr.host, VERONICA_HOST);
        assert_eq!(addr.selector, VERONICA_SELECTOR);
        assert_eq!(query.as_deref(), Some("kennedy"));
    }

    #[test]
    fn quit_returns_quit_outcome() {
        let transport = FakeTransport::new();
        let (interp, mut nav) = setup(&transport);
        assert_eq!(
            interp.run_line(&mut nav, "quit", &mut no_prompt()).unwrap(),
            Outcome::Quit
        );
        assert_eq!(
            interp.run_line(&mut nav, "exit", &mut no_prompt()).unwrap(),
            Outcome::Quit
        );
    }
}
