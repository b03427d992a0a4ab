//! External viewer handlers: MIME pattern -> command template.
//!
//! Pattern resolution is pure and unit-tested on its own; the spawn
//! boundary (temp file + child process) is the one side-effecting call.

use std::io::Write;
use std::process::Command;

use burrow_types::error::{BurrowError, Result};
use tempfile::NamedTempFile;

/// One registered handler: a MIME pattern (`type/subtype` or `type/*`)
/// and a command template with a `%s` placeholder for the file path.
#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
    pub pattern: String,
    pub template: String,
}

/// What a MIME type resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// An external command template.
    Template(String),
    /// No handler bound, but the content is text: print it.
    PrintText,
    /// No handler bound at all.
    None,
}

/// Ordered handler table with exact-over-wildcard resolution.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<Handler>,
}

impl HandlerRegistry {
    /// Empty registry -- only the built-in text passthrough applies.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Registry preloaded with conventional Unix viewers.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.set("text/html", "lynx --dump %s");
        reg.set("image/*", "feh %s");
        reg.set("audio/*", "mpg123 %s");
        reg.set("application/pdf", "xpdf %s");
        reg
    }

    /// Bind `pattern` to `template`, replacing any existing binding for
    /// the same pattern. The referenced program is not checked --
    /// failures surface when it is invoked.
    pub fn set(&mut self, pattern: &str, template: &str) {
        if let Some(existing) = self.handlers.iter_mut().find(|h| h.pattern == pattern) {
            existing.template = template.to_string();
        } else {
            self.handlers.push(Handler {
                pattern: pattern.to_string(),
                template: template.to_string(),
            });
        }
    }

    /// Look up the binding for an exact pattern string.
    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.handlers
            .iter()
            .find(|h| h.pattern == pattern)
            .map(|h| h.template.as_str())
    }

    /// All bindings, sorted by pattern (for the `handler` listing).
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .handlers
            .iter()
            .map(|h| (h.pattern.as_str(), h.template.as_str()))
            .collect();
        entries.sort_by_key(|(pattern, _)| *pattern);
        entries
    }

    /// Resolve a MIME type: exact match always beats wildcard,
    /// regardless of insertion order; `text/*` falls back to printing.
    pub fn resolve(&self, mime: &str) -> Resolution {
        if let Some(h) = self.handlers.iter().find(|h| h.pattern == mime) {
            return Resolution::Template(h.template.clone());
        }
        let major = mime.split('/').next().unwrap_or(mime);
        let wildcard = format!("{major}/*");
        if let Some(h) = self.handlers.iter().find(|h| h.pattern == wildcard) {
            return Resolution::Template(h.template.clone());
        }
        if mime.starts_with("text/") {
            return Resolution::PrintText;
        }
        Resolution::None
    }

    /// Materialize `content` to a scoped temp file and run the resolved
    /// handler on it, blocking until the child exits. The temp file is
    /// removed when this call returns, on success and failure alike.
    ///
    /// Returns `Ok(None)` when the content should simply be printed
    /// (text passthrough); `Ok(Some(status))` after a child ran.
    pub fn dispatch(&self, mime: &str, content: &[u8]) -> Result<Option<i32>> {
        match self.resolve(mime) {
            Resolution::Template(template) => run_template(&template, content).map(Some),
            Resolution::PrintText => Ok(None),
            Resolution::None => Err(BurrowError::Handler(format!(
                "no handler bound for {mime} (use: handler {mime} <command %s>)"
            ))),
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Run one command template against `content` via a scoped temp file.
pub fn run_template(template: &str, content: &[u8]) -> Result<i32> {
    // NamedTempFile deletes on drop, which covers every exit path out
    // of this function.
    let mut file = NamedTempFile::new()?;
    file.write_all(content)?;
    file.flush()?;

    let path = file.path().to_string_lossy().into_owned();
    let cmdline = template.replace("%s", &path);
    let words = split_command(&cmdline)?;
    let (program, args) = words
        .split_first()
        .ok_or_else(|| BurrowError::Handler("empty handler command".to_string()))?;

    log::debug!("dispatch: {cmdline}");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| BurrowError::Handler(format!("launch {program}: {e}")))?;
    Ok(status.code().unwrap_or(-1))
}

/// Split a command line into words, honoring single and double quotes
/// and backslash escapes.
fn split_command(input: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '\'' => in_single = true,
                '"' => in_double = true,
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single || in_double {
        return Err(BurrowError::Handler("unterminated quote in handler".to_string()));
    }
    if !current.is_empty() {
        words.push(current);
    }
    Ok(words)
}
