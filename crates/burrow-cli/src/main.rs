//! burrow entry point: a line-oriented Gopher client.
//!
//! Builds the navigator, feeds the RC file through the interpreter,
//! optionally opens a start URL or the bookmarks index, then loops on
//! stdin until `quit` or EOF.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use burrow_core::{HandlerRegistry, Interpreter, NetTransport, Navigator, Outcome, Prompter};

/// A command line gopher client.
#[derive(Debug, Parser)]
#[command(name = "burrow", version, about)]
struct Args {
    /// Start with the bookmarks index.
    #[arg(long)]
    bookmarks: bool,

    /// Start at this gopher URL.
    url: Option<String>,
}

/// Prompter that asks on the controlling terminal.
struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&mut self, message: &str) -> Option<String> {
        print!("{message}");
        std::io::stdout().flush().ok()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).ok()?;
        let line = line.trim_end_matches(['\r', '\n']);
        Some(line.to_string())
    }
}

fn home_file(name: &str) -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(name)
}

/// Run one line and print whatever comes of it. Returns `false` when
/// the session should end.
fn run_line(
    interp: &Interpreter,
    nav: &mut Navigator,
    line: &str,
    prompter: &mut dyn Prompter,
) -> bool {
    match interp.run_line(nav, line, prompter) {
        Ok(Outcome::Text(text)) => {
            let text = text.trim_end_matches('\n');
            if !text.is_empty() {
                println!("{text}");
            }
            true
        },
        Ok(Outcome::None) => true,
        Ok(Outcome::Quit) => false,
        Err(e) => {
            println!("{e}");
            true
        },
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let mut nav = Navigator::new(Box::new(NetTransport::new()), HandlerRegistry::with_defaults());
    let interp = Interpreter::new(home_file(".burrow-bookmarks.txt"));
    let mut prompter = StdinPrompter;

    println!("Welcome to burrow.");
    println!("Type 'help' for a tour of the controls.");

    // RC file: each line goes through the interpreter before the first
    // prompt, in file order.
    let rc_path = home_file(".burrowrc");
    if let Ok(rc) = std::fs::read_to_string(&rc_path) {
        log::info!("running rc file {}", rc_path.display());
        for line in rc.lines() {
            if !run_line(&interp, &mut nav, line, &mut prompter) {
                return Ok(());
            }
        }
    }

    if args.bookmarks {
        run_line(&interp, &mut nav, "bookmarks", &mut prompter);
    } else if let Some(ref url) = args.url {
        run_line(&interp, &mut nav, &format!("go {url}"), &mut prompter);
    }

    let stdin = std::io::stdin();
    loop {
        print!("burrow> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        if !run_line(&interp, &mut nav, &line, &mut prompter) {
            break;
        }
    }

    println!("See you around Gopherspace.");
    Ok(())
}
