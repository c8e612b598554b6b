mod compile;
mod debug;
mod exec;
mod search;

pub use compile::*;
pub use debug::*;
pub use exec::*;
pub use search::*;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{arg, command, crate_authors, value_parser, ArgMatches, Command};
use regexercise::Searcher;
use yansi::Color::{Green, Yellow};
use yansi::Paint;

use crate::config::SearchConfig;
use crate::{commands, help, APP_HELP_TEMPLATE};

pub fn command(name: &'static str) -> Command {
    Command::new(name).help_template(
        r#"{about-with-newline}
{usage-heading}
  {usage}

{all-args}
"#,
    )
}

pub fn cli() -> Command {
    command!()
        .author(crate_authors!("\n")) // requires `cargo` feature
        .arg_required_else_help(true)
        .arg(
            arg!(-C --config <CONFIG_FILE> "Config file")
                .value_parser(existing_path_parser)
                .long_help(help::CONFIG_FILE),
        )
        .help_template(APP_HELP_TEMPLATE)
        .after_help(help::EXIT_STATUS)
        .subcommand_required(true)
        .subcommands(vec![
            commands::search(),
            commands::compile(),
            commands::exec(),
            commands::debug(),
        ])
}

/// Arguments shared by the commands that run a search.
fn search_args(command: Command) -> Command {
    command
        .arg(
            arg!([INPUT_PATH])
                .help("File to search in (standard input if not given)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"max-chars" <N>)
                .help("Maximum number of characters read from the input")
                .long_help(help::MAX_CHARS_LONG_HELP)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"no-leftover")
                .help("Don't print the text that follows the match"),
        )
}

/// Parses a path and makes sure that it exists.
fn existing_path_parser(input: &str) -> Result<PathBuf, anyhow::Error> {
    let path = PathBuf::from(input);
    if path.try_exists()? {
        Ok(path)
    } else {
        Err(anyhow!("file not found"))
    }
}

/// Reads the whole input, either from `path` or from the standard input.
///
/// The input must be valid UTF-8.
fn read_input(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("can not read `{}`", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("can not read from standard input")?;
            Ok(input)
        }
    }
}

/// Options that control how a search is run and reported.
struct SearchOptions {
    max_chars: usize,
    print_leftover: bool,
}

impl SearchOptions {
    fn new(args: &ArgMatches, config: &SearchConfig) -> Self {
        Self {
            max_chars: args
                .get_one::<usize>("max-chars")
                .copied()
                .unwrap_or(config.max_chars),
            print_leftover: config.print_leftover
                && !args.get_flag("no-leftover"),
        }
    }
}

/// Searches with `searcher` in the input, printing the outcome. Returns
/// true if a match was found.
fn run_search<S: Searcher>(
    searcher: &S,
    input_path: Option<&PathBuf>,
    options: &SearchOptions,
) -> anyhow::Result<bool> {
    let input = read_input(input_path)?;
    let mut chars = input.chars();

    let limit = match options.max_chars {
        0 => usize::MAX,
        n => n,
    };

    let found = searcher.find(chars.by_ref().take(limit));

    match found {
        Some(m) => {
            println!("{} {}", "match".paint(Green).bold(), m);
            if options.print_leftover {
                println!("{}", chars.as_str());
            }
            Ok(true)
        }
        None => {
            println!("{}", "no match".paint(Yellow));
            Ok(false)
        }
    }
}
