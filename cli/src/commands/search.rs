use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgMatches, Command};
use regexercise::{Backend, Engine};

use crate::commands::{run_search, SearchOptions};
use crate::config::SearchConfig;
use crate::help;

pub fn search() -> Command {
    super::search_args(
        super::command("search")
            .about("Search for a regular expression in a file")
            .arg(arg!(<PATTERN>).help("Regular expression to search for"))
            .arg(
                arg!(-e --"engine" <ENGINE>)
                    .help("Backend used for the search (nfa, vm)")
                    .long_help(help::ENGINE_LONG_HELP)
                    .value_parser(value_parser!(Backend)),
            ),
    )
}

pub fn exec_search(
    args: &ArgMatches,
    config: &SearchConfig,
) -> anyhow::Result<bool> {
    let pattern = args.get_one::<String>("PATTERN").unwrap();
    let input_path = args.get_one::<PathBuf>("INPUT_PATH");

    let engine = Engine::new(
        args.get_one::<Backend>("engine").copied().unwrap_or(config.engine),
    );

    let compiled = engine
        .parse(pattern)
        .and_then(|pattern| engine.compile(&pattern))
        .with_context(|| format!("invalid pattern `{}`", pattern))?;

    log::debug!("searching with the {} backend", engine.backend());

    run_search(&compiled, input_path, &SearchOptions::new(args, config))
}
