use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgMatches, Command};
use regexercise::Program;

use crate::commands::{run_search, SearchOptions};
use crate::config::SearchConfig;

pub fn exec() -> Command {
    super::search_args(
        super::command("exec")
            .about("Run a compiled program on a file")
            .arg(
                arg!(<PROGRAM_PATH>)
                    .help("Path to a program produced by `rex compile`")
                    .value_parser(value_parser!(PathBuf)),
            ),
    )
}

pub fn exec_exec(
    args: &ArgMatches,
    config: &SearchConfig,
) -> anyhow::Result<bool> {
    let program_path = args.get_one::<PathBuf>("PROGRAM_PATH").unwrap();
    let input_path = args.get_one::<PathBuf>("INPUT_PATH");

    let file = File::open(program_path).with_context(|| {
        format!("can not open `{}`", program_path.display())
    })?;

    let program = Program::deserialize_from(file).with_context(|| {
        format!("can not load program from `{}`", program_path.display())
    })?;

    run_search(&program, input_path, &SearchOptions::new(args, config))
}
