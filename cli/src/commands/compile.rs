use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgMatches, Command};
use regexercise::{compile_pattern, parse};

pub fn compile() -> Command {
    super::command("compile")
        .about("Compile a regular expression to a program")
        .arg(arg!(<PATTERN>).help("Regular expression to compile"))
        .arg(
            arg!(-o --"output" <OUTPUT_PATH>)
                .help("Output file with the compiled program")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}

pub fn exec_compile(args: &ArgMatches) -> anyhow::Result<()> {
    let pattern = args.get_one::<String>("PATTERN").unwrap();
    let output_path = args.get_one::<PathBuf>("output").unwrap();

    let program = parse(pattern)
        .and_then(|pattern| compile_pattern(&pattern))
        .with_context(|| format!("invalid pattern `{}`", pattern))?;

    let output_file = File::create(output_path).with_context(|| {
        format!("can not write `{}`", output_path.display())
    })?;

    Ok(program.serialize_into(&output_file)?)
}
