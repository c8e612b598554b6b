mod commands;
mod config;
mod help;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::{io, panic, process};

use anyhow::Context;
use crossterm::tty::IsTty;
use yansi::Color::Red;
use yansi::Paint;

use crate::commands::cli;
use crate::config::{load_config_from_file, Config};

const APP_HELP_TEMPLATE: &str = r#"rex {version}, regular expressions for character streams.

{author-with-newline}
{before-help}{usage-heading}
  {usage}

{all-args}{after-help}
"#;

/// Exit status when the search completes without finding a match.
const EXIT_NO_MATCH: i32 = 1;
const EXIT_ERROR: i32 = 2;
const CONFIG_FILE: &str = ".rex.toml";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // If stdout is not a tty (for example, because it was redirected to a
    // file) turn off colors.
    if !io::stdout().is_tty() {
        yansi::disable();
    }

    let args = cli().get_matches();

    // Panics must terminate the process with the same status as any other
    // error.
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(EXIT_ERROR);
    }));

    let result = load_config(args.get_one::<PathBuf>("config")).and_then(
        |config| match args.subcommand() {
            Some(("search", args)) => {
                commands::exec_search(args, &config.search)
            }
            Some(("exec", args)) => commands::exec_exec(args, &config.search),
            Some(("compile", args)) => {
                commands::exec_compile(args).map(|_| true)
            }
            Some(("debug", args)) => commands::exec_debug(args).map(|_| true),
            _ => unreachable!(),
        },
    );

    match result {
        Ok(true) => Ok(()),
        Ok(false) => process::exit(EXIT_NO_MATCH),
        Err(err) => {
            if let Some(source) = err.source() {
                eprintln!("{} {}: {}", "error:".paint(Red).bold(), err, source);
            } else {
                eprintln!("{} {}", "error:".paint(Red).bold(), err);
            }
            process::exit(EXIT_ERROR);
        }
    }
}

/// Loads the configuration from the file given with `--config`, or from
/// `~/.rex.toml` if it exists. Returns the default configuration otherwise.
fn load_config(config_file: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config_file = match config_file {
        Some(path) => path.clone(),
        None => match home::home_dir() {
            Some(home_path) if !home_path.as_os_str().is_empty() => {
                let path = home_path.join(CONFIG_FILE);
                if !path.is_file() {
                    return Ok(Config::default());
                }
                path
            }
            _ => return Ok(Config::default()),
        },
    };

    log::debug!("loading config from `{}`", config_file.display());

    load_config_from_file(&config_file).with_context(|| {
        format!("invalid config file `{}`", config_file.display())
    })
}
