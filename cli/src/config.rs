use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use regexercise::Backend;
use serde::{Deserialize, Serialize};

/// Configuration for the CLI.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Configuration for the `search` and `exec` commands.
    pub search: SearchConfig,
}

/// Configuration for the `search` and `exec` commands.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Backend used by `search`.
    pub engine: Backend,
    /// Maximum number of characters read from the input. Zero means no
    /// limit.
    pub max_chars: usize,
    /// Print the text that follows the match.
    pub print_leftover: bool,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            engine: Backend::default(),
            max_chars: 0,
            print_leftover: true,
        }
    }
}

/// Load a config file from a given path. Path must contain a valid TOML file
/// or this function will propagate the error. Settings missing in the file
/// take their default values.
pub fn load_config_from_file(
    config_file: &Path,
) -> Result<Config, Box<figment::Error>> {
    let config: Config =
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file_exact(config_file))
            .extract()?;
    Ok(config)
}
