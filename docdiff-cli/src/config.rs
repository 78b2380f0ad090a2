use docdiff_config::load::configuration_directory;
use docdiff_config::load_config;
use docdiff_config::shared::DiffConfig;

use crate::args::Args;
use crate::error::{CliError, CliResult};

/// Loads the diff configuration and applies the command line flags on top.
///
/// The layered configuration is only loaded when a `configuration` directory exists in the
/// working directory, defaults are used otherwise. The result is validated before returning.
pub fn load_diff_config(args: &Args) -> CliResult<DiffConfig> {
    let mut config = match configuration_directory().map_err(CliError::config)? {
        Some(_) => load_config::<DiffConfig>().map_err(CliError::config)?,
        None => DiffConfig::default(),
    };

    args.apply(&mut config);
    config.validate().map_err(CliError::config)?;

    Ok(config)
}
