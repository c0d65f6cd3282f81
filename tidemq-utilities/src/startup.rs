use log::info;
use tidemq_models::SendableError;

use crate::{
    dirutils,
    logger::{self, print_env, LoggerOptions},
};

/// Common process bootstrap for tidemq binaries.
///
/// Moves into the executable's directory so the log file lands next to it,
/// installs the logger and routes panics through it.
pub fn startup(name: &str, options: &LoggerOptions) -> Result<(), SendableError> {
    dirutils::set_exe_dir_as_cwd()?;
    logger::setup_logger(options)?;
    log_panics::init();

    info!("--- {} ---", name);
    print_env()?;

    Ok(())
}
