//! Information display handlers

use crate::cli::output::print_config;
use crate::cli::output::print_hazards;
use crate::AppConfig;
use crate::Result;

pub fn handle_hazards_command() -> Result<()> {
    print_hazards();
    Ok(())
}

pub fn handle_config_command(config: &AppConfig) -> Result<()> {
    print_config(config);
    Ok(())
}
