//! Config command - show configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{ConfigManager, Workspace};
use crate::error::SlipwayResult;

/// Execute the config command
pub async fn execute(args: ConfigArgs, ws: &Workspace) -> SlipwayResult<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let text = toml::to_string_pretty(&ws.config)?;
            print!("{}", text);
        }
        ConfigAction::Path => {
            println!("{}", ConfigManager::default_config_path().display());
        }
    }

    Ok(())
}
