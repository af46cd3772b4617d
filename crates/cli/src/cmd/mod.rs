pub mod doctor;
pub mod list;

use std::path::Path;

use wikiscript_core::config::loader::{ConfigLoader, default_config_path};
use wikiscript_core::config::types::ResolvedConfig;

/// Load the configuration and start logging, or report and exit.
pub fn load_config(command: &str, config: Option<&Path>) -> ResolvedConfig {
    match ConfigLoader::load(config) {
        Ok(rc) => {
            if let Err(e) = crate::logging::init(&rc.logging) {
                println!("FAIL wikiscript {command}");
                println!("cannot open log file {e}");
                exit(1);
            }
            rc
        }
        Err(e) => {
            println!("FAIL wikiscript {command}");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            exit(1);
        }
    }
}

/// Exit after flushing the log file.
pub fn exit(code: i32) -> ! {
    crate::logging::flush();
    std::process::exit(code);
}
