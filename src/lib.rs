//! Installs a terminal command that launches the CC Insights desktop app.
//!
//! The pieces are small: find the `.app` bundle the running executable lives
//! in, decide whether that location is stable enough to point a launcher at,
//! render the launcher script, and make sure `~/.local/bin` is on `PATH`.

pub mod bundle;
pub mod command_validation;
pub mod config;
pub mod env_util;
pub mod fs_util;
pub mod path_util;
pub mod rc_file;
pub mod script;
pub mod shell;

#[cfg(test)]
mod test_support;

pub use bundle::{check_app_location, resolve_app_bundle_path, AppLocationCheck};
pub use rc_file::{add_to_path, add_to_path_blocking, remove_from_path, PathUpdate, PathUpdateError};
pub use script::{generate_script, install_launcher, remove_launcher};
