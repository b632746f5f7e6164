//! UI module for consistent CLI output
//!
//! Uses `cliclack` step output and spinners with automatic fallback to
//! plain text in CI/non-interactive environments, plus an `indicatif`
//! progress bar for image builds.

mod context;
mod output;
mod progress;
mod theme;

pub use context::UiContext;
pub use output::{intro, outro_success, step_error, step_info, step_ok_detail, step_warn};
pub use progress::{BuildProgress, TaskSpinner};
pub use theme::{init_theme, SlipwayTheme};
