pub mod read;
pub mod states;

use colored::{ColoredString, Colorize};
use docsync_core::DisplayState;

/// Display state label colored by severity.
pub fn display_label(state: DisplayState) -> ColoredString {
    let label = state.as_str();
    match state {
        DisplayState::ContentFresh => label.green().bold(),
        DisplayState::ContentStaleRefreshing
        | DisplayState::ContentStaleReady
        | DisplayState::ContentStaleTimeout => label.yellow().bold(),
        DisplayState::ContentNotFound | DisplayState::ContentStaleError => label.red().bold(),
        DisplayState::Checking | DisplayState::InitialBuild => label.cyan().bold(),
    }
}
