//! Output formatting for CLI.

mod json;
mod text;

pub use json::{
    JsonFormatter, LocationsOutput, SchedulesOutput, StatusOutput, StreetsOutput,
};
pub use text::TextFormatter;
