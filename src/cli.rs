//! CLI domain: parse, route, output, and presentation only.
//! No pipeline logic; a single route table dispatches to the library.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{map_error, write_document, EXIT_CHECK_FAILED, EXIT_FAILURE, EXIT_SUCCESS};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_check_result, format_fields_json, format_fields_text, format_generation_summary,
    format_models, TemplateCheck, TerminalProgress,
};
pub use route::{CommandOutput, RunContext};
