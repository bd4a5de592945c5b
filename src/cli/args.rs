//! Command-line interface definitions.

use clap::Parser;

/// Compile MJML email templates into HTML
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Keep running: serve the output directory and recompile on change
    #[arg(long)]
    pub watch: bool,
}

impl Cli {
    /// Parse the process arguments.
    ///
    /// Usage errors exit with status 1; `--help` and `--version` exit 0.
    pub fn parse_or_exit() -> Self {
        Self::try_parse().unwrap_or_else(|e| {
            let _ = e.print();
            std::process::exit(exit_code(&e))
        })
    }
}

/// Exit status for a parse outcome that stops the program.
fn exit_code(error: &clap::Error) -> i32 {
    if error.use_stderr() { 1 } else { 0 }
}
