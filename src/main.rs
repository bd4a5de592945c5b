//! mjml-build - compile MJML email templates into HTML.

mod cli;
mod compiler;
mod config;
mod core;
mod logger;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use cli::Cli;
use cli::build::{build_all, ensure_source_dir};
use compiler::{CompileContext, MjmlCompiler};
use config::ProjectConfig;

fn main() {
    if let Err(e) = run() {
        error!("mjml"; "{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse_or_exit();
    let config = ProjectConfig::load()?;
    logger::set_verbose(config.verbose);

    ensure_source_dir(&config)?;
    let compiler = MjmlCompiler::from_config(&config.compiler)?;
    let ctx = CompileContext::new(Arc::new(config), Arc::new(compiler));

    build_all(&ctx)?;

    if !cli.watch {
        return Ok(());
    }

    let server = cli::serve::start_server(&ctx.config)?;
    let watched = watch::watch(ctx);
    server.stop();
    watched
}
