//! clidi CLI
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.

mod commands;
mod utils;

use clidi::{CliError, CliResult, DiApp};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Build the demo application: root callback plus every demo command.
pub(crate) fn build_app() -> CliResult<DiApp> {
    let mut app = DiApp::with_callback("clidi", &commands::root())?
        .about("clidi - dependency-injected commands on top of clap");

    app.command(None, &commands::greet::command())?;
    app.command(None, &commands::describe::command())?;
    app.command(None, &commands::completion::command())?;

    Ok(app)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CLIDI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_value(value: &Value) {
    match value {
        Value::Null => {}
        Value::String(text) => println!("{text}"),
        other => println!("{other}"),
    }
}

fn main() {
    init_logging();

    let exit_code = match build_app().and_then(|app| app.run(std::env::args_os())) {
        Ok(value) => {
            print_value(&value);
            0
        }
        Err(CliError::Clap(e)) => e.exit(),
        Err(e) => {
            eprintln!("✗ Command failed");
            eprintln!("  Error: {e}");
            1
        }
    };

    std::process::exit(exit_code);
}
