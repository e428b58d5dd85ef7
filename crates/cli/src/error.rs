//! CLI error types
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Compiler error: {0}")]
    Compiler(#[from] clidi_compiler::CompilerError),

    #[error("{0}")]
    Call(#[from] clidi_compiler::CallError),

    /// Parse errors, help and version requests; callers decide how to exit.
    #[error(transparent)]
    Clap(#[from] clap::Error),

    #[error("{0}")]
    Message(String),
}

pub type CliResult<T> = Result<T, CliError>;
