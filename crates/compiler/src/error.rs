/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
use thiserror::Error;

/// Top-level error type for the compiler
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("Compilation error: {0}")]
    Compilation(#[from] CompilationError),

    #[error("Builder error: {0}")]
    Builder(BuilderError),

    /// Surfaced as-is: a deferred annotation could not be evaluated.
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

impl From<BuilderError> for CompilerError {
    fn from(err: BuilderError) -> Self {
        match err {
            BuilderError::Annotation(err) => Self::Annotation(err),
            other => Self::Builder(other),
        }
    }
}

/// Errors detected while walking a dependency tree
#[derive(Error, Debug)]
pub enum CompilationError {
    #[error(
        "Duplicated parameter name '{name}' in '{callback}' (already declared by '{first}').\n\
         Please, make sure to have unique names in the whole dependency tree."
    )]
    DuplicateParameter {
        name: String,
        callback: String,
        first: String,
    },

    #[error("Dependency cycle detected: '{callback}' depends on itself")]
    Cycle { callback: String },
}

/// Errors raised by the function builder
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Compilation failed: {reason}\nProgram text:\n{program}")]
    Synthesis { reason: String, program: String },

    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

/// Errors raised while evaluating deferred annotations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Name '{name}' is not defined in the scope of '{callback}'")]
    UnresolvedName { name: String, callback: String },

    #[error("Annotation '{name}' is defined in terms of itself")]
    CircularDefinition { name: String },
}

/// Errors raised while invoking a callback or a flattened function
#[derive(Error, Debug)]
pub enum CallError {
    #[error("{function}() missing required argument '{name}'")]
    MissingArgument { function: String, name: String },

    #[error("{function}() got an unexpected argument '{name}'")]
    UnexpectedArgument { function: String, name: String },

    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArgument { function: String, name: String },

    #[error("{function}() takes {expected} positional arguments but {given} were given")]
    TooManyArguments {
        function: String,
        expected: usize,
        given: usize,
    },

    #[error("Invalid value for argument '{name}': {source}")]
    InvalidArgument {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

pub type CallResult = Result<serde_json::Value, CallError>;
