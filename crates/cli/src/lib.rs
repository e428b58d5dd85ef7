//! clidi CLI Library
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.
//!
//! Dependency-injected commands on top of clap. Commands and the root callback are
//! declared as [`Callback`](clidi_compiler::Callback)s whose parameters may depend on
//! other callbacks; [`DiApp`] flattens each of them with the compiler and exposes the
//! leaf parameters as options and arguments.
//!
//! # Example
//!
//! ```rust
//! use clidi::DiApp;
//! use clidi_compiler::{Callback, ParamInfo, Parameter};
//! use serde_json::{json, Value};
//!
//! let get_config = Callback::builder("get_config")
//!     .param(Parameter::new("x").with_info(ParamInfo::option().default_value(Value::Null).decl("--config")))
//!     .build(|args| Ok(json!([args.value("x").cloned().unwrap_or(Value::Null)])));
//! let command = Callback::builder("command")
//!     .param(Parameter::new("cfg").depends_on(&get_config))
//!     .build(|args| Ok(args.value("cfg").cloned().unwrap_or(Value::Null)));
//!
//! let mut app = DiApp::new("tool");
//! app.command(None, &command)?;
//! assert_eq!(app.run(["tool", "--config", "test/path"])?, json!(["test/path"]));
//! # Ok::<(), clidi::CliError>(())
//! ```

pub mod app;
pub mod di;
pub mod error;
mod params;

#[cfg(test)]
mod test_helpers;

pub use app::App;
pub use di::DiApp;
pub use error::{CliError, CliResult};
