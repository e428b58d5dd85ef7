//! Dependency-injection adapter over [`App`]
//!
//! Every callback handed to [`DiApp`] is compiled into a flat function before it reaches
//! the application, so dependency parameters turn into the leaf options and arguments of
//! their callbacks. The caller always gets its original callback back.

use crate::app::App;
use crate::error::CliResult;
use clap_complete::Shell;
use clidi_compiler::{compile, Callback};
use serde_json::Value;
use std::ffi::OsString;
use std::io::Write;

pub struct DiApp {
    app: App,
}

impl DiApp {
    pub fn new(name: impl Into<String>) -> Self {
        Self { app: App::new(name) }
    }

    /// Create an application whose root callback is `callback`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Compiler` if the callback's dependency tree does not compile.
    pub fn with_callback(name: impl Into<String>, callback: &Callback) -> CliResult<Self> {
        let mut app = Self::new(name);
        app.callback(callback)?;
        Ok(app)
    }

    #[must_use]
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.app = self.app.about(about);
        self
    }

    /// Register `callback` as the root callback.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Compiler` if the callback's dependency tree does not compile.
    pub fn callback(&mut self, callback: &Callback) -> CliResult<Callback> {
        self.app.register_callback(compile(callback)?);
        Ok(callback.clone())
    }

    /// Register `callback` as a command, named `name` or after the callback.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Compiler` if the callback's dependency tree does not compile.
    pub fn command(&mut self, name: Option<&str>, callback: &Callback) -> CliResult<Callback> {
        self.app.register_command(name, compile(callback)?);
        Ok(callback.clone())
    }

    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// See [`App::run`].
    ///
    /// # Errors
    ///
    /// Same as [`App::run`].
    pub fn run<I, T>(&self, argv: I) -> CliResult<Value>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.app.run(argv)
    }

    #[must_use]
    pub fn render_help(&self) -> String {
        self.app.render_help()
    }

    pub fn write_completions(&self, shell: Shell, bin_name: &str, out: &mut dyn Write) {
        self.app.write_completions(shell, bin_name, out);
    }
}
