//! Command-line application built from flattened functions
//!
//! The application only ever sees plain parameters: it knows nothing about dependency
//! callbacks. Each registered [`FlatFunction`] becomes the root command (single-command
//! mode) or a subcommand, and its parameters become clap arguments.

use crate::error::{CliError, CliResult};
use crate::params::{collect_kwargs, to_arg};
use clap::{Arg, ArgMatches, Command};
use clap_complete::{generate, Shell};
use clidi_compiler::{CallArgs, FlatFunction};
use serde_json::Value;
use std::ffi::OsString;
use std::io::Write;

pub struct App {
    name: String,
    about: Option<String>,
    callback: Option<FlatFunction>,
    commands: Vec<(String, FlatFunction)>,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            callback: None,
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Use `function` as the root callback, run before any command.
    pub fn register_callback(&mut self, function: FlatFunction) {
        if let Some(previous) = &self.callback {
            tracing::warn!(
                previous = %previous.identity().qualname,
                callback = %function.identity().qualname,
                "replacing application callback"
            );
        }
        self.callback = Some(function);
    }

    /// Register `function` as a command. Without a name, the function name is used with
    /// `_` replaced by `-`.
    pub fn register_command(&mut self, name: Option<&str>, function: FlatFunction) {
        let name = name.map_or_else(
            || function.identity().name.replace('_', "-"),
            ToString::to_string,
        );
        tracing::debug!(command = %name, params = function.signature().params.len(), "registered command");
        self.commands.push((name, function));
    }

    /// One command and no callback: the command's parameters sit on the root.
    fn single_command(&self) -> Option<&FlatFunction> {
        match (&self.callback, self.commands.as_slice()) {
            (None, [(_, function)]) => Some(function),
            _ => None,
        }
    }

    /// The clap command tree for this application.
    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut root = Command::new(self.name.clone());
        if let Some(about) = &self.about {
            root = root.about(about.clone());
        }

        if let Some(function) = self.single_command() {
            return with_params(with_doc(root, function, self.about.is_none()), function);
        }

        if let Some(callback) = &self.callback {
            root = with_params(with_doc(root, callback, self.about.is_none()), callback);
        }
        if !self.commands.is_empty() {
            root = root.subcommand_required(true).arg_required_else_help(true);
        }
        for (name, function) in &self.commands {
            let command = with_doc(Command::new(name.clone()), function, true);
            root = root.subcommand(with_params(command, function));
        }
        root
    }

    /// Parse `argv` (program name first), run the callback if any, then the selected
    /// command, and return the command's value.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Clap` for parse errors and help requests, and `CliError::Call`
    /// when a callback fails.
    pub fn run<I, T>(&self, argv: I) -> CliResult<Value>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.build_command().try_get_matches_from(argv)?;

        if let Some(function) = self.single_command() {
            return invoke(function, &matches);
        }

        let mut result = Value::Null;
        if let Some(callback) = &self.callback {
            result = invoke(callback, &matches)?;
        }

        let Some((name, sub_matches)) = matches.subcommand() else {
            return Ok(result);
        };
        let function = self
            .commands
            .iter()
            .find_map(|(command, function)| (command == name).then_some(function))
            .ok_or_else(|| CliError::Message(format!("Unknown command: {name}")))?;
        invoke(function, sub_matches)
    }

    /// Help text of the root command.
    #[must_use]
    pub fn render_help(&self) -> String {
        self.build_command().render_help().to_string()
    }

    /// Write a completion script for `shell` to `out`.
    pub fn write_completions(&self, shell: Shell, bin_name: &str, out: &mut dyn Write) {
        generate(shell, &mut self.build_command(), bin_name, out);
    }
}

fn with_doc(command: Command, function: &FlatFunction, use_doc: bool) -> Command {
    match &function.identity().doc {
        Some(doc) if use_doc => command.about(doc.clone()),
        _ => command,
    }
}

/// Adds the function's parameters as arguments. Required positionals go before optional
/// ones, each group keeping declaration order, since clap indexes positionals in order.
fn with_params(command: Command, function: &FlatFunction) -> Command {
    let (leading, trailing): (Vec<Arg>, Vec<Arg>) = function
        .signature()
        .params
        .iter()
        .map(to_arg)
        .partition(|arg| !arg.is_positional() || arg.is_required_set());
    command.args(leading).args(trailing)
}

fn invoke(function: &FlatFunction, matches: &ArgMatches) -> CliResult<Value> {
    let kwargs = collect_kwargs(function.signature(), matches)?;
    tracing::debug!(function = %function.identity().qualname, supplied = kwargs.len(), "invoking");
    Ok(function.call(CallArgs::named(kwargs))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::assert_words_in_message;
    use clidi_compiler::{compile, Annotation, Callback, ParamInfo, Parameter};
    use serde_json::json;

    fn flat(callback: &Callback) -> FlatFunction {
        compile(callback).unwrap()
    }

    fn add_command() -> Callback {
        Callback::builder("add_numbers")
            .doc("Add two numbers")
            .param(Parameter::new("x").annotated(Annotation::int()))
            .param(
                Parameter::new("y")
                    .annotated(Annotation::int())
                    .default_value(json!(1)),
            )
            .build(|args| Ok(json!(args.get::<i64>("x")? + args.get::<i64>("y")?)))
    }

    #[test]
    fn test_single_command_mode() {
        let mut app = App::new("calc");
        app.register_command(None, flat(&add_command()));

        assert_eq!(app.run(["calc", "2"]).unwrap(), json!(3));
        assert_eq!(app.run(["calc", "2", "--y", "5"]).unwrap(), json!(7));

        let help = app.render_help();
        assert_words_in_message("Add two numbers", &help, true);
        assert_words_in_message("--y <INTEGER>", &help, true);
    }

    #[test]
    fn test_default_command_name() {
        let mut app = App::new("calc");
        app.register_command(None, flat(&add_command()));
        app.register_command(Some("other"), flat(&add_command()));

        assert_eq!(app.run(["calc", "add-numbers", "1", "--y", "1"]).unwrap(), json!(2));
        assert_eq!(app.run(["calc", "other", "4"]).unwrap(), json!(5));
    }

    #[test]
    fn test_callback_runs_before_command() {
        let order = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let root = {
            let order = std::sync::Arc::clone(&order);
            Callback::builder("main")
                .param(
                    Parameter::new("verbose")
                        .annotated(Annotation::bool())
                        .default_value(json!(false)),
                )
                .build(move |args| {
                    order.lock().unwrap().push(format!("main:{}", args.get::<bool>("verbose")?));
                    Ok(Value::Null)
                })
        };
        let hello = {
            let order = std::sync::Arc::clone(&order);
            Callback::builder("hello").build(move |_| {
                order.lock().unwrap().push("hello".to_string());
                Ok(json!("done"))
            })
        };

        let mut app = App::new("tool");
        app.register_callback(flat(&root));
        app.register_command(None, flat(&hello));

        assert_eq!(app.run(["tool", "--verbose", "hello"]).unwrap(), json!("done"));
        assert_eq!(*order.lock().unwrap(), vec!["main:true", "hello"]);
    }

    #[test]
    fn test_untyped_default_keeps_its_type() {
        let add = Callback::builder("add")
            .param(Parameter::new("x").annotated(Annotation::int()))
            .param(Parameter::new("y").default_value(json!(1)))
            .build(|args| Ok(json!(args.get::<i64>("x")? + args.get::<i64>("y")?)));
        let mut app = App::new("calc");
        app.register_command(None, flat(&add));

        assert_eq!(app.run(["calc", "2"]).unwrap(), json!(3));
        assert_eq!(app.run(["calc", "2", "--y", "5"]).unwrap(), json!(7));
    }

    #[test]
    fn test_optional_positional_before_required() {
        let copy = Callback::builder("copy")
            .param(Parameter::new("src").with_info(ParamInfo::argument().default_value(json!("."))))
            .param(Parameter::new("dst").with_info(ParamInfo::argument()))
            .build(|args| {
                Ok(json!(format!(
                    "{} -> {}",
                    args.get::<String>("src")?,
                    args.get::<String>("dst")?
                )))
            });
        let mut app = App::new("tool");
        app.register_command(None, flat(&copy));

        assert_eq!(app.run(["tool", "out"]).unwrap(), json!(". -> out"));
        assert_eq!(app.run(["tool", "out", "in"]).unwrap(), json!("in -> out"));
        assert!(matches!(app.run(["tool"]), Err(CliError::Clap(_))));
        assert_words_in_message("<DST> [SRC]", &app.render_help(), true);
    }

    #[test]
    fn test_missing_subcommand_is_clap_error() {
        let mut app = App::new("calc");
        app.register_command(Some("one"), flat(&add_command()));
        app.register_command(Some("two"), flat(&add_command()));

        assert!(matches!(app.run(["calc"]), Err(CliError::Clap(_))));
        assert!(matches!(app.run(["calc", "three"]), Err(CliError::Clap(_))));
    }

    #[test]
    fn test_call_errors_are_surfaced() {
        let failing = Callback::builder("fail")
            .build(|_| Err(anyhow::anyhow!("Settings file not found").into()));
        let mut app = App::new("tool");
        app.register_command(None, flat(&failing));

        let err = app.run(["tool"]).unwrap_err();
        assert!(matches!(err, CliError::Call(_)));
        assert_eq!(err.to_string(), "Settings file not found");
    }

    #[test]
    fn test_write_completions() {
        let mut app = App::new("calc");
        app.register_command(Some("add"), flat(&add_command()));
        app.register_command(Some("again"), flat(&add_command()));

        let mut out = Vec::new();
        app.write_completions(Shell::Bash, "calc", &mut out);
        let script = String::from_utf8(out).unwrap();

        assert!(script.contains("calc"));
        assert!(script.contains("again"));
    }
}
