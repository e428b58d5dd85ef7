//! Greet command implementation
//!
//! `greet` depends on two callbacks, `greeting` and `punctuation`, which both depend on
//! one shared `load_settings` callback. The settings file is read once per invocation.

use crate::utils::config::{read_settings, Settings};
use clidi_compiler::{Annotation, Callback, Metadata, ParamInfo, Parameter};
use serde_json::Value;
use std::path::PathBuf;

/// Reads the optional `--config` YAML file.
pub fn load_settings() -> Callback {
    Callback::builder("load_settings")
        .qualname("greet::load_settings")
        .param(
            Parameter::new("config").annotated(Annotation::path()).with_info(
                ParamInfo::option()
                    .default_value(Value::Null)
                    .decl("--config")
                    .help("YAML settings file")
                    .envvar("CLIDI_CONFIG"),
            ),
        )
        .build(|args| {
            let settings = match args.get::<Option<PathBuf>>("config")? {
                Some(path) => read_settings(&path).map_err(anyhow::Error::from)?,
                None => Settings::default(),
            };
            tracing::debug!(greeting = %settings.greeting, "loaded settings");
            Ok(serde_json::to_value(settings).map_err(anyhow::Error::from)?)
        })
}

/// The configured greeting, unless `--greeting` overrides it.
pub fn greeting(settings: &Callback) -> Callback {
    Callback::builder("greeting")
        .qualname("greet::greeting")
        .param(Parameter::new("settings").depends_on(settings))
        .param(
            Parameter::new("greeting").annotated(Annotation::str()).with_info(
                ParamInfo::option()
                    .default_value(Value::Null)
                    .decl("--greeting")
                    .help("Greeting to use instead of the configured one"),
            ),
        )
        .build(|args| {
            let settings: Settings = args.get("settings")?;
            let text = args
                .get::<Option<String>>("greeting")?
                .unwrap_or(settings.greeting);
            Ok(Value::String(text))
        })
}

pub fn punctuation(settings: &Callback) -> Callback {
    Callback::builder("punctuation")
        .qualname("greet::punctuation")
        .param(Parameter::new("settings").depends_on(settings))
        .build(|args| {
            let settings: Settings = args.get("settings")?;
            Ok(Value::String(settings.punctuation))
        })
}

/// The `greet` command with its dependency tree.
pub fn command() -> Callback {
    let settings = load_settings();

    Callback::builder("greet")
        .qualname("greet::greet")
        .doc("Greet someone")
        .param(Parameter::new("name").annotated(
            Annotation::str().with(Metadata::Info(ParamInfo::argument().help("Who to greet"))),
        ))
        .param(
            Parameter::new("shout").annotated(Annotation::bool()).with_info(
                ParamInfo::option()
                    .default_value(Value::Bool(false))
                    .decl("--shout")
                    .help("Print the greeting in upper case"),
            ),
        )
        .param(Parameter::new("text").depends_on(&greeting(&settings)))
        .param(Parameter::new("mark").depends_on(&punctuation(&settings)))
        .build(|args| {
            let name: String = args.get("name")?;
            let text: String = args.get("text")?;
            let mark: String = args.get("mark")?;

            let message = format!("{text}, {name}{mark}");
            let message = if args.get("shout")? {
                message.to_uppercase()
            } else {
                message
            };
            Ok(Value::String(message))
        })
}
