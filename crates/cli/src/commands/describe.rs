//! Describe command implementation

use crate::commands::{demo_command, COMMANDS};
use clidi_compiler::{compile, Annotation, Callback, Metadata, ParamInfo, Parameter};
use serde_json::Value;

/// Prints the flattened program of a demo command.
pub fn command() -> Callback {
    Callback::builder("describe")
        .qualname("describe::describe")
        .doc("Show the flattened program of a command")
        .param(Parameter::new("command").annotated(
            Annotation::str().with(Metadata::Info(
                ParamInfo::argument().help("Command to describe"),
            )),
        ))
        .build(|args| {
            let name: String = args.get("command")?;
            Ok(Value::String(describe(&name)?))
        })
}

fn describe(name: &str) -> anyhow::Result<String> {
    let callback = demo_command(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown command '{name}'. Available commands: {}",
            COMMANDS.join(", ")
        )
    })?;
    Ok(compile(&callback)?.to_string())
}
