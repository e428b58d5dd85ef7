//! Demo commands

pub mod completion;
pub mod describe;
pub mod greet;

use clidi_compiler::{Annotation, Callback, ParamInfo, Parameter};
use serde_json::Value;

/// Names of the demo commands, in registration order.
pub const COMMANDS: [&str; 3] = ["greet", "describe", "completion"];

/// A freshly built demo command.
pub fn demo_command(name: &str) -> Option<Callback> {
    match name {
        "greet" => Some(greet::command()),
        "describe" => Some(describe::command()),
        "completion" => Some(completion::command()),
        _ => None,
    }
}

/// Root callback, run before every command.
pub fn root() -> Callback {
    Callback::builder("main")
        .qualname("clidi::main")
        .doc("clidi - dependency-injected commands on top of clap")
        .param(
            Parameter::new("verbose").annotated(Annotation::bool()).with_info(
                ParamInfo::option()
                    .default_value(Value::Bool(false))
                    .decl("--verbose")
                    .decl("-v")
                    .help("Print extra diagnostics to stderr"),
            ),
        )
        .build(|args| {
            if args.get("verbose")? {
                eprintln!("Verbose output enabled");
            }
            Ok(Value::Null)
        })
}
