//! Shell completion command implementation

use clidi::{CliError, CliResult};
use clidi_compiler::{Annotation, Callback, Metadata, ParamInfo, Parameter};
use clap_complete::Shell;
use serde_json::Value;
use std::io;

/// Writes a completion script for the whole demo application to stdout.
pub fn command() -> Callback {
    Callback::builder("completion")
        .qualname("completion::completion")
        .doc("Generate shell completion script")
        .param(Parameter::new("shell").annotated(
            Annotation::str().with(Metadata::Info(
                ParamInfo::argument().help("Shell to generate for: bash, zsh or fish"),
            )),
        ))
        .build(|args| {
            let shell: String = args.get("shell")?;
            run_inner(&shell).map_err(anyhow::Error::from)?;
            Ok(Value::Null)
        })
}

fn parse_shell(shell: &str) -> CliResult<Shell> {
    if shell.is_empty() {
        return Err(CliError::Message(
            "Shell name is required. Supported shells: bash, zsh, fish".to_string(),
        ));
    }

    match shell.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(CliError::Message(format!(
            "Unsupported shell: {shell}. Supported shells: bash, zsh, fish"
        ))),
    }
}

fn run_inner(shell: &str) -> CliResult<()> {
    let shell = parse_shell(shell)?;

    // Build a fresh application: this callback is part of the one being run
    let app = crate::build_app()?;
    app.write_completions(shell, "clidi", &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_options_shell_validation() {
        let valid_shells = vec![
            "bash", "BASH", "Bash", "zsh", "ZSH", "Zsh", "fish", "FISH", "Fish",
        ];

        for shell in valid_shells {
            assert!(parse_shell(shell).is_ok(), "Shell '{shell}' should be valid");
        }
    }

    #[test]
    fn test_completion_options_invalid_shell() {
        let result = parse_shell("powershell");
        if let Err(CliError::Message(msg)) = result {
            assert!(msg.contains("Unsupported shell"));
            assert!(msg.contains("powershell"));
        } else {
            panic!("Expected CliError::Message for invalid shell");
        }
    }

    #[test]
    fn test_completion_options_empty_shell() {
        let result = parse_shell("");
        if let Err(CliError::Message(msg)) = result {
            assert!(msg.contains("Shell name is required"));
        } else {
            panic!("Expected CliError::Message for empty shell");
        }
    }

    #[test]
    fn test_completion_script_lists_commands() {
        let app = crate::build_app().unwrap();
        let mut out = Vec::new();
        app.write_completions(Shell::Zsh, "clidi", &mut out);
        let script = String::from_utf8(out).unwrap();

        for name in crate::commands::COMMANDS {
            assert!(script.contains(name), "missing '{name}' in completions");
        }
    }
}
