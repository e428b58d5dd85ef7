//! Translation between flattened parameters and clap arguments
//!
//! A parameter becomes an option or a positional argument:
//! - a `ParamInfo` (default or annotation metadata) decides the kind and the flags
//! - otherwise a parameter with a default is an option named after it
//! - and a parameter without a default is a required positional argument
//!
//! Untyped parameters take their value type from the default. A bool option defaulting
//! to `true` is declared as `--no-<name>` only.

use crate::error::{CliError, CliResult};
use clap::parser::{MatchesError, ValueSource};
use clap::{Arg, ArgAction, ArgMatches};
use clidi_compiler::{Kwargs, ParamDefault, ParamInfo, ParamKind, Parameter, Signature, ValueType};
use serde_json::Value;
use std::any::Any;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    /// Boolean option, set by presence.
    Flag,
    Bool,
    Int,
    Float,
    Path,
    Text,
}

impl ValueKind {
    fn metavar(self) -> &'static str {
        match self {
            Self::Flag | Self::Bool => "BOOLEAN",
            Self::Int => "INTEGER",
            Self::Float => "FLOAT",
            Self::Path => "PATH",
            Self::Text => "TEXT",
        }
    }
}

/// How one parameter is exposed on the command line.
#[derive(Debug, Clone, Copy)]
struct ArgSpec {
    kind: ParamKind,
    required: bool,
    value: ValueKind,
    multiple: bool,
    /// Flag defaulting to `true`: only the `--no-` form is declared.
    negated: bool,
}

impl ArgSpec {
    fn of(param: &Parameter) -> Self {
        let info = param.param_info();
        let kind = info.map_or(
            if param.has_default() {
                ParamKind::Option
            } else {
                ParamKind::Argument
            },
            |info| info.kind,
        );
        let default = declared_default(param);
        let required = match info {
            Some(_) => default.is_none(),
            None => !param.has_default(),
        };

        let (value, multiple) = match param.value_type() {
            Some(ValueType::List(inner)) => (ValueKind::of_type(inner, kind), true),
            Some(other) => (ValueKind::of_type(other, kind), false),
            None => match default {
                Some(Value::Array(items)) => {
                    let inner = items
                        .first()
                        .map_or(ValueKind::Text, |item| ValueKind::of_value(item, kind));
                    (inner, true)
                }
                Some(value) => (ValueKind::of_value(value, kind), false),
                None => (ValueKind::Text, false),
            },
        };
        let negated = value == ValueKind::Flag && default == Some(&Value::Bool(true));

        Self {
            kind,
            required,
            value,
            multiple,
            negated,
        }
    }
}

impl ValueKind {
    fn of_type(value_type: &ValueType, kind: ParamKind) -> Self {
        match value_type {
            ValueType::Bool if kind == ParamKind::Option => Self::Flag,
            ValueType::Bool => Self::Bool,
            ValueType::Int => Self::Int,
            ValueType::Float => Self::Float,
            ValueType::Path => Self::Path,
            _ => Self::Text,
        }
    }

    /// Kind of an untyped parameter, taken from its default.
    fn of_value(value: &Value, kind: ParamKind) -> Self {
        match value {
            Value::Bool(_) => Self::of_type(&ValueType::Bool, kind),
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Int,
            _ => Self::Text,
        }
    }
}

/// The value a parameter falls back to, from its `ParamInfo` first.
fn declared_default(param: &Parameter) -> Option<&Value> {
    let value = match &param.default {
        Some(ParamDefault::Value(value)) => Some(value),
        _ => None,
    };
    param
        .param_info()
        .and_then(|info| info.default.as_ref())
        .or(value)
}

/// Build the clap argument for `param`.
pub(crate) fn to_arg(param: &Parameter) -> Arg {
    let spec = ArgSpec::of(param);
    let info = param.param_info();
    let mut arg = Arg::new(param.name.clone()).required(spec.required);

    match spec.kind {
        ParamKind::Option => {
            arg = declare_flags(arg, param, info, spec.negated);
            arg = match spec.value {
                ValueKind::Flag if spec.negated => arg.action(ArgAction::SetFalse),
                ValueKind::Flag => arg.action(ArgAction::SetTrue),
                _ if spec.multiple => arg.action(ArgAction::Append),
                _ => arg.action(ArgAction::Set),
            };
            if spec.value != ValueKind::Flag {
                arg = arg.value_name(spec.value.metavar());
            }
        }
        ParamKind::Argument => {
            arg = arg.value_name(param.name.to_uppercase());
            arg = if spec.multiple {
                arg.num_args(1..).action(ArgAction::Append)
            } else {
                arg.action(ArgAction::Set)
            };
        }
    }

    arg = match spec.value {
        ValueKind::Flag => arg,
        ValueKind::Bool => arg.value_parser(clap::value_parser!(bool)),
        ValueKind::Int => arg.value_parser(clap::value_parser!(i64)),
        ValueKind::Float => arg.value_parser(clap::value_parser!(f64)),
        ValueKind::Path => arg.value_parser(clap::value_parser!(PathBuf)),
        ValueKind::Text => arg.value_parser(clap::value_parser!(String)),
    };

    if let Some(help) = info.and_then(|info| info.help.clone()) {
        arg = arg.help(help);
    }
    if let Some(envvar) = info.and_then(|info| info.envvar.clone()) {
        arg = arg.env(envvar);
    }
    arg
}

fn declare_flags(mut arg: Arg, param: &Parameter, info: Option<&ParamInfo>, negated: bool) -> Arg {
    let long_name = |long: &str| {
        if negated {
            format!("no-{long}")
        } else {
            long.to_string()
        }
    };
    let mut longs = 0;
    let mut shorts = 0;
    for decl in info.map(|info| info.param_decls.as_slice()).unwrap_or_default() {
        if let Some(long) = decl.strip_prefix("--") {
            arg = if longs == 0 {
                arg.long(long_name(long))
            } else {
                arg.visible_alias(long_name(long))
            };
            longs += 1;
        } else if let Some(short) = decl.strip_prefix('-').and_then(single_char) {
            if negated {
                tracing::debug!(param = %param.name, decl = %decl, "short flag dropped from negated flag");
                continue;
            }
            arg = if shorts == 0 {
                arg.short(short)
            } else {
                arg.visible_short_alias(short)
            };
            shorts += 1;
        } else {
            tracing::warn!(param = %param.name, decl = %decl, "ignoring unsupported flag declaration");
        }
    }

    if longs == 0 && shorts == 0 {
        arg = arg.long(long_name(&param.name.replace('_', "-")));
    }
    arg
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Named arguments for the parameters of `signature` that were actually supplied.
///
/// Values taken from the command line or an environment variable are forwarded; anything
/// else is left to the flattened function's own defaults.
pub(crate) fn collect_kwargs(signature: &Signature, matches: &ArgMatches) -> CliResult<Kwargs> {
    let mut kwargs = Kwargs::new();
    for param in &signature.params {
        match matches.value_source(&param.name) {
            Some(ValueSource::CommandLine | ValueSource::EnvVariable) => {}
            _ => continue,
        }

        let spec = ArgSpec::of(param);
        let value = read_value(matches, &param.name, spec).map_err(|e| {
            CliError::Message(format!("Failed to read argument '{}': {e}", param.name))
        })?;
        tracing::trace!(param = %param.name, value = %value, "supplied");
        kwargs.insert(param.name.clone(), value);
    }
    Ok(kwargs)
}

fn read_value(matches: &ArgMatches, id: &str, spec: ArgSpec) -> Result<Value, MatchesError> {
    let path = |p: &PathBuf| Value::String(p.to_string_lossy().into_owned());
    if spec.multiple {
        return match spec.value {
            ValueKind::Flag | ValueKind::Bool => many(matches, id, |b: &bool| Value::Bool(*b)),
            ValueKind::Int => many(matches, id, |n: &i64| Value::from(*n)),
            ValueKind::Float => many(matches, id, |n: &f64| Value::from(*n)),
            ValueKind::Path => many(matches, id, path),
            ValueKind::Text => many(matches, id, |s: &String| Value::String(s.clone())),
        };
    }
    match spec.value {
        ValueKind::Flag | ValueKind::Bool => one(matches, id, |b: &bool| Value::Bool(*b)),
        ValueKind::Int => one(matches, id, |n: &i64| Value::from(*n)),
        ValueKind::Float => one(matches, id, |n: &f64| Value::from(*n)),
        ValueKind::Path => one(matches, id, path),
        ValueKind::Text => one(matches, id, |s: &String| Value::String(s.clone())),
    }
}

fn one<T, F>(matches: &ArgMatches, id: &str, convert: F) -> Result<Value, MatchesError>
where
    T: Any + Clone + Send + Sync + 'static,
    F: Fn(&T) -> Value,
{
    Ok(matches.try_get_one::<T>(id)?.map_or(Value::Null, convert))
}

fn many<T, F>(matches: &ArgMatches, id: &str, convert: F) -> Result<Value, MatchesError>
where
    T: Any + Clone + Send + Sync + 'static,
    F: Fn(&T) -> Value,
{
    Ok(matches
        .try_get_many::<T>(id)?
        .map_or(Value::Null, |values| Value::Array(values.map(convert).collect())))
}
