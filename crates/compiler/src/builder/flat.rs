//! Flattened callable produced by the function builder.

use super::{write_program, Invocation};
use crate::callback::{Callback, Identity, Kwargs};
use crate::error::{CallError, CallResult};
use crate::signature::{ParamDefault, Parameter, Signature};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Source {
    Param(usize),
    Slot(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub(crate) callback: Callback,
    pub(crate) args: Vec<(String, Source)>,
}

/// Arguments for [`FlatFunction::call`]: positional values first, then named ones.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    named: Kwargs,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional arguments only.
    pub fn positional<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Self {
            positional: values.into_iter().collect(),
            named: Kwargs::new(),
        }
    }

    /// Named arguments only.
    pub fn named(named: Kwargs) -> Self {
        Self {
            positional: Vec::new(),
            named,
        }
    }

    #[must_use]
    pub fn arg(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.named.insert(name.into(), value);
        self
    }
}

/// A whole dependency tree baked into one callable.
///
/// Its parameters are the leaf parameters of the tree; calling it runs every step once,
/// in order, and returns the last step's result.
#[derive(Debug, Clone)]
pub struct FlatFunction {
    identity: Identity,
    signature: Signature,
    plan: Vec<Invocation>,
    steps: Vec<Step>,
}

impl FlatFunction {
    pub(crate) fn new(
        identity: Identity,
        signature: Signature,
        plan: Vec<Invocation>,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            identity,
            signature,
            plan,
            steps,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invocation steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Invocation] {
        &self.plan
    }

    /// Defaults of the trailing run of parameters that declare one.
    #[must_use]
    pub fn defaults(&self) -> Vec<&ParamDefault> {
        let params = &self.signature.params;
        let first = params
            .iter()
            .rposition(|p| !p.has_default())
            .map_or(0, |index| index + 1);
        params[first..]
            .iter()
            .filter_map(|p| p.default.as_ref())
            .collect()
    }

    /// Take name, qualified name, module and doc from `source`. The signature is kept.
    pub fn copy_identity_from(&mut self, source: &Callback) {
        self.identity = source.identity().clone();
    }

    /// Bind `args` to the parameters and run every step.
    ///
    /// # Errors
    ///
    /// Returns `CallError` if the arguments do not bind, or the first error returned by a
    /// step; later steps are not run.
    pub fn call(&self, args: CallArgs) -> CallResult {
        let values = self.bind(args)?;
        tracing::trace!(function = %self.identity.qualname, steps = self.steps.len(), "running");

        let mut slots: Vec<Value> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let mut kwargs = Kwargs::new();
            for (arg, source) in &step.args {
                let value = match *source {
                    Source::Param(index) => values[index].clone(),
                    Source::Slot(index) => slots[index].clone(),
                };
                kwargs.insert(arg.clone(), value);
            }
            slots.push(step.callback.call(kwargs)?);
        }
        Ok(slots.pop().unwrap_or(Value::Null))
    }

    fn bind(&self, args: CallArgs) -> Result<Vec<Value>, CallError> {
        let params = &self.signature.params;
        let CallArgs { positional, named } = args;

        if positional.len() > params.len() {
            return Err(CallError::TooManyArguments {
                function: self.identity.name.clone(),
                expected: params.len(),
                given: positional.len(),
            });
        }

        let mut bound: Vec<Option<Value>> = positional.into_iter().map(Some).collect();
        bound.resize(params.len(), None);

        for (name, value) in named {
            let Some(index) = params.iter().position(|p| p.name == name) else {
                return Err(CallError::UnexpectedArgument {
                    function: self.identity.name.clone(),
                    name,
                });
            };
            if bound[index].is_some() {
                return Err(CallError::DuplicateArgument {
                    function: self.identity.name.clone(),
                    name,
                });
            }
            bound[index] = Some(value);
        }

        bound
            .into_iter()
            .zip(params)
            .map(|(value, param)| {
                value
                    .or_else(|| default_value(param))
                    .ok_or_else(|| CallError::MissingArgument {
                        function: self.identity.name.clone(),
                        name: param.name.clone(),
                    })
            })
            .collect()
    }
}

fn default_value(param: &Parameter) -> Option<Value> {
    match &param.default {
        Some(ParamDefault::Value(value)) => Some(value.clone()),
        Some(ParamDefault::Info(info)) => info.default.clone(),
        Some(ParamDefault::Depends(_)) | None => None,
    }
}

impl fmt::Display for FlatFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_program(
            f,
            &self.identity.name,
            &self.signature.params,
            self.signature.return_annotation.as_ref(),
            &self.plan,
        )
    }
}
