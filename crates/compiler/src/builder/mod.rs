//! Function builder - bakes a list of invocation steps into one callable
//!
//! The builder accumulates parameters and invocation steps in the form
//!
//! ```text
//! fn func(params...) {
//!     let r0 = callback0(arg = param, ...);
//!     let r1 = callback1(arg = r0, ...);
//!     return r1;
//! }
//! ```
//!
//! and [`FunctionBuilder::build`] resolves that plan into a [`FlatFunction`] executor.

pub mod flat;

pub use flat::{CallArgs, FlatFunction};

use crate::callback::{Callback, Identity};
use crate::error::BuilderError;
use crate::signature::{introspect, Annotation, AnnotationMode, Parameter, Signature};
use std::collections::HashMap;
use std::fmt;

/// Identifier of an invocation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Source of one argument of an invocation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Value of a parameter of the built function.
    Param(String),
    /// Result of an earlier step.
    Slot(SlotId),
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(name) => f.write_str(name),
            Self::Slot(slot) => write!(f, "{slot}"),
        }
    }
}

/// One call of a callback with its argument bindings.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub callback: Callback,
    /// Callback argument name to its source, in declaration order.
    pub bindings: Vec<(String, Binding)>,
    pub result: SlotId,
}

/// Accumulates parameters and invocation steps.
#[derive(Debug, Default)]
pub struct FunctionBuilder {
    params: Vec<Parameter>,
    invokes: Vec<Invocation>,
}

impl FunctionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Mutable access for reordering before [`build`](Self::build).
    pub fn params_mut(&mut self) -> &mut Vec<Parameter> {
        &mut self.params
    }

    #[must_use]
    pub fn invocations(&self) -> &[Invocation] {
        &self.invokes
    }

    /// Append a parameter to the built function.
    pub fn add_param(&mut self, param: Parameter) {
        self.params.push(param);
    }

    /// Append an invocation step and return the slot that will hold its result.
    pub fn invoke(&mut self, callback: Callback, bindings: Vec<(String, Binding)>) -> SlotId {
        let result = SlotId(self.invokes.len());
        self.invokes.push(Invocation {
            callback,
            bindings,
            result,
        });
        result
    }

    /// Program text of the current plan.
    #[must_use]
    pub fn program_text(&self) -> String {
        let mut text = String::new();
        // Writing into a String cannot fail.
        let _ = write_program(&mut text, "func", &self.params, None, &self.invokes);
        text
    }

    /// Resolve the plan into a callable.
    ///
    /// The return annotation is taken from the last step's callback.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::Synthesis` if parameter names repeat, a parameter without a
    /// default follows one with a default, or a binding does not refer to a parameter or an
    /// earlier slot. Returns `BuilderError::Annotation` if the last callback's return
    /// annotation cannot be evaluated.
    pub fn build(self) -> Result<FlatFunction, BuilderError> {
        let steps = self.resolve_steps()?;

        let return_annotation = match self.invokes.last() {
            Some(last) => introspect(&last.callback, AnnotationMode::Evaluated)?.return_annotation,
            None => None,
        };

        let signature = Signature {
            params: self.params,
            return_annotation,
        };
        Ok(FlatFunction::new(
            Identity::default(),
            signature,
            self.invokes,
            steps,
        ))
    }

    fn resolve_steps(&self) -> Result<Vec<flat::Step>, BuilderError> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut seen_default: Option<&str> = None;
        for (index, param) in self.params.iter().enumerate() {
            if positions.insert(param.name.as_str(), index).is_some() {
                return Err(self.synthesis_error(format!(
                    "duplicate parameter '{}'",
                    param.name
                )));
            }
            match (param.has_default(), seen_default) {
                (true, None) => seen_default = Some(param.name.as_str()),
                (false, Some(previous)) => {
                    return Err(self.synthesis_error(format!(
                        "parameter without default '{}' follows parameter with default '{previous}'",
                        param.name
                    )));
                }
                _ => {}
            }
        }

        let mut steps = Vec::with_capacity(self.invokes.len());
        for (position, invoke) in self.invokes.iter().enumerate() {
            let mut args = Vec::with_capacity(invoke.bindings.len());
            for (arg, binding) in &invoke.bindings {
                let source = match binding {
                    Binding::Param(name) => match positions.get(name.as_str()) {
                        Some(&index) => flat::Source::Param(index),
                        None => {
                            return Err(self.synthesis_error(format!("name '{name}' is not defined")));
                        }
                    },
                    Binding::Slot(slot) if slot.index() < position => flat::Source::Slot(slot.index()),
                    Binding::Slot(slot) => {
                        return Err(self.synthesis_error(format!(
                            "'{slot}' is referenced before assignment"
                        )));
                    }
                };
                args.push((arg.clone(), source));
            }
            steps.push(flat::Step {
                callback: invoke.callback.clone(),
                args,
            });
        }
        Ok(steps)
    }

    fn synthesis_error(&self, reason: String) -> BuilderError {
        BuilderError::Synthesis {
            reason,
            program: self.program_text(),
        }
    }
}

pub(crate) fn write_program<W: fmt::Write>(
    out: &mut W,
    name: &str,
    params: &[Parameter],
    return_annotation: Option<&Annotation>,
    invokes: &[Invocation],
) -> fmt::Result {
    write!(out, "fn {name}(")?;
    for (index, param) in params.iter().enumerate() {
        if index > 0 {
            out.write_str(", ")?;
        }
        write!(out, "{param}")?;
    }
    out.write_str(")")?;
    if let Some(annotation) = return_annotation {
        write!(out, " -> {annotation}")?;
    }
    out.write_str(" {\n")?;
    for invoke in invokes {
        write!(
            out,
            "    let {} = {}(",
            invoke.result,
            invoke.callback.identity().qualname
        )?;
        for (index, (arg, binding)) in invoke.bindings.iter().enumerate() {
            if index > 0 {
                out.write_str(", ")?;
            }
            write!(out, "{arg} = {binding}")?;
        }
        out.write_str(");\n")?;
    }
    match invokes.last() {
        Some(last) => writeln!(out, "    return {};", last.result)?,
        None => out.write_str("    return;\n")?,
    }
    out.write_str("}")
}
