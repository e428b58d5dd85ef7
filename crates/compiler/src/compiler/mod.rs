//! Compiler module - flattens a dependency tree into a single callable
//!
//! This module handles:
//! - Depth-first traversal of a command and its dependency callbacks
//! - Cycle detection and once-per-callback deduplication
//! - Leaf parameter collection and default ordering

use crate::builder::{Binding, FlatFunction, FunctionBuilder, SlotId};
use crate::callback::{Callback, CallbackId};
use crate::depends::Depends;
use crate::error::{CompilationError, CompilerError};
use crate::signature::{introspect, AnnotationMode, Metadata, ParamDefault, Parameter};
use std::collections::HashMap;

/// Compile `root` and all of its dependencies into one callable.
///
/// The result takes every leaf parameter of the tree (parameters without a default first),
/// runs each dependency callback exactly once per call, and returns what `root` returns.
/// Its identity (name, qualified name, module, doc) is copied from `root`.
///
/// # Errors
///
/// Returns `CompilerError::Compilation` if two leaf parameters share a name or the
/// dependency graph has a cycle, and `CompilerError::Annotation` if a deferred annotation
/// cannot be evaluated.
pub fn compile(root: &Callback) -> Result<FlatFunction, CompilerError> {
    let mut traversal = Traversal::default();
    traversal.visit(root)?;
    sort_params(&mut traversal.builder);

    let mut flat = traversal.builder.build()?;
    flat.copy_identity_from(root);

    tracing::debug!(
        command = %root.identity().qualname,
        params = flat.signature().params.len(),
        steps = flat.steps().len(),
        "compiled dependency tree"
    );
    Ok(flat)
}

#[derive(Debug, Clone, Copy)]
enum Visit {
    InProgress,
    Done(SlotId),
}

/// State of one compilation.
#[derive(Default)]
struct Traversal {
    builder: FunctionBuilder,
    known_invokes: HashMap<CallbackId, Visit>,
    /// Leaf parameter name to the callback that declared it.
    owners: HashMap<String, String>,
}

impl Traversal {
    /// Schedule `callback` and its dependencies, returning the slot of its result.
    fn visit(&mut self, callback: &Callback) -> Result<SlotId, CompilerError> {
        let qualname = &callback.identity().qualname;
        match self.known_invokes.get(&callback.id()) {
            // don't call the same dependency callback twice
            Some(Visit::Done(slot)) => return Ok(*slot),
            Some(Visit::InProgress) => {
                return Err(CompilationError::Cycle {
                    callback: qualname.clone(),
                }
                .into());
            }
            None => {}
        }
        self.known_invokes.insert(callback.id(), Visit::InProgress);

        let signature = introspect(callback, AnnotationMode::Evaluated)?;
        let mut bindings = Vec::with_capacity(signature.params.len());

        for param in signature.params {
            if let Some(depends) = parse_dependency(&param, qualname) {
                let slot = self.visit(depends.callback())?;
                bindings.push((param.name, Binding::Slot(slot)));
                continue;
            }

            // make sure that all names are unique
            if self.builder.params().iter().any(|p| p.name == param.name) {
                let first = self.owners.get(&param.name).cloned().unwrap_or_default();
                return Err(CompilationError::DuplicateParameter {
                    name: param.name,
                    callback: qualname.clone(),
                    first,
                }
                .into());
            }

            tracing::trace!(callback = %qualname, param = %param.name, "leaf parameter");
            self.owners.insert(param.name.clone(), qualname.clone());
            bindings.push((param.name.clone(), Binding::Param(param.name.clone())));
            self.builder.add_param(param);
        }

        let slot = self.builder.invoke(callback.clone(), bindings);
        self.known_invokes.insert(callback.id(), Visit::Done(slot));
        Ok(slot)
    }
}

/// Dependency marker of `param`: its default first, then its annotation metadata.
fn parse_dependency<'a>(param: &'a Parameter, callback: &str) -> Option<&'a Depends> {
    let from_annotation = param
        .annotation
        .iter()
        .flat_map(|annotation| annotation.metadata())
        .find_map(|item| match item {
            Metadata::Depends(depends) => Some(depends),
            Metadata::Info(_) => None,
        });

    if let Some(ParamDefault::Depends(depends)) = &param.default {
        if let Some(ignored) = from_annotation {
            tracing::warn!(
                callback,
                param = %param.name,
                used = %depends,
                ignored = %ignored,
                "parameter has a dependency default and a dependency annotation; using the default"
            );
        }
        return Some(depends);
    }

    from_annotation
}

/// Move parameters with defaults to the end, keeping relative order.
fn sort_params(builder: &mut FunctionBuilder) {
    builder.params_mut().sort_by_key(Parameter::has_default);
}
