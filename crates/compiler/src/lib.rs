//! clidi Compiler Library
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.
//!
//! This library flattens a command callback and the tree of dependency callbacks it
//! declares into one callable. The flattened callable exposes every leaf parameter of
//! the tree and runs each dependency exactly once per call, so a CLI framework that only
//! understands plain parameters can drive it.
//!
//! # Example
//!
//! ```rust
//! use clidi_compiler::{compile, Annotation, CallArgs, Callback, Parameter};
//! use serde_json::json;
//!
//! let dep_x = Callback::builder("dep_x")
//!     .param(Parameter::new("x").annotated(Annotation::int()).default_value(json!(42)))
//!     .build(|args| Ok(json!(args.get::<i64>("x")?)));
//! let dep_y = Callback::builder("dep_y")
//!     .param(Parameter::new("y").annotated(Annotation::int()))
//!     .build(|args| Ok(json!(args.get::<i64>("y")?)));
//! let command = Callback::builder("command")
//!     .param(Parameter::new("x").depends_on(&dep_x))
//!     .param(Parameter::new("y").depends_on(&dep_y))
//!     .build(|args| Ok(json!(args.get::<i64>("x")? + args.get::<i64>("y")?)));
//!
//! let flat = compile(&command)?;
//! assert_eq!(flat.signature().to_string(), "(y: int, x: int = 42)");
//! assert_eq!(flat.call(CallArgs::new().kwarg("y", json!(10)))?, json!(52));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod callback;
pub mod compiler;
pub mod depends;
pub mod error;
pub mod signature;

pub use builder::{Binding, CallArgs, FlatFunction, FunctionBuilder, Invocation, SlotId};
pub use callback::{Args, Callback, CallbackBuilder, CallbackId, Identity, Kwargs};
pub use compiler::compile;
pub use depends::{depends, Depends};
pub use error::{
    AnnotationError, BuilderError, CallError, CallResult, CompilationError, CompilerError,
};
pub use signature::{
    introspect, Annotation, AnnotationMode, Metadata, ParamDefault, ParamInfo, ParamKind,
    Parameter, Scope, Signature, ValueType,
};
