//! Callable model.
//!
//! A [`Callback`] is a named function with an explicitly declared signature. Commands and
//! dependency callbacks are both `Callback`s; the compiler only ever looks at the declared
//! signature and never at the body.

use crate::error::{CallError, CallResult};
use crate::signature::{Annotation, Parameter, Scope};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Named arguments passed to a callback.
pub type Kwargs = serde_json::Map<String, Value>;

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identifier assigned to every callback when it is built.
///
/// Clones of a callback share the id; it is the deduplication key of the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    fn next() -> Self {
        Self(NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Descriptive identity of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub qualname: String,
    pub module: String,
    pub doc: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            qualname: name.clone(),
            name,
            module: String::new(),
            doc: None,
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new("func")
    }
}

/// Arguments handed to a callback body.
#[derive(Debug, Clone, Default)]
pub struct Args {
    function: String,
    values: Kwargs,
}

impl Args {
    pub fn new(function: impl Into<String>, values: Kwargs) -> Self {
        Self {
            function: function.into(),
            values,
        }
    }

    /// Deserialize the argument `name` into `T`.
    ///
    /// # Errors
    ///
    /// Returns `CallError::MissingArgument` if the argument was not passed and
    /// `CallError::InvalidArgument` if it does not deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, CallError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| CallError::MissingArgument {
                function: self.function.clone(),
                name: name.to_string(),
            })?;
        serde_json::from_value(value.clone()).map_err(|source| CallError::InvalidArgument {
            name: name.to_string(),
            source,
        })
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn kwargs(&self) -> &Kwargs {
        &self.values
    }

    #[must_use]
    pub fn into_kwargs(self) -> Kwargs {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type Body = dyn Fn(Args) -> CallResult + Send + Sync;

struct Inner {
    id: CallbackId,
    identity: Identity,
    params: Vec<Parameter>,
    return_annotation: Option<Annotation>,
    scope: Scope,
    body: Box<Body>,
}

/// A function with a declared signature.
#[derive(Clone)]
pub struct Callback {
    inner: Arc<Inner>,
}

impl Callback {
    /// Start declaring a callback called `name`.
    pub fn builder(name: impl Into<String>) -> CallbackBuilder {
        CallbackBuilder {
            identity: Identity::new(name),
            params: Vec::new(),
            return_annotation: None,
            scope: Scope::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> CallbackId {
        self.inner.id
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    /// Parameters exactly as declared (annotations unevaluated).
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.inner.params
    }

    #[must_use]
    pub fn return_annotation(&self) -> Option<&Annotation> {
        self.inner.return_annotation.as_ref()
    }

    /// Scope used to evaluate deferred annotations.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.inner.scope
    }

    /// Run the body with named arguments.
    ///
    /// # Errors
    ///
    /// Propagates whatever the body returns.
    pub fn call(&self, kwargs: Kwargs) -> CallResult {
        tracing::trace!(callback = %self.inner.identity.qualname, args = kwargs.len(), "calling");
        (self.inner.body)(Args::new(self.inner.identity.name.clone(), kwargs))
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("id", &self.inner.id)
            .field("qualname", &self.inner.identity.qualname)
            .field("params", &self.inner.params.len())
            .finish()
    }
}

/// Declares a [`Callback`].
pub struct CallbackBuilder {
    identity: Identity,
    params: Vec<Parameter>,
    return_annotation: Option<Annotation>,
    scope: Scope,
}

impl CallbackBuilder {
    #[must_use]
    pub fn qualname(mut self, qualname: impl Into<String>) -> Self {
        self.identity.qualname = qualname.into();
        self
    }

    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.identity.module = module.into();
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.identity.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn returns(mut self, annotation: Annotation) -> Self {
        self.return_annotation = Some(annotation);
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Attach the body and assign a fresh [`CallbackId`].
    pub fn build<F>(self, body: F) -> Callback
    where
        F: Fn(Args) -> CallResult + Send + Sync + 'static,
    {
        Callback {
            inner: Arc::new(Inner {
                id: CallbackId::next(),
                identity: self.identity,
                params: self.params,
                return_annotation: self.return_annotation,
                scope: self.scope,
                body: Box::new(body),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_share_identity() {
        let cb = Callback::builder("dep").build(|_| Ok(Value::Null));
        let other = Callback::builder("dep").build(|_| Ok(Value::Null));

        assert_eq!(cb, cb.clone());
        assert_ne!(cb, other);
        assert_ne!(cb.id(), other.id());
    }

    #[test]
    fn test_builder_sets_identity() {
        let cb = Callback::builder("load")
            .qualname("Settings.load")
            .module("demo::settings")
            .doc("Load settings")
            .build(|_| Ok(Value::Null));

        let identity = cb.identity();
        assert_eq!(identity.name, "load");
        assert_eq!(identity.qualname, "Settings.load");
        assert_eq!(identity.module, "demo::settings");
        assert_eq!(identity.doc.as_deref(), Some("Load settings"));
    }

    #[test]
    fn test_args_typed_access() {
        let cb = Callback::builder("add").build(|args| {
            let x: i64 = args.get("x")?;
            let y: i64 = args.get("y")?;
            Ok(json!(x + y))
        });

        let mut kwargs = Kwargs::new();
        kwargs.insert("x".to_string(), json!(1));
        kwargs.insert("y".to_string(), json!(2));
        assert_eq!(cb.call(kwargs).unwrap(), json!(3));
    }

    #[test]
    fn test_args_missing_and_invalid() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("x".to_string(), json!("not a number"));
        let args = Args::new("add", kwargs);

        match args.get::<i64>("y") {
            Err(CallError::MissingArgument { function, name }) => {
                assert_eq!(function, "add");
                assert_eq!(name, "y");
            }
            other => panic!("Expected MissingArgument, got {other:?}"),
        }
        assert!(matches!(
            args.get::<i64>("x"),
            Err(CallError::InvalidArgument { .. })
        ));
    }
}
