//! Type annotations, annotation metadata and deferred evaluation.

use crate::depends::Depends;
use crate::error::AnnotationError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Value type of a parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Any,
    Bool,
    Int,
    Float,
    Str,
    Path,
    List(Box<ValueType>),
    /// Any other type, by name (e.g. `dict`, `Settings`).
    Named(String),
}

impl ValueType {
    fn builtin(name: &str) -> Option<Self> {
        match name {
            "Any" => Some(Self::Any),
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            "Path" => Some(Self::Path),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::Path => f.write_str("Path"),
            Self::List(inner) => write!(f, "List[{inner}]"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Whether a CLI parameter is a flag-style option or a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Option,
    Argument,
}

/// CLI-facing declaration of a parameter.
///
/// The compiler never interprets it; it is carried verbatim to the flattened signature
/// where the CLI layer turns it into flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub kind: ParamKind,
    /// `None` means the parameter is required.
    pub default: Option<Value>,
    pub param_decls: Vec<String>,
    pub help: Option<String>,
    pub envvar: Option<String>,
}

impl ParamInfo {
    pub fn option() -> Self {
        Self::new(ParamKind::Option)
    }

    pub fn argument() -> Self {
        Self::new(ParamKind::Argument)
    }

    fn new(kind: ParamKind) -> Self {
        Self {
            kind,
            default: None,
            param_decls: Vec::new(),
            help: None,
            envvar: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Add a flag declaration such as `--config` or `-z`.
    #[must_use]
    pub fn decl(mut self, decl: impl Into<String>) -> Self {
        self.param_decls.push(decl.into());
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn envvar(mut self, envvar: impl Into<String>) -> Self {
        self.envvar = Some(envvar.into());
        self
    }
}

impl fmt::Display for ParamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ParamKind::Option => "Option",
            ParamKind::Argument => "Argument",
        };
        write!(f, "{kind}(")?;
        match &self.default {
            Some(value) => write!(f, "{value}")?,
            None => f.write_str("...")?,
        }
        for decl in &self.param_decls {
            write!(f, ", '{decl}'")?;
        }
        f.write_str(")")
    }
}

/// Extra data attached to a type via [`Annotation::Annotated`].
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    Depends(Depends),
    Info(ParamInfo),
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depends(depends) => fmt::Display::fmt(depends, f),
            Self::Info(info) => fmt::Display::fmt(info, f),
        }
    }
}

/// Type annotation of a parameter or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Type(ValueType),
    Annotated {
        base: Box<Annotation>,
        metadata: Vec<Metadata>,
    },
    /// A name evaluated lazily against the declaring callback's [`Scope`].
    Deferred(String),
}

impl Annotation {
    pub fn any() -> Self {
        Self::Type(ValueType::Any)
    }

    pub fn bool() -> Self {
        Self::Type(ValueType::Bool)
    }

    pub fn int() -> Self {
        Self::Type(ValueType::Int)
    }

    pub fn float() -> Self {
        Self::Type(ValueType::Float)
    }

    pub fn str() -> Self {
        Self::Type(ValueType::Str)
    }

    pub fn path() -> Self {
        Self::Type(ValueType::Path)
    }

    pub fn list(inner: ValueType) -> Self {
        Self::Type(ValueType::List(Box::new(inner)))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Type(ValueType::Named(name.into()))
    }

    pub fn deferred(name: impl Into<String>) -> Self {
        Self::Deferred(name.into())
    }

    /// `Annotated[base, metadata...]`. Nested `Annotated` bases are flattened.
    pub fn annotated(base: Annotation, metadata: Vec<Metadata>) -> Self {
        if metadata.is_empty() {
            return base;
        }
        match base {
            Self::Annotated {
                base,
                metadata: mut inner,
            } => {
                inner.extend(metadata);
                Self::Annotated {
                    base,
                    metadata: inner,
                }
            }
            base => Self::Annotated {
                base: Box::new(base),
                metadata,
            },
        }
    }

    /// Attach one more piece of metadata.
    #[must_use]
    pub fn with(self, metadata: Metadata) -> Self {
        Self::annotated(self, vec![metadata])
    }

    #[must_use]
    pub fn metadata(&self) -> &[Metadata] {
        match self {
            Self::Annotated { metadata, .. } => metadata,
            _ => &[],
        }
    }

    /// Underlying value type; `None` while still deferred.
    #[must_use]
    pub fn value_type(&self) -> Option<&ValueType> {
        match self {
            Self::Type(ty) => Some(ty),
            Self::Annotated { base, .. } => base.value_type(),
            Self::Deferred(_) => None,
        }
    }

    /// Evaluate every deferred name against `scope`.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError` if a name is undefined or defined in terms of itself.
    pub fn resolve(&self, scope: &Scope, callback: &str) -> Result<Annotation, AnnotationError> {
        self.resolve_in(scope, callback, &mut Vec::new())
    }

    fn resolve_in(
        &self,
        scope: &Scope,
        callback: &str,
        path: &mut Vec<String>,
    ) -> Result<Annotation, AnnotationError> {
        match self {
            Self::Type(ty) => Ok(Self::Type(ty.clone())),
            Self::Annotated { base, metadata } => Ok(Self::annotated(
                base.resolve_in(scope, callback, path)?,
                metadata.clone(),
            )),
            Self::Deferred(name) => {
                if path.iter().any(|seen| seen == name) {
                    return Err(AnnotationError::CircularDefinition { name: name.clone() });
                }
                let Some(definition) = scope.lookup(name) else {
                    return Err(AnnotationError::UnresolvedName {
                        name: name.clone(),
                        callback: callback.to_string(),
                    });
                };
                path.push(name.clone());
                let resolved = definition.resolve_in(scope, callback, path);
                path.pop();
                resolved
            }
        }
    }
}

impl From<ValueType> for Annotation {
    fn from(ty: ValueType) -> Self {
        Self::Type(ty)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => fmt::Display::fmt(ty, f),
            Self::Annotated { base, metadata } => {
                write!(f, "Annotated[{base}")?;
                for item in metadata {
                    write!(f, ", {item}")?;
                }
                f.write_str("]")
            }
            Self::Deferred(name) => write!(f, "'{name}'"),
        }
    }
}

/// Names visible to deferred annotations of a callback.
///
/// Clones share their definitions, so a name may be defined after the callbacks that
/// refer to it are built. Builtin type names (`int`, `str`, `bool`, `float`, `Path`,
/// `Any`) are always visible.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    definitions: Arc<RwLock<HashMap<String, Annotation>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn define(self, name: impl Into<String>, annotation: Annotation) -> Self {
        self.insert(name, annotation);
        self
    }

    /// Define `name` in place, visible to every clone of this scope.
    pub fn insert(&self, name: impl Into<String>, annotation: Annotation) {
        self.definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), annotation);
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Annotation> {
        let definitions = self
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        definitions
            .get(name)
            .cloned()
            .or_else(|| ValueType::builtin(name).map(Annotation::Type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Callback;
    use crate::depends::depends;
    use serde_json::json;

    #[test]
    fn test_display() {
        assert_eq!(Annotation::int().to_string(), "int");
        assert_eq!(Annotation::list(ValueType::Str).to_string(), "List[str]");
        assert_eq!(Annotation::deferred("Settings").to_string(), "'Settings'");

        let info = ParamInfo::option().default_value(json!(42)).decl("-z");
        assert_eq!(
            Annotation::int().with(Metadata::Info(info)).to_string(),
            "Annotated[int, Option(42, '-z')]"
        );
        assert_eq!(
            ParamInfo::option().decl("--config").to_string(),
            "Option(..., '--config')"
        );
    }

    #[test]
    fn test_annotated_flattens() {
        let dep = Callback::builder("dep").build(|_| Ok(Value::Null));
        let inner = Annotation::str().with(Metadata::Info(ParamInfo::option()));
        let outer = inner.with(Metadata::Depends(depends(&dep)));

        assert_eq!(outer.metadata().len(), 2);
        assert_eq!(outer.value_type(), Some(&ValueType::Str));
        assert_eq!(Annotation::annotated(Annotation::int(), vec![]), Annotation::int());
    }

    #[test]
    fn test_resolve_through_scope() {
        let scope = Scope::new()
            .define("Port", Annotation::int())
            .define("Alias", Annotation::deferred("Port"));

        let resolved = Annotation::deferred("Alias").resolve(&scope, "f").unwrap();
        assert_eq!(resolved, Annotation::int());

        let builtin = Annotation::deferred("str").resolve(&scope, "f").unwrap();
        assert_eq!(builtin, Annotation::str());
    }

    #[test]
    fn test_resolve_inside_annotated() {
        let scope = Scope::new().define("Port", Annotation::int());
        let info = Metadata::Info(ParamInfo::option().decl("--port"));
        let annotation = Annotation::annotated(Annotation::deferred("Port"), vec![info.clone()]);

        let resolved = annotation.resolve(&scope, "f").unwrap();
        assert_eq!(resolved, Annotation::int().with(info));
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = Annotation::deferred("Missing")
            .resolve(&Scope::new(), "load_config")
            .unwrap_err();
        assert_eq!(
            err,
            AnnotationError::UnresolvedName {
                name: "Missing".to_string(),
                callback: "load_config".to_string(),
            }
        );
    }

    #[test]
    fn test_late_definition_is_shared() {
        let scope = Scope::new();
        let seen_by_callback = scope.clone();
        assert!(seen_by_callback.lookup("Port").is_none());

        scope.insert("Port", Annotation::int());
        assert_eq!(seen_by_callback.lookup("Port"), Some(Annotation::int()));
    }

    #[test]
    fn test_resolve_circular_definition() {
        let scope = Scope::new()
            .define("A", Annotation::deferred("B"))
            .define("B", Annotation::deferred("A"));

        let err = Annotation::deferred("A").resolve(&scope, "f").unwrap_err();
        assert!(matches!(err, AnnotationError::CircularDefinition { .. }));
    }
}
