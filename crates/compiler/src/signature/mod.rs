//! Signature model and introspection
//!
//! This module handles:
//! - Parameter descriptors (name, annotation, default)
//! - Signatures (ordered parameters + return annotation)
//! - Introspection of a callback in raw or evaluated annotation mode

pub mod annotation;

pub use annotation::{Annotation, Metadata, ParamInfo, ParamKind, Scope, ValueType};

use crate::callback::Callback;
use crate::depends::{depends, Depends};
use crate::error::AnnotationError;
use serde_json::Value;
use std::fmt;

/// Default of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    Value(Value),
    Info(ParamInfo),
    Depends(Depends),
}

impl fmt::Display for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Info(info) => write!(f, "{info}"),
            Self::Depends(depends) => write!(f, "{depends}"),
        }
    }
}

/// A single parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<Annotation>,
    pub default: Option<ParamDefault>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }

    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(ParamDefault::Value(value));
        self
    }

    #[must_use]
    pub fn with_info(mut self, info: ParamInfo) -> Self {
        self.default = Some(ParamDefault::Info(info));
        self
    }

    /// Use `callback` as the parameter's default-value dependency marker.
    #[must_use]
    pub fn depends_on(mut self, callback: &Callback) -> Self {
        self.default = Some(ParamDefault::Depends(depends(callback)));
        self
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// CLI declaration, from the default first and then from annotation metadata.
    #[must_use]
    pub fn param_info(&self) -> Option<&ParamInfo> {
        if let Some(ParamDefault::Info(info)) = &self.default {
            return Some(info);
        }
        self.annotation
            .iter()
            .flat_map(Annotation::metadata)
            .find_map(|item| match item {
                Metadata::Info(info) => Some(info),
                Metadata::Depends(_) => None,
            })
    }

    #[must_use]
    pub fn value_type(&self) -> Option<&ValueType> {
        self.annotation.as_ref().and_then(Annotation::value_type)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match (&self.annotation, &self.default) {
            (Some(annotation), Some(default)) => write!(f, ": {annotation} = {default}"),
            (Some(annotation), None) => write!(f, ": {annotation}"),
            (None, Some(default)) => write!(f, "={default}"),
            (None, None) => Ok(()),
        }
    }
}

/// Ordered parameters plus return annotation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub params: Vec<Parameter>,
    pub return_annotation: Option<Annotation>,
}

impl Signature {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        if let Some(annotation) = &self.return_annotation {
            write!(f, " -> {annotation}")?;
        }
        Ok(())
    }
}

/// How annotations are reported by [`introspect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationMode {
    /// As declared, deferred names left untouched.
    Raw,
    /// Deferred names evaluated against the callback's scope.
    Evaluated,
}

/// Signature of `callback`.
///
/// # Errors
///
/// In `Evaluated` mode, returns `AnnotationError` when a deferred annotation cannot be
/// resolved. `Raw` mode never fails.
pub fn introspect(callback: &Callback, mode: AnnotationMode) -> Result<Signature, AnnotationError> {
    let qualname = &callback.identity().qualname;
    let evaluate = |annotation: &Annotation| match mode {
        AnnotationMode::Raw => Ok(annotation.clone()),
        AnnotationMode::Evaluated => annotation.resolve(callback.scope(), qualname),
    };

    let params = callback
        .params()
        .iter()
        .map(|param| {
            Ok(Parameter {
                name: param.name.clone(),
                annotation: param.annotation.as_ref().map(&evaluate).transpose()?,
                default: param.default.clone(),
            })
        })
        .collect::<Result<Vec<_>, AnnotationError>>()?;

    let return_annotation = callback.return_annotation().map(&evaluate).transpose()?;

    Ok(Signature {
        params,
        return_annotation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Callback {
        Callback::builder("func")
            .param(Parameter::new("x").annotated(Annotation::int()))
            .param(Parameter::new("y").default_value(json!(17)))
            .param(
                Parameter::new("z")
                    .annotated(Annotation::str())
                    .default_value(json!("abc")),
            )
            .returns(Annotation::named("dict"))
            .build(|_| Ok(Value::Null))
    }

    #[test]
    fn test_signature_display() {
        let sig = introspect(&sample(), AnnotationMode::Raw).unwrap();
        assert_eq!(sig.to_string(), r#"(x: int, y=17, z: str = "abc") -> dict"#);
        assert_eq!(Signature::default().to_string(), "()");
    }

    #[test]
    fn test_introspect_preserves_declaration() {
        let sig = introspect(&sample(), AnnotationMode::Evaluated).unwrap();

        assert_eq!(sig.names().collect::<Vec<_>>(), vec!["x", "y", "z"]);
        assert_eq!(sig.param("x").unwrap().annotation, Some(Annotation::int()));
        assert!(!sig.param("x").unwrap().has_default());
        assert_eq!(
            sig.param("y").unwrap().default,
            Some(ParamDefault::Value(json!(17)))
        );
        assert_eq!(sig.return_annotation, Some(Annotation::named("dict")));
    }

    #[test]
    fn test_raw_and_evaluated_modes() {
        let cb = Callback::builder("load")
            .param(Parameter::new("port").annotated(Annotation::deferred("Port")))
            .returns(Annotation::deferred("Settings"))
            .scope(
                Scope::new()
                    .define("Port", Annotation::int())
                    .define("Settings", Annotation::named("Settings")),
            )
            .build(|_| Ok(Value::Null));

        let raw = introspect(&cb, AnnotationMode::Raw).unwrap();
        assert_eq!(
            raw.param("port").unwrap().annotation,
            Some(Annotation::deferred("Port"))
        );

        let evaluated = introspect(&cb, AnnotationMode::Evaluated).unwrap();
        assert_eq!(
            evaluated.param("port").unwrap().annotation,
            Some(Annotation::int())
        );
        assert_eq!(
            evaluated.return_annotation,
            Some(Annotation::named("Settings"))
        );
    }

    #[test]
    fn test_evaluated_mode_propagates_errors() {
        let cb = Callback::builder("broken")
            .param(Parameter::new("x").annotated(Annotation::deferred("Nope")))
            .build(|_| Ok(Value::Null));

        assert!(introspect(&cb, AnnotationMode::Raw).is_ok());
        let err = introspect(&cb, AnnotationMode::Evaluated).unwrap_err();
        assert!(matches!(err, AnnotationError::UnresolvedName { ref name, .. } if name == "Nope"));
    }

    #[test]
    fn test_param_info_lookup() {
        let by_default = Parameter::new("z").with_info(ParamInfo::option().decl("-z"));
        assert_eq!(by_default.param_info().unwrap().param_decls, vec!["-z"]);

        let by_annotation = Parameter::new("config").annotated(
            Annotation::str().with(Metadata::Info(ParamInfo::option().decl("--config"))),
        );
        assert_eq!(
            by_annotation.param_info().unwrap().param_decls,
            vec!["--config"]
        );
        assert!(!by_annotation.has_default());

        assert!(Parameter::new("plain").param_info().is_none());
    }
}
