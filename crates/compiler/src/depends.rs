//! Dependency marker.
//!
//! A parameter whose default value (or annotation metadata) holds a [`Depends`]
//! takes its value from invoking the wrapped callback instead of from the command line.

use crate::callback::Callback;
use std::fmt;

/// Marks a parameter as produced by another callback.
#[derive(Clone)]
pub struct Depends {
    callback: Callback,
}

impl Depends {
    /// Wrap `callback` in a dependency marker.
    pub fn new(callback: Callback) -> Self {
        Self { callback }
    }

    /// The callback that produces the parameter value.
    #[must_use]
    pub fn callback(&self) -> &Callback {
        &self.callback
    }
}

/// Shorthand for [`Depends::new`].
pub fn depends(callback: &Callback) -> Depends {
    Depends::new(callback.clone())
}

impl PartialEq for Depends {
    fn eq(&self, other: &Self) -> bool {
        self.callback == other.callback
    }
}

impl fmt::Debug for Depends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Depends({})", self.callback.identity().qualname)
    }
}

impl fmt::Display for Depends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Depends({})", self.callback.identity().name)
    }
}
