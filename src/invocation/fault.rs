// src/invocation/fault.rs
//! Faults raised by target code
//!
//! A [`Fault`] belongs to an [`ErrorClass`]. Classes form a single-inheritance
//! hierarchy rooted at [`THROWABLE`]; rollback rules match against the
//! fully-qualified class names along that hierarchy.
//!
//! ```text
//! lang.Throwable
//! ├─ lang.Error                  (unchecked)
//! └─ lang.Exception              (checked)
//!    └─ lang.RuntimeException    (unchecked)
//! ```

use std::fmt;
use std::sync::Arc;

/// A node in the error-class hierarchy
#[derive(Debug)]
pub struct ErrorClass {
    name: &'static str,
    parent: Option<&'static ErrorClass>,
}

/// Root of every error class
pub static THROWABLE: ErrorClass = ErrorClass {
    name: "lang.Throwable",
    parent: None,
};

/// Unrecoverable failures; unchecked
pub static ERROR: ErrorClass = ErrorClass::new("lang.Error", &THROWABLE);

/// Declared, checked failures
pub static EXCEPTION: ErrorClass = ErrorClass::new("lang.Exception", &THROWABLE);

/// Undeclared failures; unchecked
pub static RUNTIME_EXCEPTION: ErrorClass =
    ErrorClass::new("lang.RuntimeException", &EXCEPTION);

impl ErrorClass {
    /// Declare a class extending `parent`
    pub const fn new(name: &'static str, parent: &'static ErrorClass) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// Fully-qualified class name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ErrorClass> {
        self.parent
    }

    /// This class followed by each superclass up to and including the root
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Whether this class is `other` or one of its subclasses
    pub fn is_a(&self, other: &ErrorClass) -> bool {
        self.ancestors().any(|class| class.name == other.name)
    }

    /// Unchecked classes descend from [`RUNTIME_EXCEPTION`] or [`ERROR`]
    pub fn is_unchecked(&self) -> bool {
        self.is_a(&RUNTIME_EXCEPTION) || self.is_a(&ERROR)
    }
}

impl PartialEq for ErrorClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ErrorClass {}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Iterator over a class and its superclasses
pub struct Ancestors<'a> {
    next: Option<&'a ErrorClass>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ErrorClass;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

struct FaultInner {
    class: &'static ErrorClass,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// An error thrown by target code
///
/// Cloning shares the same underlying fault, so identity survives
/// propagation through any number of advice layers.
#[derive(Clone)]
pub struct Fault {
    inner: Arc<FaultInner>,
}

impl Fault {
    pub fn new(class: &'static ErrorClass, message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(FaultInner {
                class,
                message: message.into(),
                source: None,
            }),
        }
    }

    /// Wrap a lower-level error
    pub fn with_source(
        class: &'static ErrorClass,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(FaultInner {
                class,
                message: message.into(),
                source: Some(Box::new(source)),
            }),
        }
    }

    pub fn class(&self) -> &'static ErrorClass {
        self.inner.class
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    pub fn is_unchecked(&self) -> bool {
        self.inner.class.is_unchecked()
    }

    /// Whether both handles refer to the same thrown fault
    pub fn ptr_eq(a: &Fault, b: &Fault) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.inner.class, self.inner.message)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("class", &self.inner.class.name)
            .field("message", &self.inner.message)
            .finish()
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner
            .source
            .as_deref()
            .map(|source| source as &(dyn std::error::Error + 'static))
    }
}
