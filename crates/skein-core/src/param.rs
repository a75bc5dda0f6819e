//! Ordered parameter registry: the single source of truth for solver
//! configuration.
//!
//! Parameters keep the order in which they were registered, so the
//! configuration record and the generated program declare them in a
//! stable, feature-registration order. Once the registry has been
//! written to a run's configuration record the values are frozen for
//! that run's lifetime: restarts read the record, they never overwrite
//! it.

use std::fmt;

use indexmap::IndexMap;

use crate::container::{Container, ContainerError};

/// Group inside the configuration record that holds one entry per
/// registered parameter.
pub const PARAMETERS_GROUP: &str = "parameters";

// ── Values ─────────────────────────────────────────────────────────

/// A typed parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Integer parameter (iteration counts, bin counts, mode flags).
    Int(i64),
    /// Floating-point parameter (viscosity, timestep, estimates).
    Float(f64),
    /// String parameter (forcing type, interpolator name).
    Str(String),
    /// Boolean parameter.
    Bool(bool),
}

impl ParamValue {
    /// Human-readable name of the semantic type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from registry lookups and record persistence.
#[derive(Debug, PartialEq)]
pub enum ParamError {
    /// No parameter of the given name is registered.
    Missing {
        /// The requested parameter name.
        name: String,
    },
    /// The parameter exists but holds a different semantic type.
    TypeMismatch {
        /// The requested parameter name.
        name: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },
    /// The configuration record already holds parameter values.
    ///
    /// Values are immutable once persisted; a restart must read the
    /// record instead of writing it.
    RecordFrozen,
    /// A container operation failed while reading or writing the record.
    Container(ContainerError),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name } => write!(f, "parameter '{name}' is not registered"),
            Self::TypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "parameter '{name}' is {found}, requested as {expected}"
            ),
            Self::RecordFrozen => {
                write!(f, "configuration record already written; values are frozen")
            }
            Self::Container(e) => write!(f, "configuration record: {e}"),
        }
    }
}

impl std::error::Error for ParamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Container(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ContainerError> for ParamError {
    fn from(e: ContainerError) -> Self {
        Self::Container(e)
    }
}

// ── Registry ───────────────────────────────────────────────────────

/// Insertion-ordered name → typed-value store.
///
/// Names are globally unique within a run; [`set`](Self::set) on an
/// existing name replaces the in-memory value without changing its
/// position, matching the registration-order guarantee.
#[derive(Clone, Debug, Default)]
pub struct ParameterRegistry {
    entries: IndexMap<String, ParamValue>,
}

impl ParameterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameters are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a parameter or replace the value of an existing one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(name)
    }

    /// Typed lookup of an integer parameter.
    pub fn get_int(&self, name: &str) -> Result<i64, ParamError> {
        match self.require(name)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(self.mismatch(name, "int", other)),
        }
    }

    /// Typed lookup of a float parameter.
    pub fn get_float(&self, name: &str) -> Result<f64, ParamError> {
        match self.require(name)? {
            ParamValue::Float(v) => Ok(*v),
            other => Err(self.mismatch(name, "float", other)),
        }
    }

    /// Typed lookup of a string parameter.
    pub fn get_str(&self, name: &str) -> Result<&str, ParamError> {
        match self.require(name)? {
            ParamValue::Str(v) => Ok(v),
            other => Err(self.mismatch(name, "string", other)),
        }
    }

    /// Typed lookup of a boolean parameter.
    pub fn get_bool(&self, name: &str) -> Result<bool, ParamError> {
        match self.require(name)? {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(self.mismatch(name, "bool", other)),
        }
    }

    /// Iterate over `(name, value)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parameter names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Write every parameter into the configuration record, one scalar
    /// entry under [`PARAMETERS_GROUP`] per parameter.
    ///
    /// Fails with [`ParamError::RecordFrozen`] if the record already
    /// holds parameters: a run's configuration is written exactly once.
    pub fn write_record(&self, record: &mut dyn Container) -> Result<(), ParamError> {
        if record.has(PARAMETERS_GROUP) {
            return Err(ParamError::RecordFrozen);
        }
        record.create_group(PARAMETERS_GROUP)?;
        for (name, value) in self.iter() {
            record.write_scalar(&format!("{PARAMETERS_GROUP}/{name}"), value.clone())?;
        }
        Ok(())
    }

    /// Replace the value of every registered parameter with the one
    /// stored in the configuration record.
    ///
    /// Names absent from the record keep their in-memory value, so a
    /// newer build can introduce parameters without invalidating old
    /// records.
    pub fn read_record(&mut self, record: &dyn Container) -> Result<(), ParamError> {
        let names: Vec<String> = self.entries.keys().cloned().collect();
        for name in names {
            let path = format!("{PARAMETERS_GROUP}/{name}");
            if record.has(&path) {
                let value = record.read_scalar(&path)?;
                self.entries.insert(name, value);
            }
        }
        Ok(())
    }

    fn require(&self, name: &str) -> Result<&ParamValue, ParamError> {
        self.entries.get(name).ok_or_else(|| ParamError::Missing {
            name: name.to_string(),
        })
    }

    fn mismatch(&self, name: &str, expected: &'static str, found: &ParamValue) -> ParamError {
        ParamError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}
