//! Variation Expansion
//!
//! A [`VariationExpander`] declares candidate values per parameter key and
//! expands them into the Cartesian product of concrete [`Variation`]s.
//! Keys are kept in declaration order and the last declared key varies
//! fastest, so the output order is fully determined by the declaration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parameter value bound to a variation key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// String
    Str(String),
}

impl ParamValue {
    /// Value as a non-negative integer
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Value as a signed integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Value as a float; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                ParamValue::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_from_wide_int {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                match i64::try_from(v) {
                    Ok(i) => ParamValue::Int(i),
                    Err(_) => ParamValue::Float(v as f64),
                }
            }
        })*
    };
}

impl_from_wide_int!(u64, usize);

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(f64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// One key bound to one value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    /// Parameter key
    pub key: String,
    /// Bound value
    pub value: ParamValue,
}

/// A report column: a variation key and its display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Variation key
    pub key: String,
    /// Label shown in reports
    pub label: String,
}

/// A report-column value of one variation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    /// Column label
    pub label: String,
    /// Value bound to the column's key
    pub value: ParamValue,
}

/// One concrete combination of parameter values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variation {
    index: usize,
    bindings: Vec<Binding>,
    marks: Vec<Mark>,
}

impl Variation {
    /// The variation of a case without declared parameters
    pub fn empty() -> Self {
        Self {
            index: 0,
            bindings: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// Position in expansion order
    pub fn index(&self) -> usize {
        self.index
    }

    /// All bindings, in key declaration order
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Report-column values, in column declaration order
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Value bound to `key`
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.bindings
            .iter()
            .find(|b| b.key == key)
            .map(|b| &b.value)
    }

    /// Whether no parameter is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            return f.write_str("(default)");
        }
        for (i, b) in self.bindings.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", b.key, b.value)?;
        }
        Ok(())
    }
}

/// Declaration of parameter candidates and report columns
#[derive(Debug, Clone, Default)]
pub struct VariationExpander {
    keys: Vec<(String, Vec<ParamValue>)>,
    columns: Vec<Column>,
}

impl VariationExpander {
    /// Empty declaration; expands to a single empty variation
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare candidate values for `key`
    pub fn vary<K, I, V>(mut self, key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.keys
            .push((key.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Show `key` as a report column titled `label`
    pub fn column(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.columns.push(Column {
            key: key.into(),
            label: label.into(),
        });
        self
    }

    /// Declared keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(k, _)| k.as_str())
    }

    /// Candidate values for `key`
    pub fn candidates(&self, key: &str) -> Option<&[ParamValue]> {
        self.keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Declared report columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of variations [`expand`](Self::expand) yields
    pub fn len(&self) -> usize {
        self.keys.iter().map(|(_, v)| v.len()).product()
    }

    /// Whether expansion yields nothing; never true for a valid declaration
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the declaration without expanding it
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, (key, values)) in self.keys.iter().enumerate() {
            if key.trim().is_empty() {
                return Err(ConfigError::Blank("variation key"));
            }
            if self.keys[..i].iter().any(|(k, _)| k == key) {
                return Err(ConfigError::DuplicateVariation(key.clone()));
            }
            if values.is_empty() {
                return Err(ConfigError::EmptyVariation(key.clone()));
            }
        }
        for (i, column) in self.columns.iter().enumerate() {
            if column.label.trim().is_empty() {
                return Err(ConfigError::Blank("column label"));
            }
            if !self.keys.iter().any(|(k, _)| *k == column.key) {
                return Err(ConfigError::UnknownColumn(column.key.clone()));
            }
            if self.columns[..i].iter().any(|c| c.key == column.key) {
                return Err(ConfigError::DuplicateColumn(column.key.clone()));
            }
        }
        Ok(())
    }

    /// Expand into every combination of candidate values
    pub fn expand(&self) -> Result<Vec<Variation>, ConfigError> {
        self.validate()?;

        let mut variations = Vec::with_capacity(self.len());
        let mut cursor = vec![0_usize; self.keys.len()];

        loop {
            variations.push(self.variation_at(variations.len(), &cursor));

            // Odometer step: the last key turns over first.
            let mut pos = self.keys.len();
            loop {
                if pos == 0 {
                    return Ok(variations);
                }
                pos -= 1;
                cursor[pos] += 1;
                if cursor[pos] < self.keys[pos].1.len() {
                    break;
                }
                cursor[pos] = 0;
            }
        }
    }

    fn variation_at(&self, index: usize, cursor: &[usize]) -> Variation {
        let bindings: Vec<Binding> = self
            .keys
            .iter()
            .zip(cursor)
            .map(|((key, values), &i)| Binding {
                key: key.clone(),
                value: values[i].clone(),
            })
            .collect();

        let marks = self
            .columns
            .iter()
            .filter_map(|column| {
                bindings
                    .iter()
                    .find(|b| b.key == column.key)
                    .map(|b| Mark {
                        label: column.label.clone(),
                        value: b.value.clone(),
                    })
            })
            .collect();

        Variation {
            index,
            bindings,
            marks,
        }
    }
}
