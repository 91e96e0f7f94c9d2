//! Non-fatal diagnostics returned alongside computed values.
//!
//! A negative domestic or foreign rate is legal (EUR, JPY, CHF markets) but
//! worth flagging. Instead of printing, every operation returns its value
//! wrapped in [`Evaluated`], whose [`Diagnostics`] list can be inspected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which interest rate a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateKind {
    /// Domestic (discounting) rate `rd`.
    Domestic,
    /// Foreign rate or continuous dividend yield `rf`.
    Foreign,
}

impl RateKind {
    /// Field name in [`OptionParameters`](crate::types::OptionParameters).
    pub fn field(self) -> &'static str {
        match self {
            RateKind::Domestic => "domestic_rate",
            RateKind::Foreign => "foreign_rate",
        }
    }
}

/// A warning-class condition. Computation proceeds when one is raised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Diagnostic {
    /// A rate is negative.
    NegativeRate { rate: RateKind, value: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NegativeRate { rate, value } => {
                write!(f, "{} is negative: {value}", rate.field())
            }
        }
    }
}

/// Ordered collection of diagnostics raised during one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Append diagnostics from another operation, skipping duplicates.
    pub fn merge(&mut self, other: Diagnostics) {
        for d in other.entries {
            if !self.entries.contains(&d) {
                self.entries.push(d);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// `true` if a negative-rate diagnostic was raised for `rate`.
    pub fn has_negative_rate(&self, rate: RateKind) -> bool {
        self.entries
            .iter()
            .any(|d| matches!(d, Diagnostic::NegativeRate { rate: r, .. } if *r == rate))
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A computed value together with the non-fatal diagnostics raised for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluated<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Evaluated<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    /// Drop the diagnostics and keep the value.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Evaluated<U> {
        Evaluated {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}
