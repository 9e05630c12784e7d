//! Declared schema for financial field extraction.

use serde::{Deserialize, Serialize};

/// A single numeric field the financial handler must extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Field name as returned by the extraction backend.
    pub name: String,
    /// Whether the field must be populated for the result to be accepted.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Inclusive lower bound, if any.
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive upper bound, if any.
    #[serde(default)]
    pub max: Option<f64>,
}

const fn default_required() -> bool {
    true
}

impl FieldSpec {
    /// Creates a required field without bounds.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            min: None,
            max: None,
        }
    }

    /// Creates an optional field without bounds.
    #[must_use]
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    /// Sets the inclusive numeric range.
    #[must_use]
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Returns whether `value` lies within the declared range.
    ///
    /// Non-finite values never satisfy a field.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite()
            && self.min.is_none_or(|min| value >= min)
            && self.max.is_none_or(|max| value <= max)
    }
}

/// Named collection of extraction fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinancialSchema {
    /// Schema name, recorded with extraction results.
    pub name: String,
    /// Declared fields.
    pub fields: Vec<FieldSpec>,
}

impl FinancialSchema {
    /// Returns the names of all required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.required)
    }

    /// Finds a field declaration by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl Default for FinancialSchema {
    fn default() -> Self {
        Self {
            name: "loan_portfolio".to_owned(),
            fields: vec![
                FieldSpec::required("total_loans").with_range(Some(0.0), None),
                FieldSpec::required("net_interest_margin").with_range(Some(0.0), Some(100.0)),
                FieldSpec::optional("portfolio_yield").with_range(Some(0.0), Some(100.0)),
                FieldSpec::optional("non_performing_ratio").with_range(Some(0.0), Some(100.0)),
            ],
        }
    }
}
