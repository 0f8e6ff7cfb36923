//! Core data models used throughout Reimbursement Finder.
//!
//! [`RawTable`]s are what a source reader hands over; [`Record`]s are what
//! the normalizer produces and the store holds.

use chrono::NaiveDate;
use serde::Serialize;

/// Placeholder for a required text field no source supplied.
pub const UNKNOWN: &str = "Unknown";

/// One cell as produced by whatever parsed the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Scalar {
    /// True for [`Scalar::Empty`] and blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Empty => true,
            Scalar::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Empty)
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub values: Vec<Scalar>,
}

/// A source table: a label plus ordered columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source_label: String,
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            columns: Vec::new(),
        }
    }

    /// Builder-style column append.
    pub fn with_column<V: Into<Scalar>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.columns.push(RawColumn {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Row count, or `None` when columns disagree on length.
    pub fn row_count(&self) -> Option<usize> {
        let first = self.columns.first().map(|c| c.values.len()).unwrap_or(0);
        self.columns
            .iter()
            .all(|c| c.values.len() == first)
            .then_some(first)
    }
}

/// The fixed fields every record is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Procedure,
    Code,
    Amount,
    Category,
    Date,
}

impl CanonicalField {
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Procedure => "procedure",
            CanonicalField::Code => "code",
            CanonicalField::Amount => "amount",
            CanonicalField::Category => "category",
            CanonicalField::Date => "date",
        }
    }
}

/// Schema name of the provenance column.
pub const SOURCE_LABEL_FIELD: &str = "source_label";

/// A typed value of a non-canonical column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Option<f64>),
    Date(Option<NaiveDate>),
}

impl FieldValue {
    /// The text content, if this is a non-empty text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Number(n) => n.is_none(),
            FieldValue::Date(d) => d.is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraField {
    pub name: String,
    pub value: FieldValue,
}

/// One reimbursable procedure entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub procedure: String,
    pub code: String,
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub source_label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ExtraField>,
    pub(crate) searchable_text: String,
}

impl Record {
    /// Concatenated textual attributes, built once per load.
    pub fn searchable_text(&self) -> &str {
        &self.searchable_text
    }

    /// Look up a non-canonical column by its normalized name.
    pub fn extra(&self, name: &str) -> Option<&FieldValue> {
        self.extra
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Non-empty textual attributes as `(field name, value)`, in schema order.
    pub fn text_fields(&self) -> Vec<(&str, &str)> {
        let mut fields = vec![
            (CanonicalField::Procedure.as_str(), self.procedure.as_str()),
            (CanonicalField::Code.as_str(), self.code.as_str()),
        ];
        if let Some(category) = self.category.as_deref() {
            fields.push((CanonicalField::Category.as_str(), category));
        }
        fields.extend(
            self.extra
                .iter()
                .filter_map(|f| f.value.as_text().map(|text| (f.name.as_str(), text))),
        );
        fields.retain(|(_, value)| !value.is_empty());
        fields
    }

    /// True when the code is a real value rather than the placeholder.
    pub fn has_known_code(&self) -> bool {
        self.code != UNKNOWN
    }
}
