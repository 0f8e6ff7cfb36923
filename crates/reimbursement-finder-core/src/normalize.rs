//! Schema normalization: raw tables in, canonical [`Record`]s out.
//!
//! Column names are resolved in two steps. [`canonical_field`] consults the
//! declarative synonym table; anything it does not know goes through
//! [`fallback_column_name`] and is kept as an extra column. Only after a
//! column is resolved is its content coerced into one of three semantic
//! types: text, optional number, or optional date.
//!
//! Tables are processed in `source_label` order so the same input always
//! yields the same records in the same order. A table that is structurally
//! broken is skipped with a warning; a bad cell only loses that cell.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::models::{
    CanonicalField, ExtraField, FieldValue, RawColumn, RawTable, Record, Scalar,
    SOURCE_LABEL_FIELD, UNKNOWN,
};

/// Synonym table for canonical columns, keyed by [`synonym_key`] output.
const SYNONYMS: &[(&str, CanonicalField)] = &[
    ("procedure", CanonicalField::Procedure),
    ("proc", CanonicalField::Procedure),
    ("procedure_name", CanonicalField::Procedure),
    ("name", CanonicalField::Procedure),
    ("description", CanonicalField::Procedure),
    ("service", CanonicalField::Procedure),
    ("code", CanonicalField::Code),
    ("cpt", CanonicalField::Code),
    ("cpt_code", CanonicalField::Code),
    ("procedure_code", CanonicalField::Code),
    ("billing_code", CanonicalField::Code),
    ("amount", CanonicalField::Amount),
    ("price", CanonicalField::Amount),
    ("cost", CanonicalField::Amount),
    ("reimbursement", CanonicalField::Amount),
    ("charge", CanonicalField::Amount),
    ("fee", CanonicalField::Amount),
    ("category", CanonicalField::Category),
    ("type", CanonicalField::Category),
    ("department", CanonicalField::Category),
    ("date", CanonicalField::Date),
    ("service_date", CanonicalField::Date),
    ("procedure_date", CanonicalField::Date),
    ("valid_from", CanonicalField::Date),
    ("validfrom", CanonicalField::Date),
    ("effective_date", CanonicalField::Date),
];

const CURRENCY_MARKERS: &[&str] = &["CHF", "EUR", "USD", "$", "€", "£"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// Output of one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<Record>,
    /// Unified column order across all sources.
    pub schema: Vec<String>,
    pub warnings: Vec<IngestError>,
}

/// Where a raw column ends up after name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKey {
    Canonical(CanonicalField),
    Extra(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraType {
    Text,
    Number,
    Date,
}

fn synonym_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Step one: case-insensitive synonym lookup.
pub fn canonical_field(raw: &str) -> Option<CanonicalField> {
    let key = synonym_key(raw);
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, field)| *field)
}

/// Step two: title-case the alphanumeric words of an unknown header.
///
/// `"valid until"` and `"valid_until"` both become `"ValidUntil"`. Returns
/// `None` when nothing alphanumeric is left.
pub fn fallback_column_name(raw: &str) -> Option<String> {
    let name: String = raw
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    (!name.is_empty()).then_some(name)
}

/// Resolve a header: synonyms first, then the fallback transform.
/// `position` is the 0-based column index, used for unnamed headers.
pub fn resolve_column(raw: &str, position: usize) -> ColumnKey {
    match canonical_field(raw) {
        Some(field) => ColumnKey::Canonical(field),
        None => ColumnKey::Extra(
            fallback_column_name(raw).unwrap_or_else(|| format!("Column{}", position + 1)),
        ),
    }
}

/// Parse a number from a cell, tolerating currency markers and
/// thousands separators. Non-finite values are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    let mut s = text.trim();
    for marker in CURRENCY_MARKERS {
        if let Some(rest) = s.strip_prefix(marker) {
            s = rest.trim_start();
        }
        if let Some(rest) = s.strip_suffix(marker) {
            s = rest.trim_end();
        }
    }
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '\'' | '’' | '_') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse an amount: a number that is also non-negative.
pub fn parse_amount(value: &Scalar) -> Option<f64> {
    let n = match value {
        Scalar::Number(n) => Some(*n),
        Scalar::Text(s) => parse_number(s),
        _ => None,
    }?;
    (n.is_finite() && n >= 0.0).then_some(n)
}

/// Parse a calendar date in any of the accepted layouts.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn date_of(value: &Scalar) -> Option<NaiveDate> {
    match value {
        Scalar::Date(d) => Some(*d),
        Scalar::Text(s) => parse_date(s),
        _ => None,
    }
}

/// A cell read as a plain numeric literal, the way a spreadsheet would type
/// it. Integers with a leading zero (`00123`) are identifiers, not numbers.
fn number_of(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Number(n) => Some(*n).filter(|n| n.is_finite()),
        Scalar::Text(s) => {
            let s = s.trim();
            let leading_zero = s.len() > 1 && s.starts_with('0') && !s.starts_with("0.");
            if leading_zero {
                return None;
            }
            s.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Stringify a cell for a text column. Missing becomes the empty string.
pub fn text_of(value: &Scalar) -> String {
    match value {
        Scalar::Empty => String::new(),
        Scalar::Text(s) => s.trim().to_string(),
        Scalar::Number(n) => format_number(*n),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

fn infer_extra_type(columns: &[&RawColumn]) -> ExtraType {
    let mut cells = columns
        .iter()
        .flat_map(|c| c.values.iter())
        .filter(|v| !v.is_blank())
        .peekable();
    if cells.peek().is_none() {
        return ExtraType::Text;
    }
    let (mut numbers, mut dates, mut total) = (0usize, 0usize, 0usize);
    for cell in cells {
        total += 1;
        if number_of(cell).is_some() {
            numbers += 1;
        } else if date_of(cell).is_some() {
            dates += 1;
        }
    }
    if numbers == total {
        ExtraType::Number
    } else if dates == total {
        ExtraType::Date
    } else {
        ExtraType::Text
    }
}

/// First non-blank cell among duplicate columns for one row.
fn first_present<'a>(columns: &[&'a RawColumn], row: usize) -> Option<&'a Scalar> {
    columns
        .iter()
        .filter_map(|c| c.values.get(row))
        .find(|v| !v.is_blank())
}

/// Per-table column plan: which raw columns feed which field.
struct TablePlan<'a> {
    procedure: Vec<&'a RawColumn>,
    code: Vec<&'a RawColumn>,
    amount: Vec<&'a RawColumn>,
    category: Vec<&'a RawColumn>,
    date: Vec<&'a RawColumn>,
    extras: Vec<(String, ExtraType, Vec<&'a RawColumn>)>,
}

impl<'a> TablePlan<'a> {
    fn build(table: &'a RawTable) -> Self {
        let mut plan = TablePlan {
            procedure: Vec::new(),
            code: Vec::new(),
            amount: Vec::new(),
            category: Vec::new(),
            date: Vec::new(),
            extras: Vec::new(),
        };
        let mut extra_columns: Vec<(String, Vec<&'a RawColumn>)> = Vec::new();

        for (position, column) in table.columns.iter().enumerate() {
            match resolve_column(&column.name, position) {
                ColumnKey::Canonical(field) => match field {
                    CanonicalField::Procedure => plan.procedure.push(column),
                    CanonicalField::Code => plan.code.push(column),
                    CanonicalField::Amount => plan.amount.push(column),
                    CanonicalField::Category => plan.category.push(column),
                    CanonicalField::Date => plan.date.push(column),
                },
                ColumnKey::Extra(name) => {
                    match extra_columns.iter_mut().find(|(n, _)| *n == name) {
                        Some((_, cols)) => cols.push(column),
                        None => extra_columns.push((name, vec![column])),
                    }
                }
            }
        }

        plan.extras = extra_columns
            .into_iter()
            .map(|(name, cols)| {
                let ty = infer_extra_type(&cols);
                (name, ty, cols)
            })
            .collect();
        plan
    }
}

/// Counts cells that were present but could not be coerced.
#[derive(Default)]
struct CoercionFailures {
    amount: usize,
    date: usize,
}

/// `None` when the source has no such column, otherwise the trimmed text.
fn text_field(columns: &[&RawColumn], row: usize) -> Option<String> {
    if columns.is_empty() {
        None
    } else {
        Some(first_present(columns, row).map(text_of).unwrap_or_default())
    }
}

fn normalize_row(
    plan: &TablePlan<'_>,
    source_label: &str,
    row: usize,
    failures: &mut CoercionFailures,
) -> Option<Record> {
    let procedure = text_field(&plan.procedure, row).unwrap_or_default();
    let code = text_field(&plan.code, row).unwrap_or_default();
    let category = text_field(&plan.category, row);

    let amount_cell = first_present(&plan.amount, row);
    let amount = amount_cell.and_then(parse_amount);
    if amount_cell.is_some() && amount.is_none() {
        failures.amount += 1;
    }

    let date_cell = first_present(&plan.date, row);
    let date = date_cell.and_then(date_of);
    if date_cell.is_some() && date.is_none() {
        failures.date += 1;
    }

    let extra: Vec<ExtraField> = plan
        .extras
        .iter()
        .map(|(name, ty, cols)| {
            let cell = first_present(cols, row);
            let value = match ty {
                ExtraType::Text => FieldValue::Text(cell.map(text_of).unwrap_or_default()),
                ExtraType::Number => FieldValue::Number(cell.and_then(number_of)),
                ExtraType::Date => FieldValue::Date(cell.and_then(date_of)),
            };
            ExtraField {
                name: name.clone(),
                value,
            }
        })
        .collect();

    let all_empty = procedure.is_empty()
        && code.is_empty()
        && amount.is_none()
        && category.as_deref().map_or(true, str::is_empty)
        && date.is_none()
        && extra.iter().all(|f| f.value.is_empty());
    if all_empty {
        return None;
    }

    let or_unknown = |s: String| if s.is_empty() { UNKNOWN.to_string() } else { s };

    Some(Record {
        procedure: or_unknown(procedure),
        code: or_unknown(code),
        amount,
        category,
        date,
        source_label: source_label.to_string(),
        extra,
        searchable_text: String::new(),
    })
}

fn push_unique(schema: &mut Vec<String>, name: &str) {
    if !schema.iter().any(|n| n == name) {
        schema.push(name.to_string());
    }
}

/// Normalize and merge a set of raw tables.
///
/// Records come back without searchable text; see
/// [`attach_searchable_text`](crate::searchable::attach_searchable_text).
pub fn normalize_tables(tables: &[RawTable]) -> Normalized {
    let mut out = Normalized::default();

    if tables.is_empty() {
        out.warnings.push(IngestError::NoSourcesFound);
    }

    let mut ordered: Vec<&RawTable> = tables.iter().collect();
    ordered.sort_by(|a, b| a.source_label.cmp(&b.source_label));

    let mut has_category = false;
    let mut has_date = false;
    let mut extra_names: Vec<String> = Vec::new();

    for table in ordered {
        let label = table.source_label.as_str();
        let rows = match table.row_count() {
            _ if table.columns.is_empty() => {
                out.warnings.push(IngestError::SourceUnreadable {
                    source_label: label.to_string(),
                    reason: "table has no columns".to_string(),
                });
                continue;
            }
            Some(rows) => rows,
            None => {
                out.warnings.push(IngestError::SourceUnreadable {
                    source_label: label.to_string(),
                    reason: "columns have unequal lengths".to_string(),
                });
                continue;
            }
        };

        let plan = TablePlan::build(table);
        has_category |= !plan.category.is_empty();
        has_date |= !plan.date.is_empty();
        for (name, _, _) in &plan.extras {
            push_unique(&mut extra_names, name);
        }

        let mut failures = CoercionFailures::default();
        let before = out.records.len();
        for row in 0..rows {
            if let Some(record) = normalize_row(&plan, label, row, &mut failures) {
                out.records.push(record);
            }
        }
        let kept = out.records.len() - before;
        debug!(
            source = label,
            rows,
            kept,
            dropped = rows - kept,
            extras = plan.extras.len(),
            "normalized source"
        );

        for (column, count) in [
            (CanonicalField::Amount, failures.amount),
            (CanonicalField::Date, failures.date),
        ] {
            if count > 0 {
                out.warnings.push(IngestError::UnparseableValues {
                    source_label: label.to_string(),
                    column: column.as_str().to_string(),
                    count,
                });
            }
        }
    }

    for w in &out.warnings {
        warn!("{}", w);
    }

    let mut schema: Vec<String> = [
        CanonicalField::Procedure,
        CanonicalField::Code,
        CanonicalField::Amount,
    ]
    .iter()
    .map(|f| f.as_str().to_string())
    .collect();
    if has_category {
        schema.push(CanonicalField::Category.as_str().to_string());
    }
    if has_date {
        schema.push(CanonicalField::Date.as_str().to_string());
    }
    for name in &extra_names {
        push_unique(&mut schema, name);
    }
    schema.push(SOURCE_LABEL_FIELD.to_string());
    out.schema = schema;

    out
}
