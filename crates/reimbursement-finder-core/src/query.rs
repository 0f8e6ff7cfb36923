//! Query interpretation: one input string, one [`QueryIntent`].
//!
//! The grammar is a fixed, ordered rule table. Each rule either claims the
//! whole input or declines; the first rule that claims it wins and
//! anything no rule claims is free text. Rules are kept mutually exclusive
//! by their leading tokens (`sort:`, a comparison operator or amount
//! field word, a `valid_*` directive word, an exact keyword phrase), so a
//! new directive can be appended without reordering the existing ones.

use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::QueryError;
use crate::models::CanonicalField;
use crate::normalize::{canonical_field, parse_date, parse_number};

/// Fields a comparison can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareField {
    Amount,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "=",
        }
    }

    /// Apply the operator to `lhs <op> rhs`.
    pub fn holds<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareValue {
    Number(f64),
    Date(NaiveDate),
}

/// Derived boolean attributes a keyword directive can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordTag {
    RequiresAuthorization,
    RequiresDocumentation,
}

/// Orderings a sort directive can request. All sort descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// How often the record's code occurs in the store.
    Frequency,
    Amount,
}

/// The structured meaning of one query string.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryIntent {
    FreeText(String),
    Comparison {
        field: CompareField,
        op: CompareOp,
        value: CompareValue,
    },
    Keyword(KeywordTag),
    Sort(SortKey),
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryIntent::FreeText(term) => write!(f, "text \"{}\"", term),
            QueryIntent::Comparison { field, op, value } => {
                let field = match field {
                    CompareField::Amount => "amount",
                    CompareField::Date => "date",
                };
                match value {
                    CompareValue::Number(n) => write!(f, "{} {} {}", field, op.symbol(), n),
                    CompareValue::Date(d) => {
                        write!(f, "{} {} {}", field, op.symbol(), d.format("%d/%m/%Y"))
                    }
                }
            }
            QueryIntent::Keyword(KeywordTag::RequiresAuthorization) => {
                write!(f, "requires authorization")
            }
            QueryIntent::Keyword(KeywordTag::RequiresDocumentation) => {
                write!(f, "requires documentation")
            }
            QueryIntent::Sort(SortKey::Frequency) => write!(f, "sort by code frequency"),
            QueryIntent::Sort(SortKey::Amount) => write!(f, "sort by amount"),
        }
    }
}

type Rule = fn(&str) -> Option<QueryIntent>;

/// Directive rules in priority order.
const RULES: &[(&str, Rule)] = &[
    ("sort", parse_sort),
    ("amount_comparison", parse_amount_comparison),
    ("date_directive", parse_date_directive),
    ("keyword", parse_keyword),
];

const KEYWORDS: &[(&str, KeywordTag)] = &[
    ("authorization required", KeywordTag::RequiresAuthorization),
    ("requires authorization", KeywordTag::RequiresAuthorization),
    ("pre-authorization", KeywordTag::RequiresAuthorization),
    ("prior authorization", KeywordTag::RequiresAuthorization),
    ("documentation required", KeywordTag::RequiresDocumentation),
    ("requires documentation", KeywordTag::RequiresDocumentation),
];

/// Longer operators first so `<=` is not read as `<`.
const OPERATORS: &[(&str, CompareOp)] = &[
    ("<=", CompareOp::Le),
    (">=", CompareOp::Ge),
    ("==", CompareOp::Eq),
    ("<", CompareOp::Lt),
    (">", CompareOp::Gt),
    ("=", CompareOp::Eq),
];

/// Parse a query string into exactly one intent.
pub fn interpret(input: &str) -> Result<QueryIntent, QueryError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QueryError::EmptyQuery);
    }

    for (name, rule) in RULES {
        if let Some(intent) = rule(trimmed) {
            debug!(rule = *name, %intent, "query matched directive");
            return Ok(intent);
        }
    }

    Ok(QueryIntent::FreeText(trimmed.to_string()))
}

/// `sort:<key>`
fn parse_sort(input: &str) -> Option<QueryIntent> {
    let lower = input.to_lowercase();
    let key = lower
        .strip_prefix("sort")?
        .trim_start()
        .strip_prefix(':')?
        .trim();
    match key {
        "frequency" | "freq" => Some(QueryIntent::Sort(SortKey::Frequency)),
        _ if canonical_field(key) == Some(CanonicalField::Amount) => {
            Some(QueryIntent::Sort(SortKey::Amount))
        }
        _ => None,
    }
}

fn split_operator(input: &str) -> Option<(CompareOp, &str)> {
    OPERATORS
        .iter()
        .find_map(|(symbol, op)| input.strip_prefix(symbol).map(|rest| (*op, rest.trim())))
}

/// `[amount] <op> <number>`, where the field word may be any amount synonym.
fn parse_amount_comparison(input: &str) -> Option<QueryIntent> {
    let word_end = input
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(input.len());
    let (word, rest) = input.split_at(word_end);
    if !word.is_empty() && canonical_field(word) != Some(CanonicalField::Amount) {
        return None;
    }

    let (op, literal) = split_operator(rest.trim_start())?;
    let value = parse_number(literal)?;
    Some(QueryIntent::Comparison {
        field: CompareField::Amount,
        op,
        value: CompareValue::Number(value),
    })
}

/// `valid_after <date>` / `valid_before <date>`
fn parse_date_directive(input: &str) -> Option<QueryIntent> {
    let mut parts = input.split_whitespace();
    let directive = parts.next()?.to_lowercase();
    let literal = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let op = match directive.as_str() {
        "valid_after" => CompareOp::Ge,
        "valid_before" => CompareOp::Le,
        _ => return None,
    };
    let date = parse_date(literal)?;
    Some(QueryIntent::Comparison {
        field: CompareField::Date,
        op,
        value: CompareValue::Date(date),
    })
}

fn parse_keyword(input: &str) -> Option<QueryIntent> {
    let phrase = input
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    KEYWORDS
        .iter()
        .find(|(known, _)| *known == phrase)
        .map(|(_, tag)| QueryIntent::Keyword(*tag))
}
