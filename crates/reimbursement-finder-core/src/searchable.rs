//! Per-record searchable text.

use crate::models::Record;

/// Separator between concatenated attribute values.
pub const SEPARATOR: &str = " | ";

/// Join every non-empty textual attribute of a record, in schema order.
///
/// Numeric and date attributes are left out, as is `source_label`.
pub fn build_searchable_text(record: &Record) -> String {
    record
        .text_fields()
        .iter()
        .map(|(_, value)| *value)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Recompute the searchable text of every record in a load.
pub fn attach_searchable_text(records: &mut [Record]) {
    for record in records.iter_mut() {
        record.searchable_text = build_searchable_text(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTable;
    use crate::normalize::normalize_tables;

    #[test]
    fn test_searchable_text_joins_text_fields_in_order() {
        let table = RawTable::new("tariffs.csv")
            .with_column("Code", ["KR-101"])
            .with_column("Procedure", ["Knee Replacement"])
            .with_column("Amount", [12500.0])
            .with_column("Exceptions", ["Requires pre-authorization"])
            .with_column("Notes", [""]);
        let mut records = normalize_tables(&[table]).records;
        attach_searchable_text(&mut records);
        assert_eq!(
            records[0].searchable_text(),
            "Knee Replacement | KR-101 | Requires pre-authorization"
        );
    }

    #[test]
    fn test_searchable_text_is_recomputed() {
        let table = RawTable::new("t.csv").with_column("name", ["Colonoscopy"]);
        let mut records = normalize_tables(&[table]).records;
        attach_searchable_text(&mut records);
        records[0].procedure = "Gastroscopy".to_string();
        attach_searchable_text(&mut records);
        assert_eq!(records[0].searchable_text(), "Gastroscopy | Unknown");
    }
}
