//! End-to-end properties of `load` + `search` over in-memory tables.

use reimbursement_finder_core::{
    load, search, MatchMode, RawTable, RecordStore, Scalar, SearchOptions, SearchStatus, Store,
};

fn exact() -> SearchOptions {
    SearchOptions {
        mode: MatchMode::Exact,
        threshold: 0,
        limit: 50,
    }
}

fn fuzzy(threshold: u8) -> SearchOptions {
    SearchOptions {
        mode: MatchMode::Fuzzy,
        threshold,
        limit: 50,
    }
}

fn hospital_tables() -> Vec<RawTable> {
    vec![
        RawTable::new("cantonal.csv")
            .with_column("Description", ["Knee Replacement", "", "Hip Replacement"])
            .with_column("CPT", [Some("27447"), Some("99213"), None])
            .with_column(
                "Reimbursement",
                [Scalar::from("CHF 12'500"), Scalar::from("180"), Scalar::from("N/A")],
            ),
        RawTable::new("private.csv")
            .with_column("name", ["Cataract Surgery", "Colonoscopy"])
            .with_column("cpt_code", ["66984", "45378"])
            .with_column("cost", [6500.0, 3200.0])
            .with_column("Exceptions", ["", "Requires prior authorization"]),
    ]
}

fn procedures(store: &RecordStore, indices: impl IntoIterator<Item = usize>) -> Vec<String> {
    indices
        .into_iter()
        .map(|i| store.all()[i].procedure.clone())
        .collect()
}

#[test]
fn required_text_fields_are_never_empty() {
    let outcome = load(hospital_tables());
    assert_eq!(outcome.record_count, 5);
    for record in outcome.store.all() {
        assert!(!record.procedure.is_empty());
        assert!(!record.code.is_empty());
        assert!(!record.source_label.is_empty());
    }
    assert_eq!(outcome.store.all()[1].procedure, "Unknown");
    assert_eq!(outcome.store.all()[2].code, "Unknown");
}

#[test]
fn cpt_and_cpt_code_both_become_code() {
    let store = load(hospital_tables()).store;
    assert!(store.schema().iter().any(|c| c == "code"));
    assert!(!store.schema().iter().any(|c| c == "CPT" || c == "CptCode"));

    for query in ["27447", "45378"] {
        let outcome = search(&store, query, &exact());
        assert_eq!(outcome.total_match_count, 1, "query {}", query);
        assert!(outcome.results[0].matched_fields.contains("code"));
    }
}

#[test]
fn not_available_amount_is_absent_and_never_compared() {
    let store = load(hospital_tables()).store;
    let hip = store
        .all()
        .iter()
        .position(|r| r.procedure == "Hip Replacement")
        .unwrap();
    assert_eq!(store.all()[hip].amount, None);

    for query in ["amount < 1000000", "amount >= 0", "amount = 0"] {
        let outcome = search(&store, query, &exact());
        assert!(
            outcome.results.iter().all(|r| r.record_index != hip),
            "query {}",
            query
        );
    }
}

#[test]
fn exact_substring_in_one_procedure() {
    let store = load(hospital_tables()).store;
    let outcome = search(&store, "cataract", &exact());
    assert_eq!(outcome.status, SearchStatus::Ok);
    assert_eq!(outcome.total_match_count, 1);
    assert_eq!(outcome.results[0].match_score, 100.0);
    assert_eq!(
        procedures(&store, outcome.results.iter().map(|r| r.record_index)),
        vec!["Cataract Surgery"]
    );
}

#[test]
fn fuzzy_threshold_100_is_substring_only() {
    let store = load(hospital_tables()).store;
    for query in ["replacement", "colon", "27447"] {
        let strict = search(&store, query, &fuzzy(100));
        let literal = search(&store, query, &exact());
        let strict_idx: Vec<usize> = strict.results.iter().map(|r| r.record_index).collect();
        let literal_idx: Vec<usize> = literal.results.iter().map(|r| r.record_index).collect();
        assert_eq!(strict_idx, literal_idx, "query {}", query);
    }
}

#[test]
fn raising_threshold_never_adds_matches() {
    let store = load(hospital_tables()).store;
    for query in ["replacment", "colonscopy", "surgery", "x"] {
        let mut previous = usize::MAX;
        for threshold in (0..=100u8).step_by(10) {
            let total = search(&store, query, &fuzzy(threshold)).total_match_count;
            assert!(
                total <= previous,
                "query {} grew at threshold {}",
                query,
                threshold
            );
            previous = total;
        }
    }
}

#[test]
fn amount_comparison_over_mixed_column() {
    let store = load(vec![RawTable::new("amounts.csv")
        .with_column("Procedure", ["A", "B", "C", "D"])
        .with_column("Amount", [Some(12500.0), Some(3200.0), None, Some(4999.0)])])
    .store;
    let outcome = search(&store, "amount < 5000", &exact());
    let amounts: Vec<Option<f64>> = outcome
        .results
        .iter()
        .map(|r| store.all()[r.record_index].amount)
        .collect();
    assert_eq!(amounts, vec![Some(3200.0), Some(4999.0)]);
    assert_eq!(outcome.total_match_count, 2);
}

#[test]
fn empty_query_regardless_of_store() {
    let loaded = load(hospital_tables()).store;
    let empty = RecordStore::empty();
    for query in ["", "   "] {
        for store in [&loaded, &empty] {
            let outcome = search(store, query, &fuzzy(60));
            assert_eq!(outcome.status, SearchStatus::EmptyQuery);
            assert!(outcome.results.is_empty());
            assert_eq!(outcome.total_match_count, 0);
        }
    }
}

#[test]
fn empty_store_reports_status() {
    let store = load(Vec::new()).store;
    for query in ["knee", "amount < 5000", "sort:frequency"] {
        let outcome = search(&store, query, &fuzzy(60));
        assert_eq!(outcome.status, SearchStatus::EmptyStore);
        assert_eq!(outcome.total_match_count, 0);
    }
}

#[test]
fn loading_is_order_independent() {
    let forward = load(hospital_tables()).store;
    let mut reversed_tables = hospital_tables();
    reversed_tables.reverse();
    let reversed = load(reversed_tables).store;
    let again = load(hospital_tables()).store;

    assert_eq!(forward, reversed);
    assert_eq!(forward, again);
}

#[test]
fn keyword_and_sort_directives_end_to_end() {
    let store = load(hospital_tables()).store;

    let auth = search(&store, "prior authorization", &exact());
    assert_eq!(
        procedures(&store, auth.results.iter().map(|r| r.record_index)),
        vec!["Colonoscopy"]
    );

    let by_amount = search(&store, "sort:amount", &exact());
    assert_eq!(by_amount.total_match_count, 5);
    assert_eq!(
        store.all()[by_amount.results[0].record_index].procedure,
        "Knee Replacement"
    );
    let last = by_amount.results.last().map(|r| r.record_index);
    assert_eq!(last.map(|i| store.all()[i].amount), Some(None));
}
