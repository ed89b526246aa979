//! Integration tests for filtering collections.

use dictql::{
    into_record, FilterConfig, MissingReferencePolicy, QueryError, Record, RecordFilter,
};
use serde_json::json;
use std::cell::Cell;

const NAMES: [&str; 10] = [
    "Adam", "Bob", "Charles", "David", "Edward", "Frank", "Geoff", "Hugh", "Ian", "John",
];
const CITIES: [&str; 10] = [
    "London",
    "London",
    "Birmingham",
    "London",
    "Cardiff",
    "Glasgow",
    "Cardiff",
    "London",
    "Birmingham",
    "Birmingham",
];
const SALES: [i64; 10] = [100, 400, 350, 290, 180, 320, 500, 380, 350, 460];

fn sales_team() -> Vec<Record> {
    NAMES
        .iter()
        .zip(CITIES)
        .zip(SALES)
        .map(|((name, city), sales)| {
            into_record(json!({"name": name, "city": city, "sales": sales})).unwrap()
        })
        .collect()
}

fn names(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect()
}

#[test]
fn test_top_sellers() {
    let filter = RecordFilter::new("SELECT {name} FROM {sales_team} WHERE {sales} > 400").unwrap();
    let result = filter.filter("sales_team", &sales_team()).unwrap();

    assert_eq!(
        result,
        vec![
            into_record(json!({"name": "Geoff"})).unwrap(),
            into_record(json!({"name": "John"})).unwrap(),
        ]
    );
}

#[test]
fn test_filter_list() {
    let filter =
        RecordFilter::new("SELECT {name}, {city} FROM {sales_data} WHERE {sales} > 250").unwrap();
    let result = filter.filter("sales_data", &sales_team()).unwrap();

    assert_eq!(result.len(), 8);
    assert_eq!(
        names(&result),
        vec!["Bob", "Charles", "David", "Frank", "Geoff", "Hugh", "Ian", "John"]
    );
    for record in &result {
        assert_eq!(record.len(), 2);
        assert!(record.contains_key("city"));
    }
}

#[test]
fn test_wildcard_without_where_returns_everything() {
    let data = sales_team();
    let filter = RecordFilter::new("SELECT * FROM {sales_team}").unwrap();
    assert_eq!(filter.filter("sales_team", &data).unwrap(), data);
}

#[test]
fn test_combined_conditions() {
    let filter = RecordFilter::new(
        "SELECT {name} FROM {team} WHERE {city} = 'London' AND NOT {sales} < 300 OR {name} = 'Ian'",
    )
    .unwrap();
    let result = filter.filter("team", &sales_team()).unwrap();
    assert_eq!(names(&result), vec!["Bob", "Hugh", "Ian"]);
}

#[test]
fn test_grouped_conditions() {
    let filter = RecordFilter::new(
        "SELECT {name} FROM {team} WHERE ({city} = 'Cardiff' OR {city} = 'Glasgow') AND {sales} >= 320",
    )
    .unwrap();
    let result = filter.filter("team", &sales_team()).unwrap();
    assert_eq!(names(&result), vec!["Frank", "Geoff"]);
}

#[test]
fn test_incorrect_collection() {
    let filter = RecordFilter::new("SELECT * FROM {collection}").unwrap();
    let err = filter.filter("collection2", &[]).unwrap_err();
    assert!(matches!(err, QueryError::InvalidCollection(_)));

    assert!(filter.filter_par("collection2", &[]).is_err());
    assert!(filter.filter_iter("collection2", Vec::new()).is_err());
}

#[test]
fn test_missing_collection() {
    let filter = RecordFilter::new("SELECT * FROM {collection}").unwrap();
    let none: Vec<(&str, &[Record])> = Vec::new();
    let err = filter.filter_named(none).unwrap_err();
    assert!(matches!(err, QueryError::InvalidCollection(_)));
}

#[test]
fn test_extra_collections() {
    let filter = RecordFilter::new("SELECT * FROM {collection}").unwrap();
    let empty: Vec<Record> = Vec::new();
    let err = filter
        .filter_named([("collection", empty.as_slice()), ("collection2", empty.as_slice())])
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidCollection(ref msg) if msg.contains('2')));
}

#[test]
fn test_filter_named() {
    let data = sales_team();
    let filter = RecordFilter::new("SELECT {name} FROM {sales_data} WHERE {sales} > 450").unwrap();

    let result = filter
        .filter_named([("sales_data".to_string(), data.as_slice())])
        .unwrap();
    assert_eq!(names(&result), vec!["Geoff", "John"]);

    let err = filter
        .filter_named([("other", data.as_slice())])
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidCollection(_)));
}

#[test]
fn test_filter_iter() {
    let filter =
        RecordFilter::new("SELECT {name}, {sales} FROM {sales_data} WHERE {sales} > 250").unwrap();

    let mut count = 0;
    let mut seen = Vec::new();
    for record in filter.filter_iter("sales_data", sales_team()).unwrap() {
        let record = record.unwrap();
        assert!(record["sales"].as_i64().unwrap() > 250);
        seen.push(record["name"].as_str().unwrap().to_string());
        count += 1;
    }

    assert_eq!(count, 8);
    for expected in ["Bob", "Charles", "David", "Frank", "Geoff", "Hugh", "Ian", "John"] {
        assert!(seen.iter().any(|name| name == expected));
    }
}

#[test]
fn test_filter_iter_is_lazy_and_single_pass() {
    let filter = RecordFilter::new("SELECT {name} FROM {team} WHERE {sales} > 400").unwrap();
    let pulled = Cell::new(0);
    let source = sales_team().into_iter().inspect(|_| pulled.set(pulled.get() + 1));

    let mut iter = filter.filter_iter("team", source).unwrap();
    assert_eq!(pulled.get(), 0);

    let first = iter.next().unwrap().unwrap();
    assert_eq!(first["name"], json!("Geoff"));
    assert_eq!(pulled.get(), 7);

    let second = iter.next().unwrap().unwrap();
    assert_eq!(second["name"], json!("John"));
    assert_eq!(pulled.get(), 10);

    assert!(iter.next().is_none());
    assert_eq!(pulled.get(), 10);
}

#[test]
fn test_abort_on_missing_reference() {
    let mut data = sales_team();
    data[3].remove("sales");

    let filter = RecordFilter::new("SELECT {name} FROM {team} WHERE {sales} > 250").unwrap();
    let err = filter.filter("team", &data).unwrap_err();
    assert!(matches!(err, QueryError::UnrecognisedReference(ref name) if name == "sales"));

    let err = filter.filter_par("team", &data).unwrap_err();
    assert!(matches!(err, QueryError::UnrecognisedReference(_)));

    let results: Vec<_> = filter.filter_iter("team", data).unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(results[2].is_err());
}

#[test]
fn test_skip_on_missing_reference() {
    let mut data = sales_team();
    data[3].remove("sales");
    data[6].remove("name");

    let config = FilterConfig::default().with_missing_reference(MissingReferencePolicy::Skip);
    let filter =
        RecordFilter::with_config("SELECT {name} FROM {team} WHERE {sales} > 250", config).unwrap();

    let expected = vec!["Bob", "Charles", "Frank", "Hugh", "Ian", "John"];
    assert_eq!(names(&filter.filter("team", &data).unwrap()), expected);
    assert_eq!(names(&filter.filter_par("team", &data).unwrap()), expected);

    let lazy: Vec<Record> = filter
        .filter_iter("team", data)
        .unwrap()
        .collect::<dictql::Result<_>>()
        .unwrap();
    assert_eq!(names(&lazy), expected);
}

#[test]
fn test_type_mismatch_policy() {
    let data = sales_team();
    let abort = RecordFilter::new("SELECT * FROM {team} WHERE {name} > 3").unwrap();
    assert!(matches!(
        abort.filter("team", &data).unwrap_err(),
        QueryError::TypeMismatch { .. }
    ));

    let skip = RecordFilter::with_config(
        "SELECT * FROM {team} WHERE {name} > 3",
        FilterConfig::default().with_missing_reference(MissingReferencePolicy::Skip),
    )
    .unwrap();
    assert!(skip.filter("team", &data).unwrap().is_empty());
}

#[test]
fn test_text_ordering() {
    let config = FilterConfig::default().with_text_ordering(true);
    let filter =
        RecordFilter::with_config("SELECT {name} FROM {team} WHERE {name} < 'D'", config).unwrap();
    let result = filter.filter("team", &sales_team()).unwrap();
    assert_eq!(names(&result), vec!["Adam", "Bob", "Charles"]);
}

#[test]
fn test_parallel_matches_sequential() {
    let data: Vec<Record> = (0..2_000)
        .map(|i| into_record(json!({"id": i, "bucket": i % 7, "label": format!("r{i}")})).unwrap())
        .collect();
    let filter = RecordFilter::new(
        "SELECT {id}, {label} FROM {rows} WHERE {bucket} = 3 OR ({id} > 1500 AND {bucket} <> 0)",
    )
    .unwrap();

    let sequential = filter.filter("rows", &data).unwrap();
    let parallel = filter.filter_par("rows", &data).unwrap();
    assert!(!sequential.is_empty());
    assert_eq!(sequential, parallel);
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dictql.json");
    std::fs::write(&path, r#"{"missing_reference": "skip"}"#).unwrap();

    let config = FilterConfig::load(&path).unwrap();
    let filter = RecordFilter::with_config("SELECT {missing} FROM {team}", config).unwrap();
    assert!(filter.filter("team", &sales_team()).unwrap().is_empty());
}

#[test]
fn test_filter_shared_across_threads() {
    let filter = std::sync::Arc::new(
        RecordFilter::new("SELECT {name} FROM {team} WHERE {sales} > 400").unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let filter = filter.clone();
            std::thread::spawn(move || filter.filter("team", &sales_team()).unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
