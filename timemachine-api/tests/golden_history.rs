use std::fs;

use serde_json::Value;
use timemachine_api::{parse_results_str, parse_results_value, HistoryBatch};
use timemachine_core::TimeMachineConfig;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn news_page_matches_golden_tiles() {
    let body = fs::read_to_string(fixture_path("history_1969-07-20_newsItem.json"))
        .expect("Không đọc được phản hồi mẫu");

    let incidents = parse_results_str(&body).expect("Không đọc được incidents");
    let batch = HistoryBatch::new(incidents);

    let config = TimeMachineConfig {
        show_icons: true,
        ..TimeMachineConfig::default()
    };
    let actual = serde_json::to_value(batch.tiles(&config)).expect("Không serialize tiles");

    let expected = fs::read_to_string(fixture_path("history_1969-07-20_newsItem_tiles.json"))
        .expect("Không đọc được golden tiles");
    let expected: Value = serde_json::from_str(&expected).expect("Golden không hợp lệ");

    assert_eq!(actual, expected);
    assert_eq!(
        batch.attribution().as_deref(),
        Some("Source: Delpher,Beeld en Geluid")
    );
}

#[test]
fn value_and_string_parsing_agree() {
    let body = fs::read_to_string(fixture_path("history_1969-07-20_newsItem.json"))
        .expect("Không đọc được phản hồi mẫu");
    let value: Value = serde_json::from_str(&body).expect("JSON mẫu không hợp lệ");

    assert_eq!(
        parse_results_value(&value).expect("value"),
        parse_results_str(&body).expect("string")
    );
}

#[test]
fn malformed_body_is_a_parse_error() {
    let err = parse_results_str("<html>502</html>").unwrap_err();
    assert!(matches!(err, timemachine_api::ApiError::Parse(_)));

    let err = parse_results_value(&Value::String("oops".into())).unwrap_err();
    assert!(matches!(err, timemachine_api::ApiError::Parse(_)));
}
