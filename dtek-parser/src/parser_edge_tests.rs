//! Parser edge case and error handling tests.
//!
//! These tests feed malformed, partial, or hostile upstream content through
//! the extraction pipeline.

#[cfg(test)]
mod script_edge_tests {
    use crate::script::{Assignment, find_assignment, find_in_script};
    use dtek_core::{DtekError, ParseKind};
    use serde_json::json;

    const STREETS: Assignment<'static> = Assignment::new("DisconSchedule", "streets");

    // ========================================================================
    // Assignment Matching
    // ========================================================================

    #[test]
    fn test_first_assignment_wins() {
        let src = r#"DisconSchedule.streets = {"a": []}; DisconSchedule.streets = {"b": []};"#;
        let value = find_in_script(src, STREETS).unwrap().unwrap();
        assert_eq!(value, json!({ "a": [] }));
    }

    #[test]
    fn test_computed_member_is_not_matched() {
        let src = r#"DisconSchedule["streets"] = {"a": []};"#;
        assert_eq!(find_in_script(src, STREETS).unwrap(), None);
    }

    #[test]
    fn test_compound_assignment_inside_expression() {
        let src = r#"var x = (DisconSchedule.streets = {"a": ["b"]});"#;
        let value = find_in_script(src, STREETS).unwrap().unwrap();
        assert_eq!(value["a"][0], json!("b"));
    }

    #[test]
    fn test_assignment_inside_function_body() {
        let src = r#"
            function boot() {
                if (true) { DisconSchedule.streets = {"a": []}; }
            }
        "#;
        assert!(find_in_script(src, STREETS).unwrap().is_some());
    }

    #[test]
    fn test_needle_in_comment_only() {
        let scripts = ["// DisconSchedule.streets is set later\nvar a = 1;"];
        assert_eq!(find_assignment(&scripts, STREETS).unwrap(), None);
    }

    #[test]
    fn test_good_block_after_broken_block() {
        let scripts = [
            "DisconSchedule.streets = {",
            r#"DisconSchedule.streets = {"ok": []};"#,
        ];
        let value = find_assignment(&scripts, STREETS).unwrap().unwrap();
        assert_eq!(value, json!({ "ok": [] }));
    }

    #[test]
    fn test_literal_error_is_not_masked_by_later_blocks() {
        let scripts = [
            "DisconSchedule.streets = window.cache;",
            r#"DisconSchedule.streets = {"ok": []};"#,
        ];
        let err = find_assignment(&scripts, STREETS).unwrap_err();
        assert!(matches!(err, DtekError::Parse { kind: ParseKind::Literal, .. }));
    }
}

#[cfg(test)]
mod literal_edge_tests {
    use crate::script::{Assignment, find_in_script};
    use dtek_core::{DtekError, ParseKind};
    use serde_json::json;

    const FACT: Assignment<'static> = Assignment::new("DisconSchedule", "fact");

    fn eval(rhs: &str) -> Result<serde_json::Value, DtekError> {
        find_in_script(&format!("DisconSchedule.fact = {rhs};"), FACT).map(Option::unwrap)
    }

    // ========================================================================
    // Accepted Shapes
    // ========================================================================

    #[test]
    fn test_escaped_strings() {
        assert_eq!(eval(r#""вул.""#).unwrap(), json!("вул."));
        assert_eq!(eval(r#""a\"b""#).unwrap(), json!("a\"b"));
    }

    #[test]
    fn test_numeric_keys_and_trailing_commas() {
        let value = eval(r#"{1: "yes", "2": "no", 'three': [1, 2,],}"#).unwrap();
        assert_eq!(value, json!({ "1": "yes", "2": "no", "three": [1, 2] }));
    }

    #[test]
    fn test_key_order_is_preserved() {
        let value = eval(r#"{"b": 1, "a": 2, "c": 3}"#).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_large_and_fractional_numbers() {
        assert_eq!(eval("1760821200").unwrap(), json!(1_760_821_200_i64));
        assert_eq!(eval("0.5").unwrap(), json!(0.5));
        assert_eq!(eval("1e21").unwrap(), json!(1e21));
    }

    #[test]
    fn test_parenthesized_values_in_scripts() {
        assert_eq!(eval("-(1)").unwrap(), json!(-1));
        assert_eq!(eval(r#"({"a": (2)})"#).unwrap(), json!({ "a": 2 }));
    }

    // ========================================================================
    // Rejected Shapes
    // ========================================================================

    #[test]
    fn test_iife_is_rejected() {
        let err = eval("(function () { return {}; })()").unwrap_err();
        assert!(matches!(err, DtekError::Parse { kind: ParseKind::Literal, .. }));
    }

    #[test]
    fn test_nested_call_in_array_is_rejected() {
        let err = eval(r#"{"data": [1, 2, eval("3")]}"#).unwrap_err();
        assert!(err.to_string().contains("CallExpression"));
    }

    #[test]
    fn test_infinity_identifier_is_rejected() {
        assert!(eval("Infinity").is_err());
        assert!(eval("-Infinity").is_err());
    }

    #[test]
    fn test_pathological_nesting_is_bounded() {
        let depth = 200;
        let src = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        assert!(eval(&src).is_err());
    }
}

#[cfg(test)]
mod directory_edge_tests {
    use crate::parse_directory;
    use dtek_core::{DtekError, ParseKind, Region};

    fn page(token: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html><head><meta charset="utf-8">{token}</head><body>{body}</body></html>"#
        )
    }

    // ========================================================================
    // Token Edge Cases
    // ========================================================================

    #[test]
    fn test_empty_document() {
        let err = parse_directory("", Some(Region::Krem)).unwrap_err();
        assert!(matches!(err, DtekError::Parse { kind: ParseKind::Html, .. }));
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let html = page(r#"<meta name="csrf-token" content="">"#, "");
        let err = parse_directory(&html, None).unwrap_err();
        assert!(matches!(err, DtekError::Parse { kind: ParseKind::Html, .. }));
    }

    #[test]
    fn test_challenge_platform_marker() {
        let html = page(
            "",
            r#"<script src="/cdn-cgi/challenge-platform/h/b/orchestrate/jsch/v1"></script>"#,
        );
        let err = parse_directory(&html, Some(Region::Dnem)).unwrap_err();
        assert_eq!(err.status_code(), 503);
        assert!(matches!(err, DtekError::RegionUnavailable { region: Some(Region::Dnem) }));
    }

    #[test]
    fn test_token_wins_over_marker() {
        // A real page may still reference the protection script.
        let html = page(
            r#"<meta name="csrf-token" content="t">"#,
            r#"<script src="/_Incapsula_Resource?x=1"></script>
               <script>DisconSchedule.streets = {"a": ["b"]};
               DisconSchedule.fact = {"update": "u"};</script>"#,
        );
        assert!(parse_directory(&html, None).is_ok());
    }

    // ========================================================================
    // Snapshot Edge Cases
    // ========================================================================

    #[test]
    fn test_duplicate_location_keys_collapse() {
        let html = page(
            r#"<meta name="csrf-token" content="t">"#,
            r#"<script>DisconSchedule.streets = {"a": ["x"], "a": ["y"]};
               DisconSchedule.fact = {"update": "u"};</script>"#,
        );
        let snapshot = parse_directory(&html, None).unwrap();
        assert_eq!(snapshot.locations, vec!["a"]);
        assert_eq!(snapshot.streets_of("a").unwrap(), ["y".to_string()]);
    }

    #[test]
    fn test_empty_directory_is_valid() {
        let html = page(
            r#"<meta name="csrf-token" content="t">"#,
            r#"<script>DisconSchedule.streets = {}; DisconSchedule.fact = {"update": ""};</script>"#,
        );
        let snapshot = parse_directory(&html, None).unwrap();
        assert!(snapshot.locations.is_empty());
        assert_eq!(snapshot.updated_at, "");
    }

    #[test]
    fn test_streets_not_an_object() {
        let html = page(
            r#"<meta name="csrf-token" content="t">"#,
            r#"<script>DisconSchedule.streets = ["a"]; DisconSchedule.fact = {"update": "u"};</script>"#,
        );
        let err = parse_directory(&html, None).unwrap_err();
        assert!(matches!(err, DtekError::Parse { kind: ParseKind::Schema, .. }));
    }
}
