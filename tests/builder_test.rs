//! Tests for building entity trees from Collection archives

mod common;

use rstest::rstest;

use gridcheck::domain::{parse_collection, DomainError, Item, Tier};
use gridcheck::util::testing;

use common::{collection, interval_tier, point_tier, reference_archive, textgrid};

#[test]
fn given_reference_archive_when_building_then_tree_matches_text() {
    testing::init_test_setup();
    // Arrange
    let text = reference_archive();

    // Act
    let built = parse_collection(&text).unwrap();

    // Assert
    assert_eq!(built.size, 1);
    let tg = built.textgrid("T1").expect("TextGrid T1");
    assert_eq!(tg.tiers.len(), 3);
    assert_eq!(tg.total_time(), 10.0);

    let segment = tg.interval_tier("Segment").expect("Segment tier");
    assert_eq!(segment.texts().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    assert_eq!(segment.labels[1].start, 1.0);
    assert_eq!(segment.labels[1].end, 2.0);

    let formants = tg.text_tier("Formants").expect("Formants tier");
    assert_eq!(formants.labels[0].time, 0.5);
    assert_eq!(formants.labels[0].text, "F1 = 700");
    assert!(tg.text_tier("Formants-error-bound").unwrap().is_error_bound());
}

#[test]
fn given_same_text_when_building_twice_then_trees_equal() {
    let text = reference_archive();

    let first = parse_collection(&text).unwrap();
    let second = parse_collection(&text).unwrap();

    assert_eq!(first, second);
}

#[test]
fn given_crlf_line_endings_when_building_then_same_tree() {
    let text = reference_archive();
    let crlf = text.replace('\n', "\r\n");

    assert_eq!(parse_collection(&crlf).unwrap(), parse_collection(&text).unwrap());
}

#[test]
fn given_multiline_text_when_building_then_lines_joined() {
    // Arrange
    let text = collection(vec![textgrid(
        "T1",
        vec![interval_tier("Words", &[(0.0, 1.0, "say \"hi\"")])],
    )])
    .replace("text = \"say \"\"hi\"\"\"", "text = \"first\nsecond\"");

    // Act
    let built = parse_collection(&text).unwrap();

    // Assert
    let words = built.textgrid("T1").unwrap().interval_tier("Words").unwrap();
    assert_eq!(words.labels[0].text, "first\nsecond");
}

#[test]
fn given_escaped_quote_when_building_then_unescaped() {
    let text = collection(vec![textgrid(
        "T1",
        vec![interval_tier("Words", &[(0.0, 1.0, "say \"hi\"")])],
    )]);

    let built = parse_collection(&text).unwrap();

    let words = built.textgrid("T1").unwrap().interval_tier("Words").unwrap();
    assert_eq!(words.labels[0].text, "say \"hi\"");
}

#[test]
fn given_textgrids_with_nested_items_when_building_then_items_split_at_top_level() {
    let text = collection(vec![
        textgrid("T1", vec![interval_tier("A", &[(0.0, 1.0, "x")])]),
        textgrid(
            "T2",
            vec![
                interval_tier("B", &[(0.0, 1.0, "y")]),
                point_tier("C", &[(0.5, "p")]),
            ],
        ),
    ]);

    let built = parse_collection(&text).unwrap();

    let names: Vec<&str> = built.items.iter().map(Item::name).collect();
    assert_eq!(names, vec!["T1", "T2"]);
    let t2 = built.textgrid("T2").unwrap();
    assert!(matches!(t2.tiers[1], Tier::Text(_)));
}

#[rstest]
#[case("size = 1\nitem []:", "size = 2\nitem []:", "items in collection")]
#[case("        size = 2\n", "        size = 3\n", "tiers in TextGrid \"T1\"")]
#[case("intervals: size = 2", "intervals: size = 5", "intervals in tier \"Segment\"")]
#[case("points: size = 1", "points: size = 4", "points in tier \"Formants\"")]
fn test_declared_size_mismatch(#[case] from: &str, #[case] to: &str, #[case] entity: &str) {
    // Arrange
    let text = collection(vec![textgrid(
        "T1",
        vec![
            interval_tier("Segment", &[(0.0, 1.0, "a"), (1.0, 2.0, "b")]),
            point_tier("Formants", &[(0.5, "F1 = 700")]),
        ],
    )]);
    let broken = text.replacen(from, to, 1);
    assert_ne!(broken, text, "fixture replacement must apply");

    // Act
    let err = parse_collection(&broken).unwrap_err();

    // Assert
    match err {
        DomainError::CountMismatch { entity: got, .. } => assert_eq!(got, entity),
        other => panic!("expected CountMismatch, got {other:?}"),
    }
}

#[test]
fn given_unknown_tier_class_when_building_then_unsupported_tier_type() {
    let text = reference_archive().replacen("\"TextTier\"", "\"PitchTier\"", 1);

    let err = parse_collection(&text).unwrap_err();

    assert!(matches!(
        err,
        DomainError::UnsupportedTierType { ref tag, .. } if tag == "PitchTier"
    ));
}

#[test]
fn given_non_collection_object_when_building_then_unsupported_file_type() {
    let text = reference_archive().replace("\"Collection\"", "\"TextGrid\"");

    let err = parse_collection(&text).unwrap_err();

    assert!(matches!(err, DomainError::UnsupportedFileType(_)));
}

#[test]
fn given_interval_missing_text_when_building_then_malformed_block() {
    let text = collection(vec![textgrid(
        "T1",
        vec![interval_tier("Segment", &[(0.0, 1.0, "a")])],
    )])
    .replace("text = \"a\"", "label = \"a\"");

    let err = parse_collection(&text).unwrap_err();

    assert!(matches!(err, DomainError::MalformedBlock { .. }));
}

#[test]
fn given_non_numeric_bound_when_building_then_invalid_value() {
    let text = collection(vec![textgrid(
        "T1",
        vec![interval_tier("Segment", &[(0.0, 1.0, "a")])],
    )])
    .replacen("xmin = 0", "xmin = zero", 1);

    let err = parse_collection(&text);

    assert!(
        matches!(err, Err(DomainError::InvalidValue { .. })),
        "got {err:?}"
    );
}
