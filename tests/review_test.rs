//! Tests for grouping submitted tiers for instructor review

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use gridcheck::application::services::{ReviewService, REFERENCE_OWNER};
use gridcheck::application::ApplicationError;
use gridcheck::infrastructure::traits::RealFileSystem;

use common::{collection, interval_tier, reference_archive, textgrid, write_file};

fn submission(texts: &[&str]) -> String {
    let labels: Vec<(f64, f64, &str)> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| (i as f64, i as f64 + 1.0, *t))
        .collect();
    collection(vec![textgrid("T1", vec![interval_tier("Segment", &labels)])])
}

#[test]
fn given_submissions_on_disk_when_reviewing_then_grouped_with_reference() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let reference = write_file(&temp, "Lab1.Collection", &reference_archive());
    let files: Vec<_> = ["s1", "s2", "s3", "s4"]
        .iter()
        .map(|id| write_file(&temp, &format!("{id}_Lab1.Collection"), &submission(&[*id])))
        .collect();
    let service = ReviewService::new(Arc::new(RealFileSystem));

    // Act
    let groups = service
        .review(&reference, &files, "T1", "Segment", 3)
        .unwrap();

    // Assert
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].entries.len(), 4);
    assert_eq!(groups[1].entries.len(), 2);
    assert_eq!(groups[0].entries[0].owner, REFERENCE_OWNER);
    assert_eq!(groups[0].entries[0].tier.len(), 3);
    assert_eq!(groups[1].entries[1].owner, "s4");
    assert_eq!(groups[1].entries[1].tier.name(), "s4");
    assert_eq!(groups[0].file_stem("T1", "Segment"), "T1_Segment_1(2)");
}

#[test]
fn given_submission_without_tier_when_reviewing_then_skipped() {
    let temp = TempDir::new().unwrap();
    let reference = write_file(&temp, "Lab1.Collection", &reference_archive());
    let good = write_file(&temp, "s1_Lab1.Collection", &submission(&["a"]));
    let empty = write_file(
        &temp,
        "s2_Lab1.Collection",
        &collection(vec![textgrid("T1", vec![])]),
    );
    let broken = write_file(&temp, "s3_Lab1.Collection", "garbage");
    let service = ReviewService::new(Arc::new(RealFileSystem));

    let groups = service
        .review(&reference, &[good, empty, broken], "T1", "Segment", 3)
        .unwrap();

    assert_eq!(groups.len(), 1);
    let owners: Vec<&str> = groups[0].entries.iter().map(|e| e.owner.as_str()).collect();
    assert_eq!(owners, vec![REFERENCE_OWNER, "s1"]);
}

#[test]
fn given_no_submissions_when_reviewing_then_reference_only_group() {
    let temp = TempDir::new().unwrap();
    let reference = write_file(&temp, "Lab1.Collection", &reference_archive());
    let service = ReviewService::new(Arc::new(RealFileSystem));

    let groups = service.review(&reference, &[], "T1", "Segment", 3).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].entries.len(), 1);
    assert_eq!(groups[0].file_stem("T1", "Segment"), "T1_Segment_1(1)");
}

#[test]
fn given_tier_missing_in_reference_when_reviewing_then_invalid_input() {
    let temp = TempDir::new().unwrap();
    let reference = write_file(&temp, "Lab1.Collection", &reference_archive());
    let service = ReviewService::new(Arc::new(RealFileSystem));

    let err = service
        .review(&reference, &[], "T1", "Nope", 3)
        .unwrap_err();

    assert!(matches!(err, ApplicationError::InvalidInput(_)));
}
