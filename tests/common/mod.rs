//! Archive text fixtures shared by the integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

fn indent(lines: Vec<String>, by: usize) -> Vec<String> {
    let pad = " ".repeat(by);
    lines.into_iter().map(|l| format!("{pad}{l}")).collect()
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Body lines of an IntervalTier (no `item [n]:` header).
pub fn interval_tier(name: &str, labels: &[(f64, f64, &str)]) -> Vec<String> {
    let xmax = labels.last().map(|l| l.1).unwrap_or(1.0);
    let mut out = vec![
        "class = \"IntervalTier\"".to_string(),
        format!("name = {}", quote(name)),
        "xmin = 0".to_string(),
        format!("xmax = {xmax}"),
        format!("intervals: size = {}", labels.len()),
    ];
    for (i, (start, end, text)) in labels.iter().enumerate() {
        out.push(format!("intervals [{}]:", i + 1));
        out.extend(indent(
            vec![
                format!("xmin = {start}"),
                format!("xmax = {end}"),
                format!("text = {}", quote(text)),
            ],
            4,
        ));
    }
    out
}

/// Body lines of a TextTier (point tier).
pub fn point_tier(name: &str, points: &[(f64, &str)]) -> Vec<String> {
    let mut out = vec![
        "class = \"TextTier\"".to_string(),
        format!("name = {}", quote(name)),
        "xmin = 0".to_string(),
        "xmax = 10".to_string(),
        format!("points: size = {}", points.len()),
    ];
    for (i, (time, mark)) in points.iter().enumerate() {
        out.push(format!("points [{}]:", i + 1));
        out.extend(indent(
            vec![format!("number = {time}"), format!("mark = {}", quote(mark))],
            4,
        ));
    }
    out
}

/// Body lines of a TextGrid item holding `tiers`.
pub fn textgrid(name: &str, tiers: Vec<Vec<String>>) -> Vec<String> {
    let mut out = vec![
        "class = \"TextGrid\"".to_string(),
        format!("name = {}", quote(name)),
        "xmin = 0".to_string(),
        "xmax = 10".to_string(),
        "tiers? <exists>".to_string(),
        format!("size = {}", tiers.len()),
        "item []:".to_string(),
    ];
    for (i, tier) in tiers.into_iter().enumerate() {
        out.push(format!("    item [{}]:", i + 1));
        out.extend(indent(tier, 8));
    }
    out
}

/// Body lines of a one-channel, two-sample Sound item.
pub fn sound(name: &str) -> Vec<String> {
    let mut out = vec![
        "class = \"Sound 2\"".to_string(),
        format!("name = {}", quote(name)),
        "xmin = 0".to_string(),
        "xmax = 0.002".to_string(),
        "nx = 2".to_string(),
        "dx = 0.001".to_string(),
        "x1 = 0.0005".to_string(),
        "ymin = 1".to_string(),
        "ymax = 1".to_string(),
        "ny = 1".to_string(),
        "dy = 1".to_string(),
        "y1 = 1".to_string(),
        "z [] []:".to_string(),
    ];
    out.push("    z [1]:".to_string());
    out.extend(indent(
        vec!["z [1] [1] = 0.25".to_string(), "z [1] [2] = 0".to_string()],
        8,
    ));
    out
}

/// Full archive text for a Collection of `items`.
pub fn collection(items: Vec<Vec<String>>) -> String {
    let mut out = vec![
        "File type = \"ooTextFile\"".to_string(),
        "Object class = \"Collection\"".to_string(),
        String::new(),
        format!("size = {}", items.len()),
        "item []:".to_string(),
    ];
    for (i, item) in items.into_iter().enumerate() {
        out.push(format!("    item [{}]:", i + 1));
        out.extend(indent(item, 8));
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Reference used across tests: TextGrid "T1" with a three-label "Segment"
/// tier, a point tier "Formants" and its error-bound companion.
pub fn reference_archive() -> String {
    collection(vec![textgrid(
        "T1",
        vec![
            interval_tier("Segment", &[(0.0, 1.0, "a"), (1.0, 2.0, "b"), (2.0, 3.0, "c")]),
            point_tier("Formants", &[(0.5, "F1 = 700"), (1.5, "F2 = 1200")]),
            point_tier("Formants-error-bound", &[(0.5, "50"), (1.5, "80")]),
        ],
    )])
}

/// A submission matching [`reference_archive`] structurally, with other
/// timings and point values.
pub fn matching_submission() -> String {
    collection(vec![textgrid(
        "T1",
        vec![
            interval_tier("Segment", &[(0.0, 0.8, "a"), (0.8, 2.2, "b"), (2.2, 3.1, "c")]),
            point_tier("Formants", &[(0.4, "F1 = 650"), (1.6, "F2 = 1300")]),
        ],
    )])
}

pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write fixture file");
    path
}
