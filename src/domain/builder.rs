//! Builds the typed entity tree from archive text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use crate::domain::entities::{
    Collection, Interval, IntervalTier, Item, Point, Sound, TextGrid, TextTier, Tier,
    INTERVAL_TIER_CLASS, SOUND_CLASS, TEXTGRID_CLASS, TEXT_TIER_CLASS,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::grammar::{
    extract_fields, parse_float, split_blocks, Block, FieldSpec, Source, INTERVAL_HEADER,
    ITEM_HEADER, POINT_HEADER,
};

/// Family prefix of the supported text serialization.
pub const FILE_TYPE_FAMILY: &str = "ooTextFile";
pub const COLLECTION_CLASS: &str = "Collection";

const ARCHIVE_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("file type", &["File type"]),
    FieldSpec::text("object class", &["Object class"]),
];

const COLLECTION_FIELDS: &[FieldSpec] = &[FieldSpec::count("size", &["size"])];

const CLASS_FIELD: &[FieldSpec] = &[FieldSpec::text("class", &["class"])];

const TEXTGRID_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("class", &["class"]),
    FieldSpec::text("name", &["name"]),
    FieldSpec::float("xmin", &["xmin"]),
    FieldSpec::float("xmax", &["xmax"]),
    FieldSpec::marker("tiers", "tiers? <exists>"),
    FieldSpec::count("size", &["size"]),
];

const TIER_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("class", &["class"]),
    FieldSpec::text("name", &["name"]),
    FieldSpec::float("xmin", &["xmin"]),
    FieldSpec::float("xmax", &["xmax"]),
    FieldSpec::qualified_count("size", "size"),
];

const INTERVAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::float("xmin", &["xmin"]),
    FieldSpec::float("xmax", &["xmax"]),
    FieldSpec::text("text", &["text"]),
];

const POINT_FIELDS: &[FieldSpec] = &[
    FieldSpec::float("time", &["number", "time"]),
    FieldSpec::text("mark", &["mark", "text"]),
];

const SOUND_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("class", &["class"]),
    FieldSpec::text("name", &["name"]),
    FieldSpec::float("xmin", &["xmin"]),
    FieldSpec::float("xmax", &["xmax"]),
    FieldSpec::count("nx", &["nx"]),
    FieldSpec::float("dx", &["dx"]),
    FieldSpec::float("x1", &["x1"]),
    FieldSpec::float("ymin", &["ymin"]),
    FieldSpec::float("ymax", &["ymax"]),
    FieldSpec::count("ny", &["ny"]),
    FieldSpec::float("dy", &["dy"]),
    FieldSpec::float("y1", &["y1"]),
];

static SAMPLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*z \[(?P<row>\d+)\] \[(?P<col>\d+)\] = (?P<value>\S+)\s*$")
        .expect("sample regex")
});

/// Parse one archive text into a [`Collection`].
///
/// Any structural violation aborts the build; no partial tree is returned.
pub fn parse_collection(text: &str) -> DomainResult<Collection> {
    CollectionBuilder::new(text).build()
}

/// Constructs a [`Collection`] tree from a single archive text.
pub struct CollectionBuilder<'a> {
    source: Source<'a>,
}

impl<'a> CollectionBuilder<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            source: Source::new(text),
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn build(&self) -> DomainResult<Collection> {
        let block = self.source.block();
        let body = check_archive_header(block)?;

        let fields = extract_fields(body, COLLECTION_FIELDS, "collection size")?;
        let size = fields.count("size")?;

        let items = split_blocks(fields.body, ITEM_HEADER)
            .into_iter()
            .map(build_item)
            .collect::<DomainResult<Vec<_>>>()?;

        check_count("items in collection".to_string(), size, items.len())?;
        debug!(items = items.len(), "built collection");
        Ok(Collection { size, items })
    }
}

/// Validates `File type` and `Object class`, returning the rest of the text.
fn check_archive_header(block: Block<'_>) -> DomainResult<Block<'_>> {
    let fields = extract_fields(block, ARCHIVE_FIELDS, "archive header").map_err(|_| {
        let first = block
            .lines()
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
            .unwrap_or("<empty>");
        DomainError::UnsupportedFileType(first.to_string())
    })?;

    let file_type = fields.text("file type")?;
    if !file_type.starts_with(FILE_TYPE_FAMILY) {
        return Err(DomainError::UnsupportedFileType(file_type));
    }
    let class = fields.text("object class")?;
    if class != COLLECTION_CLASS {
        return Err(DomainError::UnsupportedFileType(format!(
            "{file_type} {class}"
        )));
    }
    Ok(fields.body)
}

fn check_count(entity: String, declared: usize, actual: usize) -> DomainResult<()> {
    if declared == actual {
        Ok(())
    } else {
        Err(DomainError::CountMismatch {
            entity,
            declared,
            actual,
        })
    }
}

fn build_item(block: Block<'_>) -> DomainResult<Item> {
    let class = extract_fields(block, CLASS_FIELD, "item class")?;
    let tag = class.text("class")?;
    let item = match tag.as_str() {
        TEXTGRID_CLASS => Item::TextGrid(build_textgrid(block)?),
        SOUND_CLASS => Item::Sound(build_sound(block)?),
        _ => {
            return Err(DomainError::UnsupportedItemType {
                tag,
                line: class.line("class")?,
            })
        }
    };
    debug!(item = %item.name(), class = item.class_tag(), "built item");
    Ok(item)
}

fn build_textgrid(block: Block<'_>) -> DomainResult<TextGrid> {
    let fields = extract_fields(block, TEXTGRID_FIELDS, "TextGrid header")?;
    let name = fields.text("name")?.trim().to_string();
    let declared_tiers = fields.count("size")?;

    let tiers = split_blocks(fields.body, ITEM_HEADER)
        .into_iter()
        .map(build_tier)
        .collect::<DomainResult<Vec<_>>>()?;

    check_count(
        format!("tiers in TextGrid \"{name}\""),
        declared_tiers,
        tiers.len(),
    )?;
    debug!(textgrid = %name, tiers = tiers.len(), "built TextGrid");

    Ok(TextGrid {
        name,
        xmin: fields.float("xmin")?,
        xmax: fields.float("xmax")?,
        declared_tiers,
        tiers,
    })
}

enum TierKind {
    Interval,
    Text,
}

fn build_tier(block: Block<'_>) -> DomainResult<Tier> {
    let class = extract_fields(block, CLASS_FIELD, "tier class")?;
    let tag = class.text("class")?;
    let kind = match tag.as_str() {
        INTERVAL_TIER_CLASS => TierKind::Interval,
        TEXT_TIER_CLASS => TierKind::Text,
        _ => {
            return Err(DomainError::UnsupportedTierType {
                tag,
                line: class.line("class")?,
            })
        }
    };

    let fields = extract_fields(block, TIER_FIELDS, "tier header")?;
    let name = fields.text("name")?.trim().to_string();
    let xmin = fields.float("xmin")?;
    let xmax = fields.float("xmax")?;
    let declared_labels = fields.count("size")?;

    let tier = match kind {
        TierKind::Interval => {
            let labels = split_blocks(fields.body, INTERVAL_HEADER)
                .into_iter()
                .map(build_interval)
                .collect::<DomainResult<Vec<_>>>()?;
            check_count(
                format!("intervals in tier \"{name}\""),
                declared_labels,
                labels.len(),
            )?;
            Tier::Interval(IntervalTier {
                name,
                xmin,
                xmax,
                declared_labels,
                labels,
            })
        }
        TierKind::Text => {
            let labels = split_blocks(fields.body, POINT_HEADER)
                .into_iter()
                .map(build_point)
                .collect::<DomainResult<Vec<_>>>()?;
            check_count(
                format!("points in tier \"{name}\""),
                declared_labels,
                labels.len(),
            )?;
            Tier::Text(TextTier {
                name,
                xmin,
                xmax,
                declared_labels,
                labels,
            })
        }
    };
    debug!(tier = %tier.name(), class = tier.class_tag(), labels = tier.len(), "built tier");
    Ok(tier)
}

fn build_interval(block: Block<'_>) -> DomainResult<Interval> {
    let fields = extract_fields(block, INTERVAL_FIELDS, "interval (xmin, xmax, text)")?;
    Ok(Interval {
        start: fields.float("xmin")?,
        end: fields.float("xmax")?,
        text: fields.text("text")?.trim().to_string(),
    })
}

fn build_point(block: Block<'_>) -> DomainResult<Point> {
    let fields = extract_fields(block, POINT_FIELDS, "point (number, mark)")?;
    Ok(Point {
        time: fields.float("time")?,
        text: fields.text("mark")?.trim().to_string(),
    })
}

fn build_sound(block: Block<'_>) -> DomainResult<Sound> {
    let fields = extract_fields(block, SOUND_FIELDS, "Sound header")?;
    let nx = fields.count("nx")?;
    let ny = fields.count("ny")?;
    let body = fields.body;

    // every cell is written on its own line, so the body bounds the matrix
    let cells = nx.checked_mul(ny).filter(|&n| n <= body.len());
    if cells.is_none() {
        return Err(DomainError::InvalidValue {
            field: "nx".to_string(),
            value: format!("{nx} (with ny = {ny}, {} sample lines)", body.len()),
            line: fields.line("nx")?,
        });
    }
    let mut z = vec![vec![0.0; nx]; ny];

    for (idx, line) in body.lines().iter().enumerate() {
        let Some(caps) = SAMPLE_LINE.captures(line) else {
            continue;
        };
        let line_no = body.line_no(idx);
        let invalid = |field: &str, value: &str| DomainError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            line: line_no,
        };
        let row_str = &caps["row"];
        let col_str = &caps["col"];
        let value_str = &caps["value"];
        let row: usize = row_str.parse().map_err(|_| invalid("z row", row_str))?;
        let col: usize = col_str.parse().map_err(|_| invalid("z column", col_str))?;
        let value = parse_float(value_str).ok_or_else(|| invalid("z", value_str))?;

        if row == 0 || row > ny || col == 0 || col > nx {
            return Err(DomainError::IndexOutOfRange {
                row,
                col,
                rows: ny,
                cols: nx,
                line: line_no,
            });
        }
        z[row - 1][col - 1] = value;
    }

    Ok(Sound {
        name: fields.text("name")?.trim().to_string(),
        xmin: fields.float("xmin")?,
        xmax: fields.float("xmax")?,
        nx,
        dx: fields.float("dx")?,
        x1: fields.float("x1")?,
        ymin: fields.float("ymin")?,
        ymax: fields.float("ymax")?,
        ny,
        dy: fields.float("dy")?,
        y1: fields.float("y1")?,
        z,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOUND_ARCHIVE: &str = r#"File type = "ooTextFile"
Object class = "Collection"

size = 1
item []:
    item [1]:
        class = "Sound 2"
        name = "vowel"
        xmin = 0
        xmax = 0.002
        nx = 2
        dx = 0.001
        x1 = 0.0005
        ymin = 1
        ymax = 1
        ny = 1
        dy = 1
        y1 = 1
        z [] []:
            z [1]:
                z [1] [1] = 0.25
                z [1] [2] = -1.5e-2
"#;

    #[test]
    fn given_sound_item_when_building_then_matrix_is_zero_based() {
        let collection = parse_collection(SOUND_ARCHIVE).unwrap();

        let Item::Sound(sound) = &collection.items[0] else {
            panic!("expected sound item");
        };
        assert_eq!(sound.name, "vowel");
        assert_eq!((sound.ny, sound.nx), (1, 2));
        assert_eq!(sound.sample(0, 0), Some(0.25));
        assert_eq!(sound.sample(0, 1), Some(-0.015));
        assert_eq!(sound.sample(1, 0), None);
    }

    #[test]
    fn given_sample_outside_matrix_when_building_then_index_out_of_range() {
        let text = SOUND_ARCHIVE.replace("z [1] [2] = -1.5e-2", "z [2] [1] = 3");

        let err = parse_collection(&text).unwrap_err();

        assert_eq!(
            err,
            DomainError::IndexOutOfRange {
                row: 2,
                col: 1,
                rows: 1,
                cols: 2,
                line: 22
            }
        );
    }

    #[test]
    fn given_huge_declared_matrix_when_building_then_invalid_value() {
        let overflowing = SOUND_ARCHIVE.replace("nx = 2", "nx = 18446744073709551615");
        let oversized = SOUND_ARCHIVE.replace("ny = 1", "ny = 10000000000");

        for text in [overflowing, oversized] {
            let err = parse_collection(&text).unwrap_err();
            assert!(
                matches!(
                    err,
                    DomainError::InvalidValue { ref field, line: 11, .. } if field == "nx"
                ),
                "got {err:?}"
            );
        }
    }

    #[test]
    fn given_unknown_item_class_when_building_then_unsupported_item_type() {
        let text = SOUND_ARCHIVE.replace("\"Sound 2\"", "\"Pitch 1\"");

        let err = parse_collection(&text).unwrap_err();

        assert_eq!(
            err,
            DomainError::UnsupportedItemType {
                tag: "Pitch 1".into(),
                line: 7
            }
        );
    }

    #[test]
    fn given_binary_file_type_when_building_then_unsupported_file_type() {
        let text = SOUND_ARCHIVE.replace("\"ooTextFile\"", "\"ooBinaryFile\"");

        let err = parse_collection(&text).unwrap_err();

        assert_eq!(err, DomainError::UnsupportedFileType("ooBinaryFile".into()));
    }

    #[test]
    fn given_text_without_header_when_building_then_unsupported_file_type() {
        let err = parse_collection("\n\nhello\n").unwrap_err();

        assert_eq!(err, DomainError::UnsupportedFileType("hello".into()));
    }
}
