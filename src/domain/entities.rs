//! Domain entities: the typed tree recovered from a Collection archive
//!
//! Trees are built once by [`crate::domain::builder`] and read-only afterwards.

use serde::Serialize;

pub const TEXTGRID_CLASS: &str = "TextGrid";
pub const SOUND_CLASS: &str = "Sound 2";
pub const INTERVAL_TIER_CLASS: &str = "IntervalTier";
pub const TEXT_TIER_CLASS: &str = "TextTier";

/// Name suffix of synthetic tolerance tiers, which are never graded.
pub const ERROR_BOUND_SUFFIX: &str = "-error-bound";

/// Root of an archive: an ordered list of TextGrid and Sound items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    /// Declared item count; equals `items.len()` for every built tree
    pub size: usize,
    pub items: Vec<Item>,
}

impl Collection {
    /// TextGrid items in document order.
    pub fn textgrids(&self) -> impl Iterator<Item = &TextGrid> {
        self.items.iter().filter_map(|item| match item {
            Item::TextGrid(tg) => Some(tg),
            Item::Sound(_) => None,
        })
    }

    /// First TextGrid with the given name.
    pub fn textgrid(&self, name: &str) -> Option<&TextGrid> {
        self.textgrids().find(|tg| tg.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Item {
    TextGrid(TextGrid),
    Sound(Sound),
}

impl Item {
    pub fn class_tag(&self) -> &'static str {
        match self {
            Item::TextGrid(_) => TEXTGRID_CLASS,
            Item::Sound(_) => SOUND_CLASS,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::TextGrid(tg) => &tg.name,
            Item::Sound(s) => &s.name,
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Item::TextGrid(tg) => (tg.xmin, tg.xmax),
            Item::Sound(s) => (s.xmin, s.xmax),
        }
    }
}

/// An annotation document made of ordered tiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextGrid {
    pub name: String,
    pub xmin: f64,
    pub xmax: f64,
    pub declared_tiers: usize,
    pub tiers: Vec<Tier>,
}

impl TextGrid {
    pub fn total_time(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// First tier with the given name, of either kind.
    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name() == name)
    }

    pub fn interval_tier(&self, name: &str) -> Option<&IntervalTier> {
        self.tiers.iter().find_map(|t| match t {
            Tier::Interval(it) if it.name == name => Some(it),
            _ => None,
        })
    }

    pub fn text_tier(&self, name: &str) -> Option<&TextTier> {
        self.tiers.iter().find_map(|t| match t {
            Tier::Text(tt) if tt.name == name => Some(tt),
            _ => None,
        })
    }
}

/// Sampled signal. Carried for completeness of the model; never compared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sound {
    pub name: String,
    pub xmin: f64,
    pub xmax: f64,
    pub nx: usize,
    pub dx: f64,
    pub x1: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub ny: usize,
    pub dy: f64,
    pub y1: f64,
    /// `ny` rows of `nx` samples, 0-based
    pub z: Vec<Vec<f64>>,
}

impl Sound {
    /// Sample at 0-based `(row, col)`.
    pub fn sample(&self, row: usize, col: usize) -> Option<f64> {
        self.z.get(row)?.get(col).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Tier {
    Interval(IntervalTier),
    Text(TextTier),
}

impl Tier {
    pub fn class_tag(&self) -> &'static str {
        match self {
            Tier::Interval(_) => INTERVAL_TIER_CLASS,
            Tier::Text(_) => TEXT_TIER_CLASS,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tier::Interval(t) => &t.name,
            Tier::Text(t) => &t.name,
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Tier::Interval(t) => (t.xmin, t.xmax),
            Tier::Text(t) => (t.xmin, t.xmax),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Tier::Interval(t) => t.labels.len(),
            Tier::Text(t) => t.labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same tier under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Tier {
        let mut tier = self.clone();
        match &mut tier {
            Tier::Interval(t) => t.name = name.into(),
            Tier::Text(t) => t.name = name.into(),
        }
        tier
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Interval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalTier {
    pub name: String,
    pub xmin: f64,
    pub xmax: f64,
    pub declared_labels: usize,
    pub labels: Vec<Interval>,
}

impl IntervalTier {
    /// Total duration of labelled speech.
    ///
    /// Intervals with empty text or text starting with `.` (non-speech
    /// marker) do not count.
    pub fn speech_time(&self) -> f64 {
        self.labels
            .iter()
            .filter(|l| {
                let text = l.text.trim();
                !text.is_empty() && !text.starts_with('.')
            })
            .map(Interval::duration)
            .sum()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub time: f64,
    pub text: String,
}

impl Point {
    /// Text before the first `=`, trimmed. Point marks are written as
    /// `name = value`; only the name part is graded structurally.
    pub fn prefix(&self) -> &str {
        self.text
            .split_once('=')
            .map_or(self.text.as_str(), |(head, _)| head)
            .trim()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextTier {
    pub name: String,
    pub xmin: f64,
    pub xmax: f64,
    pub declared_labels: usize,
    pub labels: Vec<Point>,
}

impl TextTier {
    /// Synthetic tolerance tier `<tier_name>-error-bound` holding `size`
    /// points that all carry `bound`.
    pub fn error_bound(tier_name: &str, size: usize, bound: f64) -> Self {
        Self {
            name: format!("{tier_name}{ERROR_BOUND_SUFFIX}"),
            xmin: 0.0,
            xmax: 0.0,
            declared_labels: size,
            labels: vec![
                Point {
                    time: 0.0,
                    text: bound.to_string(),
                };
                size
            ],
        }
    }

    pub fn is_error_bound(&self) -> bool {
        self.name.ends_with(ERROR_BOUND_SUFFIX)
    }

    /// Labels ordered by text; equal texts keep document order.
    pub fn sorted_labels(&self) -> Vec<&Point> {
        let mut labels: Vec<&Point> = self.labels.iter().collect();
        labels.sort_by(|a, b| a.text.cmp(&b.text));
        labels
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(Point::prefix)
    }
}
