/// Shared data structures for the application state
///
/// These structs mirror the JSON documents served by the track service and
/// flow unchanged from the API layer into the renderer.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier for runs and tracks.
///
/// The service emits integers, but nothing on this side does arithmetic with
/// them, so both JSON strings and numbers are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Identifier(text),
            Raw::Number(number) => Identifier(number.to_string()),
        })
    }
}

/// Source frame dimensions in pixels.
///
/// Either side may be missing or zero in the wild; that is a render
/// precondition, not a decode failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    #[serde(default)]
    pub w: Option<f64>,
    #[serde(default)]
    pub h: Option<f64>,
}

impl ImageSize {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w: Some(w), h: Some(h) }
    }

    /// Width and height, only when both are finite and positive
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        match (self.w, self.h) {
            (Some(w), Some(h)) if is_positive(w) && is_positive(h) => Some((w, h)),
            _ => None,
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// One bounding-box observation of a tracked object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Frame index within the run
    pub frame_ix: i64,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Point {
    /// Center of the bounding box in source pixels
    pub fn center(&self) -> (f64, f64) {
        ((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// A sampled sequence of observations for one object in one run.
///
/// Replaced wholesale on every load, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(alias = "run_id")]
    pub run_ix: Identifier,
    #[serde(alias = "track_id")]
    pub track_ix: Identifier,
    #[serde(default)]
    pub image: ImageSize,
    #[serde(default)]
    pub points: Vec<Point>,
}

/// Entry of the run listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(alias = "run_id")]
    pub run_ix: Identifier,
    #[serde(default)]
    pub frame_width: Option<u32>,
    #[serde(default)]
    pub frame_height: Option<u32>,
    #[serde(default)]
    pub started_at: Option<String>,
}

impl RunSummary {
    /// Text shown in the run selector
    pub fn label(&self) -> String {
        match self.started_at.as_deref() {
            Some(started) if !started.is_empty() => {
                format!("{} ({})", self.run_ix, format_started_at(started))
            }
            _ => self.run_ix.to_string(),
        }
    }
}

/// Normalise SQLite and RFC 3339 timestamps; anything else passes through.
fn format_started_at(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return parsed.format(DISPLAY).to_string();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.naive_local().format(DISPLAY).to_string();
    }
    raw.to_string()
}

/// Track identifiers belonging to one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackList {
    #[serde(alias = "run_id")]
    pub run_ix: Identifier,
    #[serde(alias = "track_ids")]
    pub track_ixs: Vec<Identifier>,
}
