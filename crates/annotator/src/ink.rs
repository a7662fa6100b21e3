//! Ink stroke model
//!
//! Strokes live in page-view space: origin at the top-left of the displayed
//! page, y downwards, in view units at zoom 1.

use chrono::{DateTime, Utc};
use page_geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// RGB color for ink (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Highlighter yellow
    pub fn yellow() -> Self {
        Self::rgb(1.0, 1.0, 0.0)
    }

    /// Parse `#RRGGBB`
    pub fn from_hex(hex: &str) -> Option<Self> {
        pdf_core::Color::from_hex(hex).map(Self::from)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for pdf_core::Color {
    fn from(c: Color) -> Self {
        pdf_core::Color::rgb(c.r as f32, c.g as f32, c.b as f32)
    }
}

impl From<pdf_core::Color> for Color {
    fn from(c: pdf_core::Color) -> Self {
        Self::rgb(c.r as f64, c.g as f64, c.b as f64)
    }
}

/// One sampled ink point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InkPoint {
    pub x: f64,
    pub y: f64,
    /// Pen pressure (0.0 - 1.0)
    #[serde(default = "default_pressure")]
    pub pressure: f32,
}

fn default_pressure() -> f32 {
    0.5
}

impl InkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pressure: default_pressure(),
        }
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure.clamp(0.0, 1.0);
        self
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<Point> for InkPoint {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

/// Drawing tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenKind {
    #[default]
    Pen,
    Highlighter,
}

/// How a stroke is drawn
///
/// Fields missing from JSON take the preset of the stroke's `kind`, so
/// `{"kind": "highlighter"}` reads as [`StrokeStyle::highlighter`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "StyleFields")]
pub struct StrokeStyle {
    pub color: Color,
    /// Width in view units
    pub width: f64,
    pub opacity: f64,
    pub kind: PenKind,
}

#[derive(Deserialize)]
struct StyleFields {
    color: Option<Color>,
    width: Option<f64>,
    opacity: Option<f64>,
    #[serde(default)]
    kind: PenKind,
}

impl From<StyleFields> for StrokeStyle {
    fn from(fields: StyleFields) -> Self {
        let preset = StrokeStyle::preset(fields.kind);
        Self {
            color: fields.color.unwrap_or(preset.color),
            width: fields.width.unwrap_or(preset.width),
            opacity: fields.opacity.unwrap_or(preset.opacity),
            kind: fields.kind,
        }
    }
}

impl StrokeStyle {
    /// Default style of a pen kind
    pub fn preset(kind: PenKind) -> Self {
        match kind {
            PenKind::Pen => Self::pen(),
            PenKind::Highlighter => Self::highlighter(),
        }
    }

    /// Opaque black ballpoint
    pub fn pen() -> Self {
        Self {
            color: Color::black(),
            width: 2.0,
            opacity: 1.0,
            kind: PenKind::Pen,
        }
    }

    /// Wide translucent yellow marker
    pub fn highlighter() -> Self {
        Self {
            color: Color::yellow(),
            width: 12.0,
            opacity: 0.5,
            kind: PenKind::Highlighter,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::pen()
    }
}

/// A single freehand stroke
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InkStroke {
    pub id: u64,
    pub points: Vec<InkPoint>,
    pub style: StrokeStyle,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl InkStroke {
    pub fn new(id: u64, points: Vec<InkPoint>, style: StrokeStyle) -> Self {
        Self {
            id,
            points,
            style,
            created: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding rectangle of the stroke's centre line (y grows downwards)
    pub fn bounds(&self) -> Option<Rect> {
        Rect::bounding(self.points.iter().map(InkPoint::to_point))
    }

    /// Move every point by `(dx, dy)`
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    /// True when the stroke passes within `radius` of `point`
    ///
    /// Half the stroke width is added to the radius.
    pub fn hit_test(&self, point: Point, radius: f64) -> bool {
        let reach = radius + self.style.width / 2.0;

        match self.points.as_slice() {
            [] => false,
            [only] => only.to_point().distance_to(&point) <= reach,
            points => points
                .windows(2)
                .any(|w| segment_distance(point, w[0].to_point(), w[1].to_point()) <= reach),
        }
    }

    /// Copy of the stroke with redundant points removed
    ///
    /// Ramer-Douglas-Peucker: points closer than `tolerance` to the line
    /// between retained neighbours are dropped. Endpoints are always kept.
    pub fn simplified(&self, tolerance: f64) -> InkStroke {
        let mut stroke = self.clone();
        stroke.points = simplify_points(&self.points, tolerance);
        stroke
    }
}

fn simplify_points(points: &[InkPoint], tolerance: f64) -> Vec<InkPoint> {
    if points.len() < 3 || tolerance <= 0.0 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut ranges = vec![(0, points.len() - 1)];
    while let Some((start, end)) = ranges.pop() {
        if end <= start + 1 {
            continue;
        }

        let a = points[start].to_point();
        let b = points[end].to_point();
        let (index, distance) = (start + 1..end)
            .map(|i| (i, segment_distance(points[i].to_point(), a, b)))
            .fold((start, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if distance > tolerance {
            keep[index] = true;
            ranges.push((start, index));
            ranges.push((index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Distance from `p` to the segment `a`-`b`
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(&a);
    }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}
