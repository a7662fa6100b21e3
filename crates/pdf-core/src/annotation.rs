//! Ink annotations
//!
//! Builds and parses `/Subtype /Ink` annotation dictionaries and generates
//! their normal appearance streams.

use crate::{Color, PdfError, Result};
use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Object, StringFormat};
use page_geometry::{Point, Rect};
use std::io::Write;

/// Extra margin (points) around the stroked area in `/Rect`
const RECT_MARGIN: f64 = 1.0;

/// A freehand ink annotation in PDF user space
#[derive(Debug, Clone, PartialEq)]
pub struct InkAnnotation {
    /// One path per stroke (the `/InkList` entry)
    pub ink_list: Vec<Vec<Point>>,
    /// Stroke color
    pub color: Color,
    /// Stroke width in points
    pub width: f64,
    /// Constant opacity (0.0 - 1.0)
    pub opacity: f64,
    /// Annotation rectangle; computed from the strokes when `None`
    pub rect: Option<Rect>,
    /// Unique annotation name (`/NM`)
    pub name: Option<String>,
    /// Author (`/T`)
    pub author: Option<String>,
    /// Text contents (`/Contents`)
    pub contents: Option<String>,
    /// Modification date as a PDF date string (`/M`)
    pub modified: Option<String>,
}

impl InkAnnotation {
    /// Create an opaque black ink annotation, 1pt wide
    pub fn new(ink_list: Vec<Vec<Point>>) -> Self {
        Self {
            ink_list,
            color: Color::black(),
            width: 1.0,
            opacity: 1.0,
            rect: None,
            name: None,
            author: None,
            contents: None,
            modified: None,
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

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_contents(mut self, contents: impl Into<String>) -> Self {
        self.contents = Some(contents.into());
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(pdf_date(modified));
        self
    }

    /// Total number of points across all strokes
    pub fn point_count(&self) -> usize {
        self.ink_list.iter().map(Vec::len).sum()
    }

    /// True when this annotation was written by this crate
    pub fn is_own(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.starts_with(crate::ANNOTATION_NAME_PREFIX))
    }

    /// Rectangle covering every stroke, including the stroke width
    pub fn bounding_rect(&self) -> Option<Rect> {
        let rect = Rect::bounding(self.ink_list.iter().flatten().copied())?;
        Some(rect.inflate(self.width / 2.0 + RECT_MARGIN))
    }

    /// Validate before writing
    pub(crate) fn validate(&self) -> Result<()> {
        if self.ink_list.iter().all(Vec::is_empty) {
            return Err(PdfError::InvalidAnnotation(
                "ink annotation has no points".to_string(),
            ));
        }
        let finite = self
            .ink_list
            .iter()
            .flatten()
            .all(|p| p.x.is_finite() && p.y.is_finite());
        if !finite {
            return Err(PdfError::InvalidAnnotation(
                "ink annotation has non-finite coordinates".to_string(),
            ));
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(PdfError::InvalidAnnotation(format!(
                "invalid stroke width {}",
                self.width
            )));
        }
        Ok(())
    }

    /// Build the annotation dictionary (without `/AP` and `/P`)
    pub(crate) fn to_dictionary(&self, rect: Rect) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Annot".to_vec()));
        dict.set("Subtype", Object::Name(b"Ink".to_vec()));
        dict.set("Rect", rect_object(&rect));

        let ink_list = self
            .ink_list
            .iter()
            .filter(|stroke| !stroke.is_empty())
            .map(|stroke| {
                Object::Array(
                    stroke
                        .iter()
                        .flat_map(|p| [Object::Real(p.x as f32), Object::Real(p.y as f32)])
                        .collect(),
                )
            })
            .collect();
        dict.set("InkList", Object::Array(ink_list));

        dict.set(
            "C",
            Object::Array(vec![
                Object::Real(self.color.r),
                Object::Real(self.color.g),
                Object::Real(self.color.b),
            ]),
        );

        let mut border_style = Dictionary::new();
        border_style.set("Type", Object::Name(b"Border".to_vec()));
        border_style.set("W", Object::Real(self.width as f32));
        border_style.set("S", Object::Name(b"S".to_vec()));
        dict.set("BS", Object::Dictionary(border_style));

        if self.opacity < 1.0 {
            dict.set("CA", Object::Real(self.opacity.clamp(0.0, 1.0) as f32));
        }

        // Print flag
        dict.set("F", Object::Integer(4));

        if let Some(name) = &self.name {
            dict.set("NM", text_string_object(name));
        }
        if let Some(author) = &self.author {
            dict.set("T", text_string_object(author));
        }
        if let Some(contents) = &self.contents {
            dict.set("Contents", text_string_object(contents));
        }
        if let Some(modified) = &self.modified {
            dict.set(
                "M",
                Object::String(modified.as_bytes().to_vec(), StringFormat::Literal),
            );
        }

        dict
    }

    /// Parse an ink annotation dictionary
    ///
    /// `resolve` dereferences indirect objects found inside the dictionary.
    /// Returns `None` when the dictionary is not an ink annotation.
    pub(crate) fn from_dictionary<'a, F>(dict: &'a Dictionary, resolve: F) -> Result<Option<Self>>
    where
        F: Fn(&'a Object) -> Result<&'a Object>,
    {
        let subtype = match dict.get(b"Subtype") {
            Ok(obj) => resolve(obj)?.as_name().ok(),
            Err(_) => None,
        };
        if subtype != Some(b"Ink".as_slice()) {
            return Ok(None);
        }

        let ink_obj = dict
            .get(b"InkList")
            .map_err(|_| PdfError::ParseError("Ink annotation missing InkList".to_string()))?;
        let strokes = resolve(ink_obj)?
            .as_array()
            .map_err(|_| PdfError::ParseError("InkList is not an array".to_string()))?;

        let mut ink_list = Vec::with_capacity(strokes.len());
        for stroke in strokes {
            let coords = resolve(stroke)?
                .as_array()
                .map_err(|_| PdfError::ParseError("InkList entry is not an array".to_string()))?;
            let mut values = Vec::with_capacity(coords.len());
            for c in coords {
                let v = number(resolve(c)?).ok_or_else(|| {
                    PdfError::ParseError("InkList coordinate is not a number".to_string())
                })?;
                values.push(v);
            }
            // An odd trailing coordinate is ignored
            let points = values
                .chunks_exact(2)
                .map(|pair| Point::new(pair[0], pair[1]))
                .collect();
            ink_list.push(points);
        }

        let color = match dict.get(b"C") {
            Ok(obj) => parse_color(resolve(obj)?, &resolve)?,
            Err(_) => Color::black(),
        };

        let width = border_width(dict, &resolve)?.unwrap_or(1.0);

        let opacity = match dict.get(b"CA") {
            Ok(obj) => number(resolve(obj)?).unwrap_or(1.0),
            Err(_) => 1.0,
        };

        let rect = match dict.get(b"Rect") {
            Ok(obj) => parse_rect(resolve(obj)?, &resolve).ok(),
            Err(_) => None,
        };

        let text = |key: &[u8]| -> Result<Option<String>> {
            match dict.get(key) {
                Ok(obj) => Ok(resolve(obj)?.as_str().ok().map(decode_text_string)),
                Err(_) => Ok(None),
            }
        };

        Ok(Some(Self {
            ink_list,
            color,
            width,
            opacity,
            rect,
            name: text(b"NM")?,
            author: text(b"T")?,
            contents: text(b"Contents")?,
            modified: text(b"M")?,
        }))
    }
}

/// Generate appearance stream operators for an ink annotation
///
/// Strokes are drawn with round caps and joins so that a single-point
/// stroke renders as a dot. Opacity is applied through the `/GS0`
/// ExtGState resource, which the caller must provide when opacity < 1.
pub fn appearance_operators(ink: &InkAnnotation) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("q\n");

    if ink.opacity < 1.0 {
        ops.push_str("/GS0 gs\n");
    }

    // Stroke color
    ops.push_str(&format!(
        "{} {} {} RG\n",
        format_number(ink.color.r as f64),
        format_number(ink.color.g as f64),
        format_number(ink.color.b as f64)
    ));

    // Line width, round cap, round join
    ops.push_str(&format!("{} w\n", format_number(ink.width)));
    ops.push_str("1 J\n1 j\n");

    for stroke in &ink.ink_list {
        let Some((first, rest)) = stroke.split_first() else {
            continue;
        };

        ops.push_str(&format!(
            "{} {} m\n",
            format_number(first.x),
            format_number(first.y)
        ));

        if rest.is_empty() {
            // Zero-length segment; the round cap draws a dot
            ops.push_str(&format!(
                "{} {} l\n",
                format_number(first.x),
                format_number(first.y)
            ));
        }

        for p in rest {
            ops.push_str(&format!("{} {} l\n", format_number(p.x), format_number(p.y)));
        }

        ops.push_str("S\n");
    }

    ops.push_str("Q\n");

    ops.into_bytes()
}

/// Compress content with FlateDecode (zlib)
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Format a number for content streams and dictionaries
///
/// PDF has no exponent notation, so values are written with at most four
/// decimals and trailing zeros removed.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-0" => "0".to_string(),
        _ => s.to_string(),
    }
}

/// Format a timestamp as a PDF date string
///
/// # Example
/// ```ignore
/// assert_eq!(pdf_date(dt), "D:20240131120000Z");
/// ```
pub fn pdf_date(time: DateTime<Utc>) -> String {
    time.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Encode a PDF text string
///
/// ASCII text is written as-is; anything else as UTF-16BE with a byte
/// order mark.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or single-byte)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }

    // PDFDocEncoding agrees with Latin-1 for printable characters
    bytes.iter().map(|&b| b as char).collect()
}

fn text_string_object(text: &str) -> Object {
    Object::String(encode_text_string(text), StringFormat::Literal)
}

pub(crate) fn rect_object(rect: &Rect) -> Object {
    Object::Array(
        rect.to_array()
            .iter()
            .map(|v| Object::Real(*v as f32))
            .collect(),
    )
}

/// Numeric value of an integer or real object
pub(crate) fn number(obj: &Object) -> Option<f64> {
    obj.as_f32()
        .map(|v| v as f64)
        .ok()
        .or_else(|| obj.as_i64().ok().map(|v| v as f64))
}

/// Parse a rectangle array
pub(crate) fn parse_rect<'a, F>(obj: &'a Object, resolve: &F) -> Result<Rect>
where
    F: Fn(&'a Object) -> Result<&'a Object>,
{
    let values = obj
        .as_array()
        .map_err(|_| PdfError::ParseError("Rectangle is not an array".to_string()))?;
    if values.len() < 4 {
        return Err(PdfError::ParseError(format!(
            "Rectangle has {} entries",
            values.len()
        )));
    }

    let mut coords = [0.0; 4];
    for (slot, value) in coords.iter_mut().zip(values.iter()) {
        *slot = number(resolve(value)?)
            .ok_or_else(|| PdfError::ParseError("Rectangle entry is not a number".to_string()))?;
    }

    Ok(Rect::from_array(coords))
}

fn parse_color<'a, F>(obj: &'a Object, resolve: &F) -> Result<Color>
where
    F: Fn(&'a Object) -> Result<&'a Object>,
{
    let components = obj
        .as_array()
        .map_err(|_| PdfError::ParseError("Color is not an array".to_string()))?;

    let mut values = Vec::with_capacity(components.len());
    for c in components {
        values.push(number(resolve(c)?).unwrap_or(0.0) as f32);
    }

    Ok(match values.as_slice() {
        [gray] => Color::rgb(*gray, *gray, *gray),
        [r, g, b] => Color::rgb(*r, *g, *b),
        [c, m, y, k] => Color::rgb(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        ),
        // Empty array means transparent; fall back to black
        _ => Color::black(),
    })
}

/// Stroke width from `/BS /W`, falling back to the legacy `/Border` array
fn border_width<'a, F>(dict: &'a Dictionary, resolve: &F) -> Result<Option<f64>>
where
    F: Fn(&'a Object) -> Result<&'a Object>,
{
    if let Ok(bs) = dict.get(b"BS") {
        if let Ok(bs) = resolve(bs)?.as_dict() {
            if let Ok(w) = bs.get(b"W") {
                return Ok(number(resolve(w)?));
            }
        }
    }

    if let Ok(border) = dict.get(b"Border") {
        if let Ok(values) = resolve(border)?.as_array() {
            if let Some(w) = values.get(2) {
                return Ok(number(resolve(w)?));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lopdf::dictionary;
    use pretty_assertions::assert_eq;

    fn direct(obj: &Object) -> Result<&Object> {
        Ok(obj)
    }

    fn sample() -> InkAnnotation {
        InkAnnotation::new(vec![
            vec![Point::new(10.0, 20.0), Point::new(30.0, 40.0)],
            vec![Point::new(50.0, 60.0)],
        ])
        .with_color(Color::rgb(1.0, 0.0, 0.0))
        .with_width(2.0)
        .with_name("inkpdf-7")
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(12.34567), "12.3457");
        assert_eq!(format_number(-0.00001), "0");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(f64::NAN), "0");
    }

    #[test]
    fn test_pdf_date() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 31, 12, 5, 9).unwrap();
        assert_eq!(pdf_date(dt), "D:20240131120509Z");
    }

    #[test]
    fn test_text_string_roundtrip() {
        assert_eq!(encode_text_string("abc"), b"abc".to_vec());
        let encoded = encode_text_string("สวัสดี");
        assert_eq!(&encoded[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text_string(&encoded), "สวัสดี");
        assert_eq!(decode_text_string(&[0x63, 0xE9]), "cé");
    }

    #[test]
    fn test_appearance_operators() {
        let ops = String::from_utf8(appearance_operators(&sample())).unwrap();
        assert_eq!(
            ops,
            "q\n1 0 0 RG\n2 w\n1 J\n1 j\n10 20 m\n30 40 l\nS\n50 60 m\n50 60 l\nS\nQ\n"
        );
    }

    #[test]
    fn test_appearance_with_opacity_uses_gs() {
        let ops = String::from_utf8(appearance_operators(&sample().with_opacity(0.5))).unwrap();
        assert!(ops.starts_with("q\n/GS0 gs\n"));
    }

    #[test]
    fn test_bounding_rect_includes_width() {
        let rect = sample().bounding_rect().unwrap();
        assert_eq!(rect, Rect::new(8.0, 18.0, 52.0, 62.0));
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());
        assert!(InkAnnotation::new(vec![vec![]]).validate().is_err());
        assert!(sample().with_width(0.0).validate().is_err());
        let nan = InkAnnotation::new(vec![vec![Point::new(f64::NAN, 0.0)]]);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_dictionary_roundtrip() {
        let ink = sample()
            .with_author("Somchai")
            .with_contents("note")
            .with_opacity(0.5);
        let rect = ink.bounding_rect().unwrap();
        let dict = ink.to_dictionary(rect);

        let parsed = InkAnnotation::from_dictionary(&dict, direct)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.ink_list, ink.ink_list);
        assert_eq!(parsed.color, ink.color);
        assert_eq!(parsed.width, 2.0);
        assert_eq!(parsed.opacity, 0.5);
        assert_eq!(parsed.rect, Some(rect));
        assert_eq!(parsed.name.as_deref(), Some("inkpdf-7"));
        assert_eq!(parsed.author.as_deref(), Some("Somchai"));
        assert_eq!(parsed.contents.as_deref(), Some("note"));
        assert!(parsed.is_own());
    }

    #[test]
    fn test_non_ink_is_skipped() {
        let dict = lopdf::dictionary! {
            "Type" => "Annot",
            "Subtype" => "Highlight",
        };
        assert!(InkAnnotation::from_dictionary(&dict, direct)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_legacy_border_and_gray() {
        let dict = lopdf::dictionary! {
            "Subtype" => "Ink",
            "InkList" => vec![Object::Array(vec![1.into(), 2.into(), 3.into(), 4.into(), 5.into()])],
            "C" => vec![Object::Real(0.5)],
            "Border" => vec![0.into(), 0.into(), 3.into()],
        };
        let parsed = InkAnnotation::from_dictionary(&dict, direct)
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed.ink_list,
            vec![vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]]
        );
        assert_eq!(parsed.color, Color::rgb(0.5, 0.5, 0.5));
        assert_eq!(parsed.width, 3.0);
        assert!(!parsed.is_own());
    }
}
