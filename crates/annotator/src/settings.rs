//! User settings

use crate::ink::StrokeStyle;
use crate::{write_atomic, AnnotatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Pen, view and export preferences
///
/// Every field falls back to its default when absent from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pen: StrokeStyle,
    pub highlighter: StrokeStyle,
    /// Width of a page view at zoom 1
    pub view_width: f64,
    /// Gap between pages in continuous scroll
    pub page_spacing: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub default_zoom: f64,
    /// Written to the annotations' `/T`
    pub author: Option<String>,
    /// Point reduction tolerance applied on export (view units)
    pub simplify_tolerance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pen: StrokeStyle::pen(),
            highlighter: StrokeStyle::highlighter(),
            view_width: 1000.0,
            page_spacing: 16.0,
            min_zoom: page_geometry::DEFAULT_MIN_ZOOM,
            max_zoom: page_geometry::DEFAULT_MAX_ZOOM,
            default_zoom: 1.0,
            author: None,
            simplify_tolerance: 0.5,
        }
    }
}

impl Settings {
    /// `<config dir>/inkpdf/settings.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".inkpdf"))
            .join("inkpdf")
            .join("settings.json")
    }

    /// Load settings; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("settings file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let settings: Settings = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`Settings::load`], but unusable files also yield the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            warn!(
                "failed to load settings from {:?}: {}. using defaults",
                path, e
            );
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(AnnotatorError::InvalidSettings(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        };

        positive("view_width", self.view_width)?;
        positive("pen.width", self.pen.width)?;
        positive("highlighter.width", self.highlighter.width)?;
        positive("min_zoom", self.min_zoom)?;
        positive("max_zoom", self.max_zoom)?;

        if self.min_zoom > self.max_zoom {
            return Err(AnnotatorError::InvalidSettings(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.default_zoom) {
            return Err(AnnotatorError::InvalidSettings(format!(
                "default_zoom {} outside {}..={}",
                self.default_zoom, self.min_zoom, self.max_zoom
            )));
        }
        if self.page_spacing < 0.0 || self.simplify_tolerance < 0.0 {
            return Err(AnnotatorError::InvalidSettings(
                "page_spacing and simplify_tolerance must not be negative".to_string(),
            ));
        }
        for (name, style) in [("pen", &self.pen), ("highlighter", &self.highlighter)] {
            if !(0.0..=1.0).contains(&style.opacity) {
                return Err(AnnotatorError::InvalidSettings(format!(
                    "{}.opacity {} outside 0..=1",
                    name, style.opacity
                )));
            }
        }

        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        info!("saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"view_width": 800, "author": "Ann"}"#).unwrap();
        assert_eq!(settings.view_width, 800.0);
        assert_eq!(settings.author.as_deref(), Some("Ann"));
        assert_eq!(settings.highlighter, StrokeStyle::highlighter());
        assert_eq!(settings.max_zoom, Settings::default().max_zoom);
    }

    #[test]
    fn test_zoom_range_validated() {
        let settings = Settings {
            min_zoom: 4.0,
            max_zoom: 2.0,
            default_zoom: 3.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(AnnotatorError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_non_positive_width_rejected() {
        let settings = Settings {
            view_width: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
