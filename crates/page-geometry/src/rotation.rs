//! Page rotation

use crate::{GeometryError, Result};
use serde::{Deserialize, Serialize};

/// Clockwise page rotation as stored in a page's `/Rotate` entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Build a rotation from degrees, normalizing negative and >= 360 values
    ///
    /// # Example
    /// ```ignore
    /// assert_eq!(Rotation::from_degrees(-90)?, Rotation::Deg270);
    /// assert_eq!(Rotation::from_degrees(450)?, Rotation::Deg90);
    /// ```
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(GeometryError::InvalidRotation(degrees));
        }

        Ok(match degrees.rem_euclid(360) {
            0 => Self::Deg0,
            90 => Self::Deg90,
            180 => Self::Deg180,
            _ => Self::Deg270,
        })
    }

    /// Rotation in degrees (0, 90, 180 or 270)
    pub fn degrees(self) -> i64 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// True when width and height swap on display
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Compose two clockwise rotations
    pub fn rotate_by(self, other: Rotation) -> Self {
        match (self.degrees() + other.degrees()).rem_euclid(360) {
            0 => Self::Deg0,
            90 => Self::Deg90,
            180 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// All four rotations in ascending order
    pub fn all() -> [Rotation; 4] {
        [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270]
    }
}

impl TryFrom<i64> for Rotation {
    type Error = GeometryError;

    fn try_from(value: i64) -> Result<Self> {
        Self::from_degrees(value)
    }
}

impl From<Rotation> for i64 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}
