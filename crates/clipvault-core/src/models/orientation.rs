//! Stream geometry, aspect-ratio classification and stored-asset naming.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::num::NonZeroU32;
use uuid::Uuid;

use crate::storage_types::UnclassifiedPolicy;

/// Width and height of a video stream. Both are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    width: NonZeroU32,
    height: NonZeroU32,
}

impl Dimensions {
    /// Returns `None` when either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            width: NonZeroU32::new(width)?,
            height: NonZeroU32::new(height)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.width.get()
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Canonical aspect ratio of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "other")]
    Other,
}

impl AspectRatio {
    /// Exact integer classification by cross-multiplication.
    ///
    /// Products are computed in `u64`, so no `u32` geometry can overflow.
    pub fn classify(dimensions: Dimensions) -> Self {
        let width = u64::from(dimensions.width());
        let height = u64::from(dimensions.height());

        if width * 9 == height * 16 {
            AspectRatio::Landscape16x9
        } else if width * 16 == height * 9 {
            AspectRatio::Portrait9x16
        } else {
            AspectRatio::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Other => "other",
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Namespace a stored video is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationClass {
    Landscape,
    Portrait,
    Other,
}

impl OrientationClass {
    pub fn from_aspect_ratio(ratio: AspectRatio, unclassified: UnclassifiedPolicy) -> Self {
        match (ratio, unclassified) {
            (AspectRatio::Landscape16x9, _) => OrientationClass::Landscape,
            (AspectRatio::Portrait9x16, _) => OrientationClass::Portrait,
            (AspectRatio::Other, UnclassifiedPolicy::Portrait) => OrientationClass::Portrait,
            (AspectRatio::Other, UnclassifiedPolicy::Other) => OrientationClass::Other,
        }
    }

    /// Key prefix segment for this class.
    pub fn namespace(&self) -> &'static str {
        match self {
            OrientationClass::Landscape => "landscape",
            OrientationClass::Portrait => "portrait",
            OrientationClass::Other => "other",
        }
    }
}

impl Display for OrientationClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.namespace())
    }
}

/// Identity of one uploaded video in the object store.
///
/// The id is a fresh random v4 UUID (122 random bits) per upload; keys are
/// never reused and collisions are not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredAsset {
    pub orientation: OrientationClass,
    pub id: Uuid,
}

impl StoredAsset {
    pub const EXTENSION: &'static str = "mp4";

    pub fn generate(orientation: OrientationClass) -> Self {
        Self {
            orientation,
            id: Uuid::new_v4(),
        }
    }

    /// `<orientation>/<uuid>.mp4`
    pub fn key(&self) -> String {
        format!(
            "{}/{}.{}",
            self.orientation.namespace(),
            self.id,
            Self::EXTENSION
        )
    }
}
