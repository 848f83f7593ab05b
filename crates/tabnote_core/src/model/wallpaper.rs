//! Wallpaper rotation state.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Rotation mode; serialized as `slideshow` / `static`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallpaperMode {
    /// A timer periodically advances the wallpaper.
    #[default]
    Slideshow,
    /// A fixed, user-chosen wallpaper; no timer.
    Static,
}

impl WallpaperMode {
    /// Stable string form used in the persisted state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slideshow => "slideshow",
            Self::Static => "static",
        }
    }

    /// Parses the persisted string form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "slideshow" => Some(Self::Slideshow),
            "static" => Some(Self::Static),
            _ => None,
        }
    }
}

impl Display for WallpaperMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current wallpaper position and mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallpaperState {
    pub index: usize,
    pub mode: WallpaperMode,
}
