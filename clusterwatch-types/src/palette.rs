//! Display colors for severities and bands.
//!
//! Renderers are free to ignore these; they exist so that every sink agrees on
//! what "amber" means.

use crate::{Band, Severity};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Halve every channel, used for the night variant of a color.
    pub const fn dimmed(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }

    /// `#rrggbb` notation.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Severity {
    /// Background color for the overall severity.
    pub const fn color(&self) -> Rgb {
        match self {
            Severity::Ok => Rgb(0, 120, 0),
            Severity::Degraded => Rgb(255, 215, 0),
            Severity::Critical => Rgb(139, 0, 0),
            Severity::Unknown => Rgb::BLACK,
        }
    }
}

impl Band {
    /// Color of the band, dimmed at night.
    pub const fn color(&self, night: bool) -> Rgb {
        let day = match self {
            Band::Low => Rgb(220, 20, 20),
            Band::Mid => Rgb(255, 215, 0),
            Band::High => Rgb(0, 170, 0),
        };
        if night {
            day.dimmed()
        } else {
            day
        }
    }
}
