use crate::error::{SnapdeckError, SnapdeckResult};
use crate::work::{SubjectId, WorkItem};

/// Integer pixel rectangle in render-surface space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> SnapdeckResult<Self> {
        if width == 0 || height == 0 {
            return Err(SnapdeckError::validation(
                "capture region width/height must be non-zero",
            ));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Whether the region is fully contained in a surface of the given size.
    pub fn fits_within(&self, surface_width: u32, surface_height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= surface_width)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|b| b <= surface_height)
    }

    fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            x: (f64::from(self.x) * sx).round() as u32,
            y: (f64::from(self.y) * sy).round() as u32,
            width: ((f64::from(self.width) * sx).round() as u32).max(1),
            height: ((f64::from(self.height) * sy).round() as u32).max(1),
        }
    }
}

/// Per-layout capture regions, expressed against a reference surface size.
///
/// Cards, hero-style cards, mercenary hero cards, card backs and packs each
/// frame differently on screen and need their own rectangle.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureLayout {
    pub card: CaptureRegion,
    pub card_hero: CaptureRegion,
    pub card_mercenary: CaptureRegion,
    pub card_back: CaptureRegion,
    pub pack: CaptureRegion,
    pub reference_width: u32,
    pub reference_height: u32,
}

impl CaptureLayout {
    /// Reference layout for a 1920x1080 fullscreen surface.
    pub fn fullscreen_1920x1080() -> Self {
        Self {
            card: CaptureRegion {
                x: 692,
                y: 310,
                width: 510,
                height: 670,
            },
            card_hero: CaptureRegion {
                x: 692,
                y: 490,
                width: 510,
                height: 490,
            },
            card_mercenary: CaptureRegion {
                x: 692,
                y: 384,
                width: 510,
                height: 490,
            },
            card_back: CaptureRegion {
                x: 706,
                y: 310,
                width: 510,
                height: 670,
            },
            pack: CaptureRegion {
                x: 734,
                y: 335,
                width: 478,
                height: 610,
            },
            reference_width: 1920,
            reference_height: 1080,
        }
    }

    /// Rescale every region proportionally to the current surface size.
    pub fn scaled_to(&self, surface_width: u32, surface_height: u32) -> SnapdeckResult<Self> {
        if surface_width == 0 || surface_height == 0 {
            return Err(SnapdeckError::validation(
                "surface width/height must be non-zero",
            ));
        }
        let sx = f64::from(surface_width) / f64::from(self.reference_width);
        let sy = f64::from(surface_height) / f64::from(self.reference_height);
        Ok(Self {
            card: self.card.scaled(sx, sy),
            card_hero: self.card_hero.scaled(sx, sy),
            card_mercenary: self.card_mercenary.scaled(sx, sy),
            card_back: self.card_back.scaled(sx, sy),
            pack: self.pack.scaled(sx, sy),
            reference_width: surface_width,
            reference_height: surface_height,
        })
    }

    /// Pick the capture rectangle for one work item.
    pub fn region_for(&self, item: &WorkItem) -> CaptureRegion {
        match item.subject {
            SubjectId::Card(_) => {
                if item.flags.hero {
                    if item.flags.mercenary {
                        self.card_mercenary
                    } else {
                        self.card_hero
                    }
                } else {
                    self.card
                }
            }
            SubjectId::CardBack(_) => self.card_back,
            SubjectId::Pack(_) => self.pack,
        }
    }
}

impl Default for CaptureLayout {
    fn default() -> Self {
        Self::fullscreen_1920x1080()
    }
}
