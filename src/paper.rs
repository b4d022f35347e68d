//! Paper types and print geometry.
//!
//! The ids and pixel dimensions come from the vendor driver and must match
//! it exactly; they are sent verbatim in the per-page job options.

/// Paper formats supported by the printer family.
///
/// The `Split` variants lay several sub-images out on one sheet and carry
/// the number of sub-images the layout expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperType {
    Photo4x6,
    Photo5x7,
    Photo6x8,
    Photo6x9,
    Photo6x9Split2,
    Photo4x6Split2,
    Photo5x7Split2,
    Photo4x6Split3,
    Photo8x4,
    Photo8x6,
    Photo8x8,
    Photo8x12,
}

struct PaperSpec {
    id: u32,
    width: u32,
    height: u32,
    split: Option<u32>,
}

impl PaperType {
    fn spec(&self) -> PaperSpec {
        match self {
            Self::Photo4x6 => PaperSpec {
                id: 0,
                width: 1240,
                height: 1844,
                split: None,
            },
            Self::Photo5x7 => PaperSpec {
                id: 4,
                width: 1548,
                height: 2140,
                split: None,
            },
            Self::Photo6x8 => PaperSpec {
                id: 6,
                width: 1844,
                height: 2434,
                split: None,
            },
            Self::Photo6x9 => PaperSpec {
                id: 12,
                width: 1844,
                height: 2740,
                split: None,
            },
            Self::Photo6x9Split2 => PaperSpec {
                id: 14,
                width: 1844,
                height: 2492,
                split: Some(2),
            },
            Self::Photo4x6Split2 => PaperSpec {
                id: 17,
                width: 1240,
                height: 1844,
                split: Some(2),
            },
            Self::Photo5x7Split2 => PaperSpec {
                id: 19,
                width: 1548,
                height: 2152,
                split: Some(2),
            },
            Self::Photo4x6Split3 => PaperSpec {
                id: 21,
                width: 1240,
                height: 1844,
                split: Some(3),
            },
            Self::Photo8x4 => PaperSpec {
                id: 40,
                width: 2464,
                height: 1236,
                split: None,
            },
            Self::Photo8x6 => PaperSpec {
                id: 42,
                width: 2464,
                height: 1836,
                split: None,
            },
            Self::Photo8x8 => PaperSpec {
                id: 43,
                width: 2464,
                height: 2436,
                split: None,
            },
            Self::Photo8x12 => PaperSpec {
                id: 47,
                width: 2464,
                height: 3636,
                split: None,
            },
        }
    }

    /// Vendor paper type id, sent in the job options.
    pub fn id(&self) -> u32 {
        self.spec().id
    }

    /// Portrait pixel dimensions at printer resolution.
    pub fn dimensions(&self) -> (u32, u32) {
        let spec = self.spec();
        (spec.width, spec.height)
    }

    pub fn is_split(&self) -> bool {
        self.spec().split.is_some()
    }

    /// Number of sub-images a split layout expects, 1 otherwise.
    pub fn expected_images(&self) -> u32 {
        self.spec().split.unwrap_or(1)
    }
}

/// Print orientation. Landscape swaps the paper's pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn id(&self) -> u32 {
        match self {
            Self::Portrait => 1,
            Self::Landscape => 2,
        }
    }
}

/// Print quality mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMode {
    Standard,
    Fine,
}

impl QualityMode {
    pub fn id(&self) -> u32 {
        match self {
            Self::Standard => 0,
            Self::Fine => 1,
        }
    }
}

impl Default for QualityMode {
    fn default() -> Self {
        Self::Standard
    }
}

/// Paper type plus orientation; what a page buffer must be sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaperProfile {
    pub paper: PaperType,
    pub orientation: Orientation,
}

impl PaperProfile {
    pub fn new(paper: PaperType, orientation: Orientation) -> Self {
        PaperProfile { paper, orientation }
    }

    pub fn portrait(paper: PaperType) -> Self {
        Self::new(paper, Orientation::Portrait)
    }

    /// Pixel dimensions the page buffer must match, orientation applied.
    pub fn pixel_dimensions(&self) -> (u32, u32) {
        let (w, h) = self.paper.dimensions();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    pub fn expected_images(&self) -> u32 {
        self.paper.expected_images()
    }
}
