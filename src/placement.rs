//! Popover anchoring for highlighted ranges.
//!
//! Collision avoidance is a single vertical flip: a highlight near the top
//! of the viewport gets its popover below, anything else gets it above.
//! Horizontally the popover is always centred on the highlight.

/// Viewport-relative rectangle, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

pub const TOOLTIP_THRESHOLD: f64 = 120.0;
pub const BUBBLE_THRESHOLD: f64 = 190.0;
pub const DEFAULT_OFFSET: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverKind {
    /// Single-message hover tooltip.
    Tooltip,
    /// Full thread bubble with replies and suggestion actions.
    ThreadBubble,
}

impl PopoverKind {
    pub fn default_threshold(&self) -> f64 {
        match self {
            PopoverKind::Tooltip => TOOLTIP_THRESHOLD,
            PopoverKind::ThreadBubble => BUBBLE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Below,
    Above,
}

/// Where a popover goes: `(left, top)` is the anchor point, which is the
/// popover's top-centre when placed below and its bottom-centre when above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub side: Side,
    pub left: f64,
    pub top: f64,
}

impl Placement {
    /// CSS transform that moves the popover's box onto the anchor point.
    pub fn transform(&self) -> &'static str {
        match self.side {
            Side::Below => "translate(-50%, 0)",
            Side::Above => "translate(-50%, -100%)",
        }
    }

    /// Box of a popover of the given size once the transform is applied.
    pub fn popover_rect(&self, width: f64, height: f64) -> Rect {
        let top = match self.side {
            Side::Below => self.top,
            Side::Above => self.top - height,
        };
        Rect::new(self.left - width / 2.0, top, width, height)
    }
}

/// Places a popover for `anchor` using an explicit flip threshold.
pub fn place(anchor: Rect, threshold: f64, offset: f64) -> Placement {
    let left = anchor.center_x();
    if anchor.top < threshold {
        Placement {
            side: Side::Below,
            left,
            top: anchor.bottom() + offset,
        }
    } else {
        Placement {
            side: Side::Above,
            left,
            top: anchor.top - offset,
        }
    }
}

pub fn place_popover(anchor: Rect, kind: PopoverKind) -> Placement {
    place(anchor, kind.default_threshold(), DEFAULT_OFFSET)
}
