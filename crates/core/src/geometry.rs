//! Bounding-box geometry in page-local pixel space
//!
//! Bounds are stored with explicit left/top/right/bottom edges. While the
//! user is dragging a selection the free corner may sit above or left of the
//! anchor, so a bounds is not guaranteed normalized until `normalized()` is
//! called at commit time.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in page-local pixel space
///
/// `right < left` (or `bottom < top`) is a legal transient state during an
/// active drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    /// Create a new bounds
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a zero-size bounds anchored at a point
    ///
    /// Used as the initial state when a drag starts.
    pub fn anchored_at(x: f32, y: f32) -> Self {
        Self::new(x, y, x, y)
    }

    /// Return a bounds with `left <= right` and `top <= bottom`
    ///
    /// Swaps edges as needed. Pure and total.
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }

    /// Width of the normalized bounds
    pub fn width(&self) -> f32 {
        (self.right - self.left).abs()
    }

    /// Height of the normalized bounds
    pub fn height(&self) -> f32 {
        (self.bottom - self.top).abs()
    }

    /// Check if this bounds encloses zero area
    pub fn is_empty(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Check if this bounds overlaps another
    ///
    /// Two rectangles intersect iff neither is fully to one side of the
    /// other along either axis. Any overlap counts, containment is not
    /// required: a token partially under a drag rectangle is included, and
    /// changing that changes the captured annotation text.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.right < other.left
            || other.right < self.left
            || self.bottom < other.top
            || other.bottom < self.top)
    }

    /// Multiply every coordinate by a render scale
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            left: self.left * scale,
            top: self.top * scale,
            right: self.right * scale,
            bottom: self.bottom * scale,
        }
    }

    /// Smallest bounds enclosing both `self` and `other`
    ///
    /// Assumes both are normalized.
    pub fn union(&self, other: &Bounds) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}
