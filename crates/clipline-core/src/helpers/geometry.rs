// crates/clipline-core/src/helpers/geometry.rs
//
// Plain pixel-space geometry for render models.
//
// The drawing surface lives outside this workspace, so these types carry no
// toolkit dependency: f32 coordinates, origin at the clip's top-left corner,
// y growing downwards.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x:      f32,
    pub y:      f32,
    pub width:  f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rect spanning `[x0, x1]` horizontally, clamped so width is never negative.
    ///
    /// ```
    /// use clipline_core::helpers::geometry::Rect;
    /// let r = Rect::from_x_range(10.0, 4.0, 0.0, 5.0);
    /// assert_eq!(r.width, 0.0);
    /// ```
    pub fn from_x_range(x0: f32, x1: f32, y: f32, height: f32) -> Self {
        Self { x: x0, y, width: (x1 - x0).max(0.0), height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}
