//! Canvas geometry.
//!
//! `Position` and `Size` are canvas-space quantities stored on nodes. `Point`
//! is a raw pointer location whose space depends on who holds it; the canvas
//! coordinator converts screen points to canvas space before use.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A pointer location or a delta between two pointer locations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Top-left corner of a node in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rounds both coordinates to the nearest multiple of `grid`.
    ///
    /// A non-positive grid leaves the position untouched.
    #[must_use]
    pub fn snapped(self, grid: f64) -> Self {
        if grid <= 0.0 {
            return self;
        }
        Self::new((self.x / grid).round() * grid, (self.y / grid).round() * grid)
    }
}

impl From<Position> for Point {
    fn from(position: Position) -> Self {
        Point::new(position.x, position.y)
    }
}

impl Add<Point> for Position {
    type Output = Position;

    fn add(self, delta: Point) -> Position {
        Position::new(self.x + delta.x, self.y + delta.y)
    }
}

/// Width and height of a node in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Smallest size a node may be resized to unless configured otherwise.
    pub const MIN_NODE: Size = Size::new(180.0, 80.0);

    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Bounds each axis below by the matching axis of `min`.
    #[must_use]
    pub fn at_least(self, min: Size) -> Self {
        Self::new(self.width.max(min.width), self.height.max(min.height))
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::MIN_NODE
    }
}

/// An axis-aligned rectangle.
///
/// Width and height may be negative while a selection box is being dragged up
/// or to the left; call [`Rect::normalized`] before testing against it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned from `start` to `end`, keeping the drag direction.
    #[must_use]
    pub fn from_corners(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, end.x - start.x, end.y - start.y)
    }

    /// Bounding box of a node.
    #[must_use]
    pub fn from_node(position: Position, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    /// Same area with non-negative width and height.
    #[must_use]
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self::new(x, y, width, height)
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether two rectangles overlap. Shared edges count as overlap.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.x <= b.right() && b.x <= a.right() && a.y <= b.bottom() && b.y <= a.bottom()
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let r = self.normalized();
        point.x >= r.x && point.x <= r.right() && point.y >= r.y && point.y <= r.bottom()
    }
}

/// Whether a node's bounding box intersects a selection rectangle.
///
/// The rectangle is normalized first, so boxes dragged right-to-left or
/// bottom-to-top behave like their positive-extent equivalents.
#[must_use]
pub fn is_node_in_selection(selection: Rect, position: Position, size: Size) -> bool {
    selection
        .normalized()
        .intersects(&Rect::from_node(position, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_selection_box_is_normalized() {
        let selection = Rect::from_corners(Point::new(100.0, 100.0), Point::new(50.0, 50.0));
        assert_eq!(selection.width, -50.0);
        assert_eq!(selection.normalized(), Rect::new(50.0, 50.0, 50.0, 50.0));
        assert!(is_node_in_selection(
            selection,
            Position::new(60.0, 60.0),
            Size::new(20.0, 20.0)
        ));
    }

    #[test]
    fn disjoint_node_is_outside_selection() {
        let selection = Rect::from_corners(Point::new(100.0, 100.0), Point::new(50.0, 50.0));
        assert!(!is_node_in_selection(
            selection,
            Position::new(150.0, 10.0),
            Size::new(20.0, 20.0)
        ));
    }

    #[test]
    fn partially_covered_node_counts() {
        let selection = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(is_node_in_selection(
            selection,
            Position::new(90.0, 90.0),
            Size::new(200.0, 200.0)
        ));
    }

    #[test]
    fn size_floor_applies_per_axis() {
        let size = Size::new(50.0, 300.0).at_least(Size::MIN_NODE);
        assert_eq!(size, Size::new(180.0, 300.0));
    }

    #[test]
    fn snapping_rounds_to_grid() {
        let snapped = Position::new(31.0, 49.0).snapped(20.0);
        assert_eq!(snapped, Position::new(40.0, 40.0));
        assert_eq!(Position::new(3.0, 4.0).snapped(0.0), Position::new(3.0, 4.0));
    }
}
