//! Points, sizes and PDF rectangles

use serde::{Deserialize, Serialize};

/// A point in either view space or PDF user space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Compare two points component-wise within `eps`
    pub fn approx_eq(&self, other: &Point, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

/// Width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size with width and height exchanged
    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Size multiplied by a uniform factor
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Rectangle in PDF convention: lower-left and upper-right corners
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl Rect {
    /// Create a rectangle from two opposite corners
    ///
    /// PDF allows any two diagonally opposite corners in a rectangle array,
    /// so coordinates are normalized here.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            llx: x1.min(x2),
            lly: y1.min(y2),
            urx: x1.max(x2),
            ury: y1.max(y2),
        }
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.llx, self.lly, self.urx, self.ury]
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// True when the rectangle encloses no area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Overlapping area of two rectangles, if any
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let llx = self.llx.max(other.llx);
        let lly = self.lly.max(other.lly);
        let urx = self.urx.min(other.urx);
        let ury = self.ury.min(other.ury);

        if llx < urx && lly < ury {
            Some(Rect { llx, lly, urx, ury })
        } else {
            None
        }
    }

    /// Smallest rectangle covering both rectangles
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            llx: self.llx.min(other.llx),
            lly: self.lly.min(other.lly),
            urx: self.urx.max(other.urx),
            ury: self.ury.max(other.ury),
        }
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.llx && point.x <= self.urx && point.y >= self.lly && point.y <= self.ury
    }

    /// Grow (or shrink, for negative `d`) on every side
    pub fn inflate(&self, d: f64) -> Rect {
        Rect::new(self.llx - d, self.lly - d, self.urx + d, self.ury + d)
    }

    /// Bounding rectangle of a set of points, `None` for an empty set
    pub fn bounding<I>(points: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Rect {
            llx: first.x,
            lly: first.y,
            urx: first.x,
            ury: first.y,
        };

        for p in iter {
            rect.llx = rect.llx.min(p.x);
            rect.lly = rect.lly.min(p.y);
            rect.urx = rect.urx.max(p.x);
            rect.ury = rect.ury.max(p.y);
        }

        Some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rect_normalizes_corners() {
        let rect = Rect::new(100.0, 200.0, 10.0, 20.0);
        assert_eq!(rect.to_array(), [10.0, 20.0, 100.0, 200.0]);
        assert_eq!(rect.width(), 90.0);
        assert_eq!(rect.height(), 180.0);
    }

    #[test]
    fn test_intersect() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 150.0, 150.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(50.0, 50.0, 100.0, 100.0)));

        let c = Rect::new(200.0, 200.0, 300.0, 300.0);
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_bounding() {
        let rect = Rect::bounding(vec![
            Point::new(5.0, 1.0),
            Point::new(-2.0, 7.0),
            Point::new(3.0, 3.0),
        ]);
        assert_eq!(rect, Some(Rect::new(-2.0, 1.0, 5.0, 7.0)));
        assert_eq!(Rect::bounding(Vec::new()), None);
    }

    #[test]
    fn test_union_and_inflate() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 20.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 20.0, 10.0));
        assert_eq!(a.inflate(2.0), Rect::new(-2.0, -2.0, 12.0, 12.0));
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert!(a.approx_eq(&Point::new(1e-9, -1e-9), 1e-6));
    }
}
