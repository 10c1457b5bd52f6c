use geo::{Area, BooleanOps, Coord, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Planar region geometry. Always a multi-polygon so that boolean results
/// (which may split into several parts) keep the same type as the inputs.
pub type Shape = MultiPolygon<f64>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Box from a GEDI-style `col,row,width,height` quadruple.
    pub fn from_xywh(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            Coord { x: self.x0, y: self.y0 },
            Coord { x: self.x1, y: self.y1 },
        )
        .to_polygon()
    }

    pub fn to_shape(&self) -> Shape {
        MultiPolygon::new(vec![self.to_polygon()])
    }
}

pub fn empty_shape() -> Shape {
    MultiPolygon::new(Vec::new())
}

pub fn area(shape: &Shape) -> f64 {
    shape.unsigned_area()
}

pub fn intersection(a: &Shape, b: &Shape) -> Shape {
    if a.0.is_empty() || b.0.is_empty() {
        return empty_shape();
    }
    a.intersection(b)
}

pub fn difference(a: &Shape, b: &Shape) -> Shape {
    if a.0.is_empty() || b.0.is_empty() {
        return a.clone();
    }
    a.difference(b)
}

/// Removes every shape in `others` from `shape`, one after the other.
pub fn subtract_all<'a, I>(shape: &Shape, others: I) -> Shape
where
    I: IntoIterator<Item = &'a Shape>,
{
    others
        .into_iter()
        .fold(shape.clone(), |rest, other| difference(&rest, other))
}
