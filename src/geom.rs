//! Geometry values decoded from ".shp" records.
//!
//! One variant per legacy shape type, plus `Geometry`, the closed sum over
//! all of them. Multi-part variants store one flat point array and a list of
//! part-start offsets into it; Z (elevation) and M (measure) values live in
//! parallel flat arrays with their own min/max ranges. Every value is
//! self-contained: nothing refers back to the stream it was decoded from.
//!
//! All geometry types render well-known text through `fmt::Display`:
//!
//! ```
//! use shapefile::geom::Point;
//!
//! assert_eq!("POINT (10 20)", Point(10., 20.).to_string());
//! ```

use std::fmt;
use itertools::Itertools;

/// Measure values smaller than -10^38 mean "no data" in a shapefile. This is
/// the value we write when a record omits its measures entirely.
pub const NO_DATA: f64 = -1e39;

/// Returns true iff the given Z or M value is the "no data" sentinel.
pub fn is_no_data(value: f64) -> bool {
    value < -1e38
}

/// The shape-type codes a ".shp" file can declare, per the ESRI whitepaper.
///
/// Any other code is a decode error, never a skipped record.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    pub fn from_i32(i: i32) -> Option<ShapeType> {
        match i {
            0  => Some(ShapeType::Null),
            1  => Some(ShapeType::Point),
            3  => Some(ShapeType::PolyLine),
            5  => Some(ShapeType::Polygon),
            8  => Some(ShapeType::MultiPoint),
            11 => Some(ShapeType::PointZ),
            13 => Some(ShapeType::PolyLineZ),
            15 => Some(ShapeType::PolygonZ),
            18 => Some(ShapeType::MultiPointZ),
            21 => Some(ShapeType::PointM),
            23 => Some(ShapeType::PolyLineM),
            25 => Some(ShapeType::PolygonM),
            28 => Some(ShapeType::MultiPointM),
            31 => Some(ShapeType::MultiPatch),
            _ => None,
        }
    }

    pub fn to_i32(&self) -> i32 {
        match *self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// xmin, ymin, xmax, ymax. Degenerate boxes (min == max on an axis) are
/// permitted.
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct BoundingBox(pub f64, pub f64, pub f64, pub f64);

/// A 2D coordinate: x, y.
#[derive(Debug,Clone,Copy,PartialEq,PartialOrd)]
pub struct Point(pub f64, pub f64);

/// A 2D coordinate plus a measure.
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct PointM {
    pub x: f64,
    pub y: f64,
    pub m: f64,
}

/// A 3D coordinate plus a measure. The on-disk PointZ record stores X, Y, Z,
/// M in that order; when the record omits the trailing M, `m` is the
/// [`NO_DATA`](constant.NO_DATA.html) sentinel.
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct PointZ {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m: f64,
}

#[derive(Debug,Clone,PartialEq)]
pub struct MultiPoint {
    pub bounds: BoundingBox,
    pub points: Box<[Point]>,
}

#[derive(Debug,Clone,PartialEq)]
pub struct MultiPointM {
    pub bounds: BoundingBox,
    pub points: Box<[Point]>,
    pub m_range: (f64, f64),
    pub m: Box<[f64]>,
}

#[derive(Debug,Clone,PartialEq)]
pub struct MultiPointZ {
    pub bounds: BoundingBox,
    pub points: Box<[Point]>,
    pub z_range: (f64, f64),
    pub z: Box<[f64]>,
    pub m_range: (f64, f64),
    pub m: Box<[f64]>,
}

/// An ordered sequence of lines ("parts"), stored as part-start offsets into
/// one flat point array. `parts[0] == 0`, offsets strictly increase, and the
/// last part ends at `points.len()`.
#[derive(Debug,Clone,PartialEq)]
pub struct PolyLine {
    pub bounds: BoundingBox,
    pub parts: Box<[usize]>,
    pub points: Box<[Point]>,
}

#[derive(Debug,Clone,PartialEq)]
pub struct PolyLineM {
    pub bounds: BoundingBox,
    pub parts: Box<[usize]>,
    pub points: Box<[Point]>,
    pub m_range: (f64, f64),
    pub m: Box<[f64]>,
}

#[derive(Debug,Clone,PartialEq)]
pub struct PolyLineZ {
    pub bounds: BoundingBox,
    pub parts: Box<[usize]>,
    pub points: Box<[Point]>,
    pub z_range: (f64, f64),
    pub z: Box<[f64]>,
    pub m_range: (f64, f64),
    pub m: Box<[f64]>,
}

/// Same layout as [`PolyLine`](struct.PolyLine.html), but each part is a
/// closed ring. The decoder reverses each ring's stored point order, so
/// rings come out in OGC orientation (outer rings clockwise).
#[derive(Debug,Clone,PartialEq)]
pub struct Polygon {
    pub bounds: BoundingBox,
    pub parts: Box<[usize]>,
    pub points: Box<[Point]>,
}

#[derive(Debug,Clone,PartialEq)]
pub struct PolygonM {
    pub bounds: BoundingBox,
    pub parts: Box<[usize]>,
    pub points: Box<[Point]>,
    pub m_range: (f64, f64),
    pub m: Box<[f64]>,
}

#[derive(Debug,Clone,PartialEq)]
pub struct PolygonZ {
    pub bounds: BoundingBox,
    pub parts: Box<[usize]>,
    pub points: Box<[Point]>,
    pub z_range: (f64, f64),
    pub z: Box<[f64]>,
    pub m_range: (f64, f64),
    pub m: Box<[f64]>,
}

/// A 3D mesh record, decoded but not interpreted: `part_types` holds the raw
/// per-part tags (triangle strip, triangle fan, ring variants) for the
/// caller to make sense of. The trailing M block is optional on disk.
#[derive(Debug,Clone,PartialEq)]
pub struct MultiPatch {
    pub bounds: BoundingBox,
    pub parts: Box<[usize]>,
    pub part_types: Box<[i32]>,
    pub points: Box<[Point]>,
    pub z_range: (f64, f64),
    pub z: Box<[f64]>,
    pub m_range: Option<(f64, f64)>,
    pub m: Option<Box<[f64]>>,
}

/// Every geometry a ".shp" record can decode to.
#[derive(Debug,Clone,PartialEq)]
pub enum Geometry {
    Null,
    Point(Point),
    PointM(PointM),
    PointZ(PointZ),
    MultiPoint(MultiPoint),
    MultiPointM(MultiPointM),
    MultiPointZ(MultiPointZ),
    PolyLine(PolyLine),
    PolyLineM(PolyLineM),
    PolyLineZ(PolyLineZ),
    Polygon(Polygon),
    PolygonM(PolygonM),
    PolygonZ(PolygonZ),
    MultiPatch(MultiPatch),
}

impl Geometry {
    pub fn shape_type(&self) -> ShapeType {
        match *self {
            Geometry::Null => ShapeType::Null,
            Geometry::Point(_) => ShapeType::Point,
            Geometry::PointM(_) => ShapeType::PointM,
            Geometry::PointZ(_) => ShapeType::PointZ,
            Geometry::MultiPoint(_) => ShapeType::MultiPoint,
            Geometry::MultiPointM(_) => ShapeType::MultiPointM,
            Geometry::MultiPointZ(_) => ShapeType::MultiPointZ,
            Geometry::PolyLine(_) => ShapeType::PolyLine,
            Geometry::PolyLineM(_) => ShapeType::PolyLineM,
            Geometry::PolyLineZ(_) => ShapeType::PolyLineZ,
            Geometry::Polygon(_) => ShapeType::Polygon,
            Geometry::PolygonM(_) => ShapeType::PolygonM,
            Geometry::PolygonZ(_) => ShapeType::PolygonZ,
            Geometry::MultiPatch(_) => ShapeType::MultiPatch,
        }
    }

    /// The record's stored bounding box. Null and single-point records
    /// don't carry one.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match *self {
            Geometry::Null => None,
            Geometry::Point(_) | Geometry::PointM(_) | Geometry::PointZ(_) => None,
            Geometry::MultiPoint(ref g) => Some(g.bounds),
            Geometry::MultiPointM(ref g) => Some(g.bounds),
            Geometry::MultiPointZ(ref g) => Some(g.bounds),
            Geometry::PolyLine(ref g) => Some(g.bounds),
            Geometry::PolyLineM(ref g) => Some(g.bounds),
            Geometry::PolyLineZ(ref g) => Some(g.bounds),
            Geometry::Polygon(ref g) => Some(g.bounds),
            Geometry::PolygonM(ref g) => Some(g.bounds),
            Geometry::PolygonZ(ref g) => Some(g.bounds),
            Geometry::MultiPatch(ref g) => Some(g.bounds),
        }
    }
}

/// Returns the [start, end) point range of part `i`.
fn part_range(parts: &[usize], n_points: usize, i: usize) -> (usize, usize) {
    let start = parts[i];
    let end = if i + 1 < parts.len() { parts[i + 1] } else { n_points };
    (start, end)
}

impl PolyLine {
    pub fn n_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn part(&self, i: usize) -> &[Point] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.points[start..end]
    }
}

impl PolyLineM {
    pub fn n_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn part(&self, i: usize) -> &[Point] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.points[start..end]
    }

    pub fn part_m(&self, i: usize) -> &[f64] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.m[start..end]
    }
}

impl PolyLineZ {
    pub fn n_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn part(&self, i: usize) -> &[Point] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.points[start..end]
    }

    pub fn part_z(&self, i: usize) -> &[f64] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.z[start..end]
    }

    pub fn part_m(&self, i: usize) -> &[f64] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.m[start..end]
    }
}

impl Polygon {
    pub fn n_rings(&self) -> usize {
        self.parts.len()
    }

    pub fn ring(&self, i: usize) -> &[Point] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.points[start..end]
    }
}

impl PolygonM {
    pub fn n_rings(&self) -> usize {
        self.parts.len()
    }

    pub fn ring(&self, i: usize) -> &[Point] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.points[start..end]
    }

    pub fn ring_m(&self, i: usize) -> &[f64] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.m[start..end]
    }
}

impl PolygonZ {
    pub fn n_rings(&self) -> usize {
        self.parts.len()
    }

    pub fn ring(&self, i: usize) -> &[Point] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.points[start..end]
    }

    pub fn ring_z(&self, i: usize) -> &[f64] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.z[start..end]
    }

    pub fn ring_m(&self, i: usize) -> &[f64] {
        let (start, end) = part_range(&self.parts, self.points.len(), i);
        &self.m[start..end]
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum WindingOrder {
    Clockwise,
    CounterClockwise,
}

/// Returns 2*area, positive iff the ring is counter-clockwise.
///
/// Assumes y grows north, as in projected GIS coordinates (not screen
/// coordinates). Assumes the first and last Points are identical.
pub fn signed_area2<'a, T: IntoIterator<Item=&'a Point>>(points: T) -> f64 {
    // https://en.wikipedia.org/wiki/Shoelace_formula
    let mut a: f64 = 0.;

    for (p1, p2) in points.into_iter().tuple_windows() {
        a += p1.0 * p2.1 - p2.0 * p1.1
    }

    a
}

/// Returns winding order.
///
/// Assumes y grows north, as in projected GIS coordinates. A zero-area Ring
/// is considered to be Clockwise.
///
/// Assumes the first and last Points are identical.
pub fn winding_order<'a, T: IntoIterator<Item=&'a Point>>(points: T) -> WindingOrder {
    if signed_area2(points) > 0. {
        WindingOrder::CounterClockwise
    } else {
        WindingOrder::Clockwise
    }
}

fn write_part(f: &mut fmt::Formatter, points: &[Point]) -> fmt::Result {
    let mut r = write!(f, "(");
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            r = r.and_then(|_| write!(f, ", "));
        }
        r = r.and_then(|_| write!(f, "{} {}", point.0, point.1));
    }
    r.and_then(|_| write!(f, ")"))
}

fn write_part_m(f: &mut fmt::Formatter, points: &[Point], m: &[f64]) -> fmt::Result {
    let mut r = write!(f, "(");
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            r = r.and_then(|_| write!(f, ", "));
        }
        r = r.and_then(|_| write!(f, "{} {} {}", point.0, point.1, m[i]));
    }
    r.and_then(|_| write!(f, ")"))
}

fn write_part_zm(f: &mut fmt::Formatter, points: &[Point], z: &[f64], m: &[f64]) -> fmt::Result {
    let mut r = write!(f, "(");
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            r = r.and_then(|_| write!(f, ", "));
        }
        r = r.and_then(|_| write!(f, "{} {} {} {}", point.0, point.1, z[i], m[i]));
    }
    r.and_then(|_| write!(f, ")"))
}

fn write_part_z(f: &mut fmt::Formatter, points: &[Point], z: &[f64]) -> fmt::Result {
    let mut r = write!(f, "(");
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            r = r.and_then(|_| write!(f, ", "));
        }
        r = r.and_then(|_| write!(f, "{} {} {}", point.0, point.1, z[i]));
    }
    r.and_then(|_| write!(f, ")"))
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "POINT ({} {})", self.0, self.1)
    }
}

impl fmt::Display for PointM {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "POINT M ({} {} {})", self.x, self.y, self.m)
    }
}

impl fmt::Display for PointZ {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "POINT ZM ({} {} {} {})", self.x, self.y, self.z, self.m)
    }
}

impl fmt::Display for MultiPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.points.is_empty() {
            return write!(f, "MULTIPOINT EMPTY");
        }
        let mut r = write!(f, "MULTIPOINT (");
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write!(f, "({} {})", point.0, point.1));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for MultiPointM {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.points.is_empty() {
            return write!(f, "MULTIPOINT M EMPTY");
        }
        let mut r = write!(f, "MULTIPOINT M (");
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write!(f, "({} {} {})", point.0, point.1, self.m[i]));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for MultiPointZ {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.points.is_empty() {
            return write!(f, "MULTIPOINT ZM EMPTY");
        }
        let mut r = write!(f, "MULTIPOINT ZM (");
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write!(f, "({} {} {} {})", point.0, point.1, self.z[i], self.m[i]));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for PolyLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "MULTILINESTRING EMPTY");
        }
        let mut r = write!(f, "MULTILINESTRING (");
        for i in 0..self.n_parts() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write_part(f, self.part(i)));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for PolyLineM {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "MULTILINESTRING M EMPTY");
        }
        let mut r = write!(f, "MULTILINESTRING M (");
        for i in 0..self.n_parts() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write_part_m(f, self.part(i), self.part_m(i)));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for PolyLineZ {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "MULTILINESTRING ZM EMPTY");
        }
        let mut r = write!(f, "MULTILINESTRING ZM (");
        for i in 0..self.n_parts() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write_part_zm(f, self.part(i), self.part_z(i), self.part_m(i)));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "POLYGON EMPTY");
        }
        let mut r = write!(f, "POLYGON (");
        for i in 0..self.n_rings() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write_part(f, self.ring(i)));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for PolygonM {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "POLYGON M EMPTY");
        }
        let mut r = write!(f, "POLYGON M (");
        for i in 0..self.n_rings() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write_part_m(f, self.ring(i), self.ring_m(i)));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for PolygonZ {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "POLYGON ZM EMPTY");
        }
        let mut r = write!(f, "POLYGON ZM (");
        for i in 0..self.n_rings() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            r = r.and_then(|_| write_part_zm(f, self.ring(i), self.ring_z(i), self.ring_m(i)));
        }
        r.and_then(|_| write!(f, ")"))
    }
}

// MultiPatch has no well-known-text form. We render it under a non-standard
// MULTIPATCH tag so it can still be inspected; callers wanting real output
// must interpret part_types themselves.
impl fmt::Display for MultiPatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "MULTIPATCH EMPTY");
        }
        let mut r = write!(f, "MULTIPATCH (");
        for i in 0..self.parts.len() {
            if i > 0 {
                r = r.and_then(|_| write!(f, ", "));
            }
            let (start, end) = part_range(&self.parts, self.points.len(), i);
            r = r.and_then(|_| match self.m {
                Some(ref m) => write_part_zm(f, &self.points[start..end], &self.z[start..end], &m[start..end]),
                None => write_part_z(f, &self.points[start..end], &self.z[start..end]),
            });
        }
        r.and_then(|_| write!(f, ")"))
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Geometry::Null => write!(f, "GEOMETRYCOLLECTION EMPTY"),
            Geometry::Point(ref g) => g.fmt(f),
            Geometry::PointM(ref g) => g.fmt(f),
            Geometry::PointZ(ref g) => g.fmt(f),
            Geometry::MultiPoint(ref g) => g.fmt(f),
            Geometry::MultiPointM(ref g) => g.fmt(f),
            Geometry::MultiPointZ(ref g) => g.fmt(f),
            Geometry::PolyLine(ref g) => g.fmt(f),
            Geometry::PolyLineM(ref g) => g.fmt(f),
            Geometry::PolyLineZ(ref g) => g.fmt(f),
            Geometry::Polygon(ref g) => g.fmt(f),
            Geometry::PolygonM(ref g) => g.fmt(f),
            Geometry::PolygonZ(ref g) => g.fmt(f),
            Geometry::MultiPatch(ref g) => g.fmt(f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn square_polyline() -> PolyLine {
        PolyLine {
            bounds: BoundingBox(0., 0., 4., 4.),
            parts: vec![ 0, 2 ].into_boxed_slice(),
            points: vec![ Point(0., 0.), Point(4., 0.), Point(4., 4.), Point(0., 4.), Point(0., 0.) ].into_boxed_slice(),
        }
    }

    #[test]
    fn test_part_slicing() {
        let line = square_polyline();
        assert_eq!(2, line.n_parts());
        assert_eq!(&[ Point(0., 0.), Point(4., 0.) ], line.part(0));
        assert_eq!(3, line.part(1).len());
        assert_eq!(line.points.len(), line.part(0).len() + line.part(1).len());
    }

    #[test]
    fn test_point_wkt() {
        assert_eq!("POINT (10 20)", Point(10., 20.).to_string());
        assert_eq!("POINT M (1 2 3)", PointM { x: 1., y: 2., m: 3. }.to_string());
        assert_eq!("POINT ZM (1 2 3 4)", PointZ { x: 1., y: 2., z: 3., m: 4. }.to_string());
    }

    #[test]
    fn test_multi_point_wkt() {
        let mp = MultiPoint {
            bounds: BoundingBox(1., 2., 3., 4.),
            points: vec![ Point(1., 2.), Point(3., 4.) ].into_boxed_slice(),
        };
        assert_eq!("MULTIPOINT ((1 2), (3 4))", mp.to_string());

        let empty = MultiPoint {
            bounds: BoundingBox(0., 0., 0., 0.),
            points: vec![].into_boxed_slice(),
        };
        assert_eq!("MULTIPOINT EMPTY", empty.to_string());
    }

    #[test]
    fn test_multi_point_m_wkt() {
        let mp = MultiPointM {
            bounds: BoundingBox(1., 2., 3., 4.),
            points: vec![ Point(1., 2.), Point(3., 4.) ].into_boxed_slice(),
            m_range: (7., 8.),
            m: vec![ 7., 8. ].into_boxed_slice(),
        };
        assert_eq!("MULTIPOINT M ((1 2 7), (3 4 8))", mp.to_string());
    }

    #[test]
    fn test_poly_line_wkt() {
        assert_eq!(
            "MULTILINESTRING ((0 0, 4 0), (4 4, 0 4, 0 0))",
            square_polyline().to_string()
        );
    }

    #[test]
    fn test_poly_line_z_wkt() {
        let line = PolyLineZ {
            bounds: BoundingBox(0., 0., 1., 1.),
            parts: vec![ 0 ].into_boxed_slice(),
            points: vec![ Point(0., 0.), Point(1., 1.) ].into_boxed_slice(),
            z_range: (5., 6.),
            z: vec![ 5., 6. ].into_boxed_slice(),
            m_range: (7., 8.),
            m: vec![ 7., 8. ].into_boxed_slice(),
        };
        assert_eq!("MULTILINESTRING ZM ((0 0 5 7, 1 1 6 8))", line.to_string());
    }

    #[test]
    fn test_polygon_wkt() {
        let polygon = Polygon {
            bounds: BoundingBox(0., 0., 4., 4.),
            parts: vec![ 0 ].into_boxed_slice(),
            points: vec![ Point(0., 0.), Point(0., 4.), Point(4., 4.), Point(0., 0.) ].into_boxed_slice(),
        };
        assert_eq!("POLYGON ((0 0, 0 4, 4 4, 0 0))", polygon.to_string());
    }

    #[test]
    fn test_null_wkt() {
        assert_eq!("GEOMETRYCOLLECTION EMPTY", Geometry::Null.to_string());
    }

    #[test]
    fn test_multi_patch_wkt_without_m() {
        let patch = MultiPatch {
            bounds: BoundingBox(0., 0., 1., 1.),
            parts: vec![ 0 ].into_boxed_slice(),
            part_types: vec![ 0 ].into_boxed_slice(),
            points: vec![ Point(0., 0.), Point(1., 1.) ].into_boxed_slice(),
            z_range: (2., 3.),
            z: vec![ 2., 3. ].into_boxed_slice(),
            m_range: None,
            m: None,
        };
        assert_eq!("MULTIPATCH ((0 0 2, 1 1 3))", patch.to_string());
    }

    #[test]
    fn test_winding_order() {
        // y grows north: this square runs counter-clockwise.
        let ccw = [ Point(0., 0.), Point(4., 0.), Point(4., 4.), Point(0., 4.), Point(0., 0.) ];
        assert_eq!(WindingOrder::CounterClockwise, winding_order(ccw.iter()));

        let cw: Vec<Point> = ccw.iter().rev().cloned().collect();
        assert_eq!(WindingOrder::Clockwise, winding_order(cw.iter()));
    }

    #[test]
    fn test_no_data() {
        assert!(is_no_data(NO_DATA));
        assert!(!is_no_data(0.));
        assert!(!is_no_data(-12345.));
    }

    #[test]
    fn test_shape_type_round_trip() {
        for code in [ 0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28, 31 ].iter() {
            let shape_type = ShapeType::from_i32(*code).unwrap();
            assert_eq!(*code, shape_type.to_i32());
        }
        assert_eq!(None, ShapeType::from_i32(2));
        assert_eq!(None, ShapeType::from_i32(32));
    }
}
