//! Reads ESRI ".shp" Shapefile, as per
//! https://www.esri.com/library/whitepapers/pdfs/shapefile.pdf
//!
//! The file is a 100-byte header followed by records, each an 8-byte header
//! (big-endian record number and content length in 16-bit words) and then
//! little-endian shape content. [`ShpReader`](struct.ShpReader.html) walks
//! the records lazily: it owns the stream, advances it strictly forward, and
//! yields each decoded [`Geometry`](../geom/enum.Geometry.html) until the
//! header's declared word count is spent.

use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

use geom::{BoundingBox, Geometry, MultiPatch, MultiPoint, MultiPointM, MultiPointZ, Point,
           PointM, PointZ, PolyLine, PolyLineM, PolyLineZ, Polygon, PolygonM, PolygonZ,
           ShapeType, NO_DATA};

const SHP_HEADER_LENGTH: usize = 100;
const SHP_RECORD_HEADER_LENGTH: usize = 8;
const SHP_MAGIC_NUMBER: u32 = 9994;
const SHP_VERSION: u32 = 1000;
const SHP_POINT_LENGTH: usize = 16;

/// The 50 words (100 bytes) the main file header occupies, already counted
/// in the header's declared file length.
const SHP_HEADER_LENGTH_WORDS: i64 = 50;

#[derive(Debug)]
pub enum ShpError {
    IOError(io::Error),
    /// The main file header (or a record's 8-byte header) ended before its
    /// fixed size was read.
    TruncatedHeader,
    /// A record's content ended mid-shape. Carries the shape type and the
    /// content-relative byte offset at which bytes ran out. A record cut off
    /// before its own 4-byte type code reports `ShapeType::Null`.
    TruncatedRecord(ShapeType, usize),
    /// The record (or header) declared a shape-type code outside the legacy
    /// set. Never skipped: decoding stops here.
    UnknownShapeType(i32),
    ParseError(String),
}

impl error::Error for ShpError {
    fn description(&self) -> &str {
        match *self {
            ShpError::IOError(ref err) => { err.description() },
            ShpError::TruncatedHeader => { "truncated header" },
            ShpError::TruncatedRecord(_, _) => { "truncated record content" },
            ShpError::UnknownShapeType(_) => { "unknown shape type" },
            ShpError::ParseError(ref description) => { description },
        }
    }

    fn cause(&self) -> Option<&error::Error> {
        match *self {
            ShpError::IOError(ref err) => { Some(err) },
            _ => { None },
        }
    }
}

impl fmt::Display for ShpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShpError::IOError(ref err) => { err.fmt(f) },
            ShpError::TruncatedHeader => { write!(f, "Parse error: header cut short") },
            ShpError::TruncatedRecord(shape_type, offset) => {
                write!(f, "Parse error: {} record content cut short at byte {}", shape_type, offset)
            },
            ShpError::UnknownShapeType(code) => {
                write!(f, "Parse error: nonexistent shape type {}", code)
            },
            ShpError::ParseError(ref description) => { write!(f, "Parse error: {}", description) },
        }
    }
}

/// The 100-byte main file header.
#[derive(Debug,Copy,Clone)]
pub struct ShpHeader {
    /// Total file length in 16-bit words, the header's own 50 included.
    pub file_length: u32,
    pub shape_type: ShapeType,
    pub bounding_box: BoundingBox,
    pub z_range: (f64, f64),
    pub m_range: (f64, f64),
}

impl ShpHeader {
    pub fn file_n_bytes(&self) -> usize {
        self.file_length as usize * 2
    }
}

/// One decoded record.
#[derive(Debug,Clone,PartialEq)]
pub struct ShpRecord {
    /// 1-based sequence number from the record header. Informational only.
    pub record_number: u32,
    pub geometry: Geometry,
}

/// Reads until `buf` is full or the stream ends. Returns the number of bytes
/// actually read.
fn read_full<R: io::Read>(file: &mut R, buf: &mut [u8]) -> Result<usize, io::Error> {
    let mut n_read = 0;
    while n_read < buf.len() {
        match file.read(&mut buf[n_read..]) {
            Ok(0) => { break },
            Ok(n) => { n_read += n },
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {},
            Err(err) => { return Err(err) },
        }
    }
    Ok(n_read)
}

/// Reads the first 100 bytes of the file.
///
/// Side-effect: advances the file cursor 100 bytes.
fn read_shp_header<R: io::Read>(file: &mut R) -> Result<ShpHeader, ShpError> {
    let mut buf = [ 0u8; SHP_HEADER_LENGTH ];

    match read_full(file, &mut buf) {
        Err(err) => { Err(ShpError::IOError(err)) },
        Ok(n) if n < SHP_HEADER_LENGTH => { Err(ShpError::TruncatedHeader) },
        Ok(_) => {
            let magic_number = BigEndian::read_u32(&buf[0..4]);
            let file_length = BigEndian::read_u32(&buf[24..28]);
            let version = LittleEndian::read_u32(&buf[28..32]);
            let shape_type_i32 = LittleEndian::read_i32(&buf[32..36]);
            let bounding_box = BoundingBox(
                LittleEndian::read_f64(&buf[36..44]),
                LittleEndian::read_f64(&buf[44..52]),
                LittleEndian::read_f64(&buf[52..60]),
                LittleEndian::read_f64(&buf[60..68]),
            );
            let z_range = (
                LittleEndian::read_f64(&buf[68..76]),
                LittleEndian::read_f64(&buf[76..84]),
            );
            let m_range = (
                LittleEndian::read_f64(&buf[84..92]),
                LittleEndian::read_f64(&buf[92..100]),
            );

            if magic_number != SHP_MAGIC_NUMBER {
                return Err(ShpError::ParseError(format!("File has wrong magic number: found {}, expected {}", magic_number, SHP_MAGIC_NUMBER)));
            }

            if version != SHP_VERSION {
                return Err(ShpError::ParseError(format!("File has wrong version: found {}, expected {}", version, SHP_VERSION)));
            }

            if (file_length as i64) < SHP_HEADER_LENGTH_WORDS {
                return Err(ShpError::ParseError(format!("File header says the file is {} words long, but the header alone is {} words", file_length, SHP_HEADER_LENGTH_WORDS)));
            }

            match ShapeType::from_i32(shape_type_i32) {
                None => { Err(ShpError::UnknownShapeType(shape_type_i32)) },
                Some(shape_type) => {
                    Ok(ShpHeader {
                        file_length: file_length,
                        shape_type: shape_type,
                        bounding_box: bounding_box,
                        z_range: z_range,
                        m_range: m_range,
                    })
                }
            }
        }
    }
}

fn read_bounding_box(buf: &[u8]) -> BoundingBox {
    BoundingBox(
        LittleEndian::read_f64(&buf[0..8]),
        LittleEndian::read_f64(&buf[8..16]),
        LittleEndian::read_f64(&buf[16..24]),
        LittleEndian::read_f64(&buf[24..32]),
    )
}

fn read_points(buf: &[u8], n_points: usize) -> Box<[Point]> {
    let mut points = Vec::<Point>::with_capacity(n_points);
    for chunk in buf[..n_points * SHP_POINT_LENGTH].chunks(SHP_POINT_LENGTH) {
        points.push(Point(
            LittleEndian::read_f64(&chunk[0..8]),
            LittleEndian::read_f64(&chunk[8..16]),
        ));
    }
    points.into_boxed_slice()
}

fn read_f64s(buf: &[u8], n: usize) -> Box<[f64]> {
    let mut values = Vec::<f64>::with_capacity(n);
    for chunk in buf[..n * 8].chunks(8) {
        values.push(LittleEndian::read_f64(chunk));
    }
    values.into_boxed_slice()
}

/// `TruncatedRecord` shorthand used by the per-shape parsers.
fn truncated(shape_type: ShapeType, offset: usize) -> ShpError {
    ShpError::TruncatedRecord(shape_type, offset)
}

/// Box + numParts + numPoints + parts array + points array: the layout
/// PolyLine, Polygon and their M/Z variants all open with.
struct PolyBody {
    bounds: BoundingBox,
    parts: Box<[usize]>,
    points: Box<[Point]>,
    /// Content offset of the first byte after the points array.
    end: usize,
}

fn read_poly_body(buf: &[u8], shape_type: ShapeType, record_number: u32) -> Result<PolyBody, ShpError> {
    if buf.len() < 44 {
        return Err(truncated(shape_type, buf.len()));
    }

    let bounds = read_bounding_box(&buf[4..36]);
    let n_parts = LittleEndian::read_i32(&buf[36..40]);
    let n_points = LittleEndian::read_i32(&buf[40..44]);

    if n_parts <= 0 {
        return Err(ShpError::ParseError(format!("Record number {} has no parts", record_number)));
    }
    if n_points < 0 {
        return Err(ShpError::ParseError(format!("Record number {} has a negative point count", record_number)));
    }

    let n_parts = n_parts as usize;
    let n_points = n_points as usize;

    let points_at = 44 + 4 * n_parts;
    let end = points_at + SHP_POINT_LENGTH * n_points;
    if buf.len() < end {
        return Err(truncated(shape_type, buf.len()));
    }

    let parts: Vec<usize> = buf[44..points_at].chunks(4)
        .map(|b| LittleEndian::read_i32(&b) as usize)
        .collect();

    if parts[0] != 0 {
        return Err(ShpError::ParseError(format!("Record number {} has a first part starting at point {}, expected 0", record_number, parts[0])));
    }
    for i in 1..parts.len() {
        if parts[i] <= parts[i - 1] {
            return Err(ShpError::ParseError(format!("Record number {} has part starts out of order ({} then {})", record_number, parts[i - 1], parts[i])));
        }
    }
    if *parts.last().unwrap() >= n_points {
        return Err(ShpError::ParseError(format!("Record number {} has a part starting at point {}, but there are only {} points in the record", record_number, parts.last().unwrap(), n_points)));
    }

    Ok(PolyBody {
        bounds: bounds,
        parts: parts.into_boxed_slice(),
        points: read_points(&buf[points_at..end], n_points),
        end: end,
    })
}

/// An (min, max) range followed by one f64 per point: the layout of both
/// the Z and M blocks.
fn read_range_block(buf: &[u8], at: usize, n_points: usize, shape_type: ShapeType)
        -> Result<((f64, f64), Box<[f64]>, usize), ShpError> {
    let end = at + 16 + 8 * n_points;
    if buf.len() < end {
        return Err(truncated(shape_type, buf.len()));
    }
    let range = (
        LittleEndian::read_f64(&buf[at..at + 8]),
        LittleEndian::read_f64(&buf[at + 8..at + 16]),
    );
    let values = read_f64s(&buf[at + 16..end], n_points);
    Ok((range, values, end))
}

/// Reverses each part's slice of `values` in place. Polygon rings are stored
/// in the opposite point order from the one OGC output wants, so every ring
/// (and its parallel Z/M values) gets walked last-to-first.
fn reverse_each_part<T>(values: &mut [T], parts: &[usize]) {
    let n = values.len();
    for i in 0..parts.len() {
        let start = parts[i];
        let end = if i + 1 < parts.len() { parts[i + 1] } else { n };
        values[start..end].reverse();
    }
}

fn parse_point(buf: &[u8], shape_type: ShapeType) -> Result<Geometry, ShpError> {
    if buf.len() < 20 {
        return Err(truncated(shape_type, buf.len()));
    }
    Ok(Geometry::Point(Point(
        LittleEndian::read_f64(&buf[4..12]),
        LittleEndian::read_f64(&buf[12..20]),
    )))
}

fn parse_point_m(buf: &[u8], shape_type: ShapeType) -> Result<Geometry, ShpError> {
    if buf.len() < 28 {
        return Err(truncated(shape_type, buf.len()));
    }
    Ok(Geometry::PointM(PointM {
        x: LittleEndian::read_f64(&buf[4..12]),
        y: LittleEndian::read_f64(&buf[12..20]),
        m: LittleEndian::read_f64(&buf[20..28]),
    }))
}

fn parse_point_z(buf: &[u8], shape_type: ShapeType) -> Result<Geometry, ShpError> {
    if buf.len() < 28 {
        return Err(truncated(shape_type, buf.len()));
    }
    // The PointZ layout is X, Y, Z, M -- and writers may omit the trailing
    // M, so a 20-byte body (after the type code) is legal.
    let m = if buf.len() >= 36 {
        LittleEndian::read_f64(&buf[28..36])
    } else {
        NO_DATA
    };
    Ok(Geometry::PointZ(PointZ {
        x: LittleEndian::read_f64(&buf[4..12]),
        y: LittleEndian::read_f64(&buf[12..20]),
        z: LittleEndian::read_f64(&buf[20..28]),
        m: m,
    }))
}

/// Box + numPoints + points: the layout all three MultiPoint variants open
/// with. Returns the points and the content offset just past them.
fn read_multi_point_body(buf: &[u8], shape_type: ShapeType, record_number: u32)
        -> Result<(BoundingBox, Box<[Point]>, usize), ShpError> {
    if buf.len() < 40 {
        return Err(truncated(shape_type, buf.len()));
    }
    let bounds = read_bounding_box(&buf[4..36]);
    let n_points = LittleEndian::read_i32(&buf[36..40]);
    if n_points < 0 {
        return Err(ShpError::ParseError(format!("Record number {} has a negative point count", record_number)));
    }
    let n_points = n_points as usize;
    let end = 40 + SHP_POINT_LENGTH * n_points;
    if buf.len() < end {
        return Err(truncated(shape_type, buf.len()));
    }
    Ok((bounds, read_points(&buf[40..end], n_points), end))
}

fn parse_multi_point(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_multi_point_body(buf, ShapeType::MultiPoint, record_number) {
        Err(err) => { Err(err) },
        Ok((bounds, points, _)) => {
            Ok(Geometry::MultiPoint(MultiPoint { bounds: bounds, points: points }))
        }
    }
}

fn parse_multi_point_m(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_multi_point_body(buf, ShapeType::MultiPointM, record_number) {
        Err(err) => { Err(err) },
        Ok((bounds, points, end)) => {
            match read_range_block(buf, end, points.len(), ShapeType::MultiPointM) {
                Err(err) => { Err(err) },
                Ok((m_range, m, _)) => {
                    Ok(Geometry::MultiPointM(MultiPointM {
                        bounds: bounds,
                        points: points,
                        m_range: m_range,
                        m: m,
                    }))
                }
            }
        }
    }
}

fn parse_multi_point_z(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_multi_point_body(buf, ShapeType::MultiPointZ, record_number) {
        Err(err) => { Err(err) },
        Ok((bounds, points, end)) => {
            match read_range_block(buf, end, points.len(), ShapeType::MultiPointZ) {
                Err(err) => { Err(err) },
                Ok((z_range, z, end)) => {
                    match read_range_block(buf, end, points.len(), ShapeType::MultiPointZ) {
                        Err(err) => { Err(err) },
                        Ok((m_range, m, _)) => {
                            Ok(Geometry::MultiPointZ(MultiPointZ {
                                bounds: bounds,
                                points: points,
                                z_range: z_range,
                                z: z,
                                m_range: m_range,
                                m: m,
                            }))
                        }
                    }
                }
            }
        }
    }
}

fn parse_poly_line(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_poly_body(buf, ShapeType::PolyLine, record_number) {
        Err(err) => { Err(err) },
        Ok(body) => {
            Ok(Geometry::PolyLine(PolyLine {
                bounds: body.bounds,
                parts: body.parts,
                points: body.points,
            }))
        }
    }
}

fn parse_poly_line_m(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_poly_body(buf, ShapeType::PolyLineM, record_number) {
        Err(err) => { Err(err) },
        Ok(body) => {
            match read_range_block(buf, body.end, body.points.len(), ShapeType::PolyLineM) {
                Err(err) => { Err(err) },
                Ok((m_range, m, _)) => {
                    Ok(Geometry::PolyLineM(PolyLineM {
                        bounds: body.bounds,
                        parts: body.parts,
                        points: body.points,
                        m_range: m_range,
                        m: m,
                    }))
                }
            }
        }
    }
}

fn parse_poly_line_z(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_poly_body(buf, ShapeType::PolyLineZ, record_number) {
        Err(err) => { Err(err) },
        Ok(body) => {
            match read_range_block(buf, body.end, body.points.len(), ShapeType::PolyLineZ) {
                Err(err) => { Err(err) },
                Ok((z_range, z, end)) => {
                    match read_range_block(buf, end, body.points.len(), ShapeType::PolyLineZ) {
                        Err(err) => { Err(err) },
                        Ok((m_range, m, _)) => {
                            Ok(Geometry::PolyLineZ(PolyLineZ {
                                bounds: body.bounds,
                                parts: body.parts,
                                points: body.points,
                                z_range: z_range,
                                z: z,
                                m_range: m_range,
                                m: m,
                            }))
                        }
                    }
                }
            }
        }
    }
}

fn parse_polygon(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_poly_body(buf, ShapeType::Polygon, record_number) {
        Err(err) => { Err(err) },
        Ok(body) => {
            let mut points = body.points;
            reverse_each_part(&mut points, &body.parts);
            Ok(Geometry::Polygon(Polygon {
                bounds: body.bounds,
                parts: body.parts,
                points: points,
            }))
        }
    }
}

fn parse_polygon_m(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_poly_body(buf, ShapeType::PolygonM, record_number) {
        Err(err) => { Err(err) },
        Ok(body) => {
            match read_range_block(buf, body.end, body.points.len(), ShapeType::PolygonM) {
                Err(err) => { Err(err) },
                Ok((m_range, m, _)) => {
                    let mut points = body.points;
                    let mut m = m;
                    reverse_each_part(&mut points, &body.parts);
                    reverse_each_part(&mut m, &body.parts);
                    Ok(Geometry::PolygonM(PolygonM {
                        bounds: body.bounds,
                        parts: body.parts,
                        points: points,
                        m_range: m_range,
                        m: m,
                    }))
                }
            }
        }
    }
}

fn parse_polygon_z(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    match read_poly_body(buf, ShapeType::PolygonZ, record_number) {
        Err(err) => { Err(err) },
        Ok(body) => {
            match read_range_block(buf, body.end, body.points.len(), ShapeType::PolygonZ) {
                Err(err) => { Err(err) },
                Ok((z_range, z, end)) => {
                    match read_range_block(buf, end, body.points.len(), ShapeType::PolygonZ) {
                        Err(err) => { Err(err) },
                        Ok((m_range, m, _)) => {
                            let mut points = body.points;
                            let mut z = z;
                            let mut m = m;
                            reverse_each_part(&mut points, &body.parts);
                            reverse_each_part(&mut z, &body.parts);
                            reverse_each_part(&mut m, &body.parts);
                            Ok(Geometry::PolygonZ(PolygonZ {
                                bounds: body.bounds,
                                parts: body.parts,
                                points: points,
                                z_range: z_range,
                                z: z,
                                m_range: m_range,
                                m: m,
                            }))
                        }
                    }
                }
            }
        }
    }
}

fn parse_multi_patch(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    if buf.len() < 44 {
        return Err(truncated(ShapeType::MultiPatch, buf.len()));
    }

    let bounds = read_bounding_box(&buf[4..36]);
    let n_parts = LittleEndian::read_i32(&buf[36..40]);
    let n_points = LittleEndian::read_i32(&buf[40..44]);
    if n_parts < 0 || n_points < 0 {
        return Err(ShpError::ParseError(format!("Record number {} has a negative part or point count", record_number)));
    }
    let n_parts = n_parts as usize;
    let n_points = n_points as usize;

    let types_at = 44 + 4 * n_parts;
    let points_at = types_at + 4 * n_parts;
    let points_end = points_at + SHP_POINT_LENGTH * n_points;
    if buf.len() < points_end {
        return Err(truncated(ShapeType::MultiPatch, buf.len()));
    }

    // Part starts and tags are passed through raw; interpreting the tags
    // (triangle strip/fan, ring kinds) is the caller's business.
    let parts: Vec<usize> = buf[44..types_at].chunks(4)
        .map(|b| LittleEndian::read_i32(&b) as usize)
        .collect();
    let part_types: Vec<i32> = buf[types_at..points_at].chunks(4)
        .map(|b| LittleEndian::read_i32(&b))
        .collect();
    let points = read_points(&buf[points_at..points_end], n_points);

    match read_range_block(buf, points_end, n_points, ShapeType::MultiPatch) {
        Err(err) => { Err(err) },
        Ok((z_range, z, end)) => {
            // The M block is optional on disk.
            let (m_range, m) = if buf.len() >= end + 16 + 8 * n_points {
                match read_range_block(buf, end, n_points, ShapeType::MultiPatch) {
                    Err(err) => { return Err(err) },
                    Ok((m_range, m, _)) => { (Some(m_range), Some(m)) },
                }
            } else {
                (None, None)
            };
            Ok(Geometry::MultiPatch(MultiPatch {
                bounds: bounds,
                parts: parts.into_boxed_slice(),
                part_types: part_types.into_boxed_slice(),
                points: points,
                z_range: z_range,
                z: z,
                m_range: m_range,
                m: m,
            }))
        }
    }
}

/// Decodes one record's content: the 4-byte little-endian type code, then
/// the type's own layout.
///
/// This does not enforce the rule that every record in a file must match
/// the header's declared shape type.
fn parse_record_content(buf: &[u8], record_number: u32) -> Result<Geometry, ShpError> {
    if buf.len() < 4 {
        return Err(truncated(ShapeType::Null, buf.len()));
    }

    let shape_type_i32 = LittleEndian::read_i32(&buf[0..4]);
    match ShapeType::from_i32(shape_type_i32) {
        None => { Err(ShpError::UnknownShapeType(shape_type_i32)) },
        Some(ShapeType::Null) => { Ok(Geometry::Null) },
        Some(ShapeType::Point) => { parse_point(buf, ShapeType::Point) },
        Some(ShapeType::PointM) => { parse_point_m(buf, ShapeType::PointM) },
        Some(ShapeType::PointZ) => { parse_point_z(buf, ShapeType::PointZ) },
        Some(ShapeType::MultiPoint) => { parse_multi_point(buf, record_number) },
        Some(ShapeType::MultiPointM) => { parse_multi_point_m(buf, record_number) },
        Some(ShapeType::MultiPointZ) => { parse_multi_point_z(buf, record_number) },
        Some(ShapeType::PolyLine) => { parse_poly_line(buf, record_number) },
        Some(ShapeType::PolyLineM) => { parse_poly_line_m(buf, record_number) },
        Some(ShapeType::PolyLineZ) => { parse_poly_line_z(buf, record_number) },
        Some(ShapeType::Polygon) => { parse_polygon(buf, record_number) },
        Some(ShapeType::PolygonM) => { parse_polygon_m(buf, record_number) },
        Some(ShapeType::PolygonZ) => { parse_polygon_z(buf, record_number) },
        Some(ShapeType::MultiPatch) => { parse_multi_patch(buf, record_number) },
    }
}

/// Reads the next record from the file, and returns it with its content
/// length in 16-bit words.
///
/// Side effect: advances the file cursor to the next record.
fn read_record<R: io::Read>(file: &mut R) -> Result<(ShpRecord, i64), ShpError> {
    let mut header_buf = [ 0u8; SHP_RECORD_HEADER_LENGTH ];

    match read_full(file, &mut header_buf) {
        Err(err) => { return Err(ShpError::IOError(err)) },
        Ok(n) if n < SHP_RECORD_HEADER_LENGTH => { return Err(ShpError::TruncatedHeader) },
        Ok(_) => {},
    }

    let record_number = BigEndian::read_u32(&header_buf[0..4]);
    let content_length = BigEndian::read_u32(&header_buf[4..8]) as usize;

    let mut buf = vec![ 0u8; content_length * 2 ];
    match read_full(file, &mut buf) {
        Err(err) => { Err(ShpError::IOError(err)) },
        Ok(n) if n < buf.len() => {
            // The stream ran out inside the record: report which shape was
            // being decoded, if we got far enough to know.
            if n >= 4 {
                let code = LittleEndian::read_i32(&buf[0..4]);
                match ShapeType::from_i32(code) {
                    Some(shape_type) => { Err(truncated(shape_type, n)) },
                    None => { Err(ShpError::UnknownShapeType(code)) },
                }
            } else {
                Err(truncated(ShapeType::Null, n))
            }
        },
        Ok(_) => {
            match parse_record_content(&buf, record_number) {
                Err(err) => { Err(err) },
                Ok(geometry) => {
                    let record = ShpRecord {
                        record_number: record_number,
                        geometry: geometry,
                    };
                    Ok((record, content_length as i64))
                }
            }
        }
    }
}

/// Reads an ESRI ".shp" Shapefile, following instructions at
/// https://www.esri.com/library/whitepapers/pdfs/shapefile.pdf
///
/// # Example
///
/// ```
/// use std::fs;
/// use std::io;
/// use shapefile::geom::{Geometry, Point};
/// use shapefile::shp::ShpReader;
///
/// # let mut path = std::env::current_dir().unwrap();
/// # path.push("test/simple.shp");
///
/// let f = fs::File::open(&path).unwrap();
/// let r = io::BufReader::new(f);
///
/// // builder returns Result<ShpReader, ShpError>
/// let mut shp_reader = ShpReader::new(r).unwrap();
///
/// assert_eq!(170, shp_reader.header.file_length);
/// assert_eq!(340, shp_reader.header.file_n_bytes());
///
/// // shp_reader.next(), an Iterator method, returns
/// // Option<Result<ShpRecord, ShpError>>
/// let record = shp_reader.next().unwrap().unwrap();
///
/// match record.geometry {
///     Geometry::Polygon(ref polygon) => {
///         assert_eq!(1, polygon.n_rings());
///         assert_eq!(4, polygon.ring(0).len());
///         assert_eq!(Point(295., -249.), polygon.ring(0)[0]);
///     }
///     ref other => { panic!("expected a Polygon, got {}", other) }
/// }
/// ```
#[derive(Debug)]
pub struct ShpReader<R: io::Read> {
    file: R,
    words_remaining: i64,
    pub header: ShpHeader,
}

impl<R: io::Read> ShpReader<R> {
    pub fn new(mut file: R) -> Result<ShpReader<R>, ShpError> {
        read_shp_header(&mut file).map(move |shp_header| {
            ShpReader::<R> {
                file: file,
                words_remaining: shp_header.file_length as i64 - SHP_HEADER_LENGTH_WORDS,
                header: shp_header,
            }
        })
    }
}

impl<R: io::Read> Iterator for ShpReader<R> {
    type Item = Result<ShpRecord, ShpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.words_remaining <= 0 {
            None
        } else {
            match read_record(&mut self.file) {
                Err(err) => { Some(Err(err)) },
                Ok((record, content_words)) => {
                    // content + the record header's own two 32-bit fields.
                    // The counter may go negative here: the declared file
                    // length is advisory past the last record, and a stream
                    // that actually runs short fails the next read instead.
                    self.words_remaining -= content_words + 4;
                    Some(Ok(record))
                }
            }
        }
    }
}

/// Reads an ESRI ".shp" Shapefile, following instructions at
/// https://www.esri.com/library/whitepapers/pdfs/shapefile.pdf
///
/// # Example
///
/// ```
/// use shapefile::shp;
///
/// # let mut path = std::env::current_dir().unwrap();
/// # path.push("test/simple.shp");
///
/// // builder returns Result<shp::ShpReader, shp::ShpError>
/// let shp_reader = shp::open(&path).unwrap();
///
/// assert_eq!(340, shp_reader.header.file_n_bytes());
/// assert_eq!(2, shp_reader.count());
/// ```
pub fn open(path: &Path) -> Result<ShpReader<io::BufReader<fs::File>>, ShpError> {
    match fs::File::open(path) {
        Err(err) => { Err(ShpError::IOError(err)) },
        Ok(f) => {
            let r = io::BufReader::new(f);
            ShpReader::new(r)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io;
    use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
    use geom::{winding_order, Geometry, Point, ShapeType, WindingOrder, is_no_data};

    fn header_bytes(file_length_words: u32, shape_type: i32) -> Vec<u8> {
        let mut buf = vec![];
        buf.write_u32::<BigEndian>(9994).unwrap();
        for _ in 0..5 {
            buf.write_u32::<BigEndian>(0).unwrap();
        }
        buf.write_u32::<BigEndian>(file_length_words).unwrap();
        buf.write_u32::<LittleEndian>(1000).unwrap();
        buf.write_i32::<LittleEndian>(shape_type).unwrap();
        for _ in 0..8 {
            buf.write_f64::<LittleEndian>(0.).unwrap();
        }
        assert_eq!(100, buf.len());
        buf
    }

    fn record_bytes(record_number: u32, content: &[u8]) -> Vec<u8> {
        assert_eq!(0, content.len() % 2);
        let mut buf = vec![];
        buf.write_u32::<BigEndian>(record_number).unwrap();
        buf.write_u32::<BigEndian>((content.len() / 2) as u32).unwrap();
        buf.extend_from_slice(content);
        buf
    }

    fn point_content(x: f64, y: f64) -> Vec<u8> {
        let mut buf = vec![];
        buf.write_i32::<LittleEndian>(1).unwrap();
        buf.write_f64::<LittleEndian>(x).unwrap();
        buf.write_f64::<LittleEndian>(y).unwrap();
        buf
    }

    /// Box + counts + parts + points content for PolyLine (3), Polygon (5)
    /// and friends.
    fn poly_content(shape_type: i32, parts: &[i32], points: &[(f64, f64)]) -> Vec<u8> {
        let mut buf = vec![];
        buf.write_i32::<LittleEndian>(shape_type).unwrap();
        for _ in 0..4 {
            buf.write_f64::<LittleEndian>(0.).unwrap();
        }
        buf.write_i32::<LittleEndian>(parts.len() as i32).unwrap();
        buf.write_i32::<LittleEndian>(points.len() as i32).unwrap();
        for part in parts {
            buf.write_i32::<LittleEndian>(*part).unwrap();
        }
        for &(x, y) in points {
            buf.write_f64::<LittleEndian>(x).unwrap();
            buf.write_f64::<LittleEndian>(y).unwrap();
        }
        buf
    }

    fn write_range_block(buf: &mut Vec<u8>, min: f64, max: f64, values: &[f64]) {
        buf.write_f64::<LittleEndian>(min).unwrap();
        buf.write_f64::<LittleEndian>(max).unwrap();
        for value in values {
            buf.write_f64::<LittleEndian>(*value).unwrap();
        }
    }

    #[test]
    fn test_point_file_end_to_end() {
        // Header (50 words) + one Point record. The header's declared file
        // length is treated as advisory past the final record.
        let mut bytes = header_bytes(60, 1);
        bytes.extend(record_bytes(1, &point_content(10., 20.)));

        let mut reader = ShpReader::new(io::Cursor::new(bytes)).unwrap();

        let record = reader.next().unwrap().unwrap();
        assert_eq!(1, record.record_number);
        assert_eq!(Geometry::Point(Point(10., 20.)), record.geometry);

        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_exact_word_count() {
        // 50 (header) + 2 * (10 content + 4 record header) = 78 words.
        let mut bytes = header_bytes(78, 1);
        bytes.extend(record_bytes(1, &point_content(1., 2.)));
        bytes.extend(record_bytes(2, &point_content(3., 4.)));

        let reader = ShpReader::new(io::Cursor::new(bytes)).unwrap();
        let records: Vec<_> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(2, records.len());
        assert_eq!(Geometry::Point(Point(3., 4.)), records[1].geometry);
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let mut bytes = header_bytes(50, 1);
        bytes[0] = 0;
        bytes[3] = 42;
        match ShpReader::new(io::Cursor::new(bytes)) {
            Err(ShpError::ParseError(_)) => {},
            other => { panic!("expected ParseError, got {:?}", other) },
        }
    }

    #[test]
    fn test_header_rejects_bad_version() {
        let mut bytes = header_bytes(50, 1);
        bytes[28] = 0xff;
        match ShpReader::new(io::Cursor::new(bytes)) {
            Err(ShpError::ParseError(_)) => {},
            other => { panic!("expected ParseError, got {:?}", other) },
        }
    }

    #[test]
    fn test_header_rejects_unknown_shape_type() {
        let bytes = header_bytes(50, 2);
        match ShpReader::new(io::Cursor::new(bytes)) {
            Err(ShpError::UnknownShapeType(2)) => {},
            other => { panic!("expected UnknownShapeType(2), got {:?}", other) },
        }
    }

    #[test]
    fn test_short_header_is_truncated() {
        let bytes = header_bytes(50, 1);
        match ShpReader::new(io::Cursor::new(&bytes[0..40])) {
            Err(ShpError::TruncatedHeader) => {},
            other => { panic!("expected TruncatedHeader, got {:?}", other) },
        }
    }

    #[test]
    fn test_unknown_record_shape_type() {
        let mut content = vec![];
        content.write_i32::<LittleEndian>(2).unwrap();
        content.write_f64::<LittleEndian>(0.).unwrap();
        content.write_f64::<LittleEndian>(0.).unwrap();

        let mut bytes = header_bytes(64, 1);
        bytes.extend(record_bytes(1, &content));

        let mut reader = ShpReader::new(io::Cursor::new(bytes)).unwrap();
        match reader.next().unwrap() {
            Err(ShpError::UnknownShapeType(2)) => {},
            other => { panic!("expected UnknownShapeType(2), got {:?}", other) },
        }
    }

    #[test]
    fn test_null_record() {
        let mut content = vec![];
        content.write_i32::<LittleEndian>(0).unwrap();

        let mut bytes = header_bytes(56, 0);
        bytes.extend(record_bytes(1, &content));

        let mut reader = ShpReader::new(io::Cursor::new(bytes)).unwrap();
        let record = reader.next().unwrap().unwrap();
        assert_eq!(Geometry::Null, record.geometry);
    }

    #[test]
    fn test_polygon_ring_reversed() {
        // Stored [p0, p1, p2] must decode to [p2, p1, p0].
        let content = poly_content(5, &[ 0 ], &[ (0., 0.), (1., 0.), (1., 1.) ]);
        match parse_record_content(&content, 1).unwrap() {
            Geometry::Polygon(ref polygon) => {
                assert_eq!(
                    &[ Point(1., 1.), Point(1., 0.), Point(0., 0.) ],
                    polygon.ring(0)
                );
            }
            other => { panic!("expected a Polygon, got {}", other) },
        }
    }

    #[test]
    fn test_polygon_winding_flips_to_clockwise() {
        // Stored counter-clockwise (y up); decoding must come out clockwise.
        let stored = [ (0., 0.), (4., 0.), (4., 4.), (0., 4.), (0., 0.) ];
        let content = poly_content(5, &[ 0 ], &stored);
        match parse_record_content(&content, 1).unwrap() {
            Geometry::Polygon(ref polygon) => {
                assert_eq!(WindingOrder::Clockwise, winding_order(polygon.ring(0).iter()));
            }
            other => { panic!("expected a Polygon, got {}", other) },
        }
    }

    #[test]
    fn test_polygon_two_rings_reversed_independently() {
        let content = poly_content(
            5,
            &[ 0, 3 ],
            &[ (0., 0.), (1., 0.), (1., 1.), (5., 5.), (6., 5.), (6., 6.) ],
        );
        match parse_record_content(&content, 1).unwrap() {
            Geometry::Polygon(ref polygon) => {
                assert_eq!(2, polygon.n_rings());
                assert_eq!(&[ Point(1., 1.), Point(1., 0.), Point(0., 0.) ], polygon.ring(0));
                assert_eq!(&[ Point(6., 6.), Point(6., 5.), Point(5., 5.) ], polygon.ring(1));
            }
            other => { panic!("expected a Polygon, got {}", other) },
        }
    }

    #[test]
    fn test_poly_line_parts() {
        let content = poly_content(
            3,
            &[ 0, 2 ],
            &[ (0., 0.), (1., 1.), (2., 2.), (3., 3.), (4., 4.) ],
        );
        match parse_record_content(&content, 1).unwrap() {
            Geometry::PolyLine(ref line) => {
                assert_eq!(2, line.n_parts());
                assert_eq!(2, line.part(0).len());
                assert_eq!(3, line.part(1).len());
                assert_eq!(line.points.len(), line.part(0).len() + line.part(1).len());
                // Lines are not rings: stored order is kept.
                assert_eq!(Point(0., 0.), line.part(0)[0]);
            }
            other => { panic!("expected a PolyLine, got {}", other) },
        }
    }

    #[test]
    fn test_poly_line_rejects_bad_part_starts() {
        // First part must start at 0.
        let content = poly_content(3, &[ 1 ], &[ (0., 0.), (1., 1.) ]);
        match parse_record_content(&content, 1) {
            Err(ShpError::ParseError(_)) => {},
            other => { panic!("expected ParseError, got {:?}", other) },
        }

        // Part starts must strictly increase.
        let content = poly_content(3, &[ 0, 0 ], &[ (0., 0.), (1., 1.) ]);
        match parse_record_content(&content, 1) {
            Err(ShpError::ParseError(_)) => {},
            other => { panic!("expected ParseError, got {:?}", other) },
        }

        // A part may not start past the last point.
        let content = poly_content(3, &[ 0, 2 ], &[ (0., 0.), (1., 1.) ]);
        match parse_record_content(&content, 1) {
            Err(ShpError::ParseError(_)) => {},
            other => { panic!("expected ParseError, got {:?}", other) },
        }
    }

    #[test]
    fn test_poly_line_z() {
        let mut content = poly_content(13, &[ 0 ], &[ (0., 0.), (1., 1.) ]);
        write_range_block(&mut content, 5., 6., &[ 5., 6. ]);
        write_range_block(&mut content, 7., 8., &[ 7., 8. ]);
        match parse_record_content(&content, 1).unwrap() {
            Geometry::PolyLineZ(ref line) => {
                assert_eq!((5., 6.), line.z_range);
                assert_eq!(&[ 5., 6. ], line.part_z(0));
                assert_eq!((7., 8.), line.m_range);
                assert_eq!(&[ 7., 8. ], line.part_m(0));
            }
            other => { panic!("expected a PolyLineZ, got {}", other) },
        }
    }

    #[test]
    fn test_polygon_m_reverses_measures_with_points() {
        let mut content = poly_content(25, &[ 0 ], &[ (0., 0.), (1., 0.), (1., 1.) ]);
        write_range_block(&mut content, 10., 30., &[ 10., 20., 30. ]);
        match parse_record_content(&content, 1).unwrap() {
            Geometry::PolygonM(ref polygon) => {
                assert_eq!(&[ Point(1., 1.), Point(1., 0.), Point(0., 0.) ], polygon.ring(0));
                assert_eq!(&[ 30., 20., 10. ], polygon.ring_m(0));
            }
            other => { panic!("expected a PolygonM, got {}", other) },
        }
    }

    #[test]
    fn test_point_z_without_measure() {
        let mut content = vec![];
        content.write_i32::<LittleEndian>(11).unwrap();
        content.write_f64::<LittleEndian>(1.).unwrap();
        content.write_f64::<LittleEndian>(2.).unwrap();
        content.write_f64::<LittleEndian>(3.).unwrap();
        match parse_record_content(&content, 1).unwrap() {
            Geometry::PointZ(point) => {
                assert_eq!(3., point.z);
                assert!(is_no_data(point.m));
            }
            other => { panic!("expected a PointZ, got {}", other) },
        }
    }

    #[test]
    fn test_point_z_with_measure() {
        let mut content = vec![];
        content.write_i32::<LittleEndian>(11).unwrap();
        for value in [ 1., 2., 3., 4. ].iter() {
            content.write_f64::<LittleEndian>(*value).unwrap();
        }
        match parse_record_content(&content, 1).unwrap() {
            Geometry::PointZ(point) => { assert_eq!(4., point.m) },
            other => { panic!("expected a PointZ, got {}", other) },
        }
    }

    #[test]
    fn test_multi_point() {
        let mut content = vec![];
        content.write_i32::<LittleEndian>(8).unwrap();
        for _ in 0..4 {
            content.write_f64::<LittleEndian>(0.).unwrap();
        }
        content.write_i32::<LittleEndian>(2).unwrap();
        for value in [ 1., 2., 3., 4. ].iter() {
            content.write_f64::<LittleEndian>(*value).unwrap();
        }
        match parse_record_content(&content, 1).unwrap() {
            Geometry::MultiPoint(ref mp) => {
                assert_eq!(&[ Point(1., 2.), Point(3., 4.) ], &*mp.points);
            }
            other => { panic!("expected a MultiPoint, got {}", other) },
        }
    }

    #[test]
    fn test_multi_point_z() {
        let mut content = vec![];
        content.write_i32::<LittleEndian>(18).unwrap();
        for _ in 0..4 {
            content.write_f64::<LittleEndian>(0.).unwrap();
        }
        content.write_i32::<LittleEndian>(2).unwrap();
        for value in [ 1., 2., 3., 4. ].iter() {
            content.write_f64::<LittleEndian>(*value).unwrap();
        }
        write_range_block(&mut content, 9., 10., &[ 9., 10. ]);
        write_range_block(&mut content, 11., 12., &[ 11., 12. ]);
        match parse_record_content(&content, 1).unwrap() {
            Geometry::MultiPointZ(ref mp) => {
                assert_eq!(&[ 9., 10. ], &*mp.z);
                assert_eq!(&[ 11., 12. ], &*mp.m);
            }
            other => { panic!("expected a MultiPointZ, got {}", other) },
        }
    }

    #[test]
    fn test_truncated_record_content() {
        let content = poly_content(3, &[ 0 ], &[ (0., 0.), (1., 1.) ]);
        match parse_record_content(&content[0..50], 1) {
            Err(ShpError::TruncatedRecord(ShapeType::PolyLine, 50)) => {},
            other => { panic!("expected TruncatedRecord, got {:?}", other) },
        }
    }

    #[test]
    fn test_stream_shorter_than_record() {
        let mut bytes = header_bytes(64, 1);
        let record = record_bytes(1, &point_content(10., 20.));
        bytes.extend_from_slice(&record[0..16]); // 8-byte header + 8 of 20 content bytes

        let mut reader = ShpReader::new(io::Cursor::new(bytes)).unwrap();
        match reader.next().unwrap() {
            Err(ShpError::TruncatedRecord(ShapeType::Point, 8)) => {},
            other => { panic!("expected TruncatedRecord, got {:?}", other) },
        }
    }

    #[test]
    fn test_stream_missing_record_header() {
        // The word count says there's another record; the stream disagrees.
        let bytes = header_bytes(64, 1);
        let mut reader = ShpReader::new(io::Cursor::new(bytes)).unwrap();
        match reader.next().unwrap() {
            Err(ShpError::TruncatedHeader) => {},
            other => { panic!("expected TruncatedHeader, got {:?}", other) },
        }
    }

    fn multi_patch_content(with_m: bool) -> Vec<u8> {
        let mut content = vec![];
        content.write_i32::<LittleEndian>(31).unwrap();
        for _ in 0..4 {
            content.write_f64::<LittleEndian>(0.).unwrap();
        }
        content.write_i32::<LittleEndian>(1).unwrap(); // parts
        content.write_i32::<LittleEndian>(3).unwrap(); // points
        content.write_i32::<LittleEndian>(0).unwrap(); // part start
        content.write_i32::<LittleEndian>(0).unwrap(); // part type: triangle strip
        for &(x, y) in [ (0., 0.), (1., 0.), (0., 1.) ].iter() {
            content.write_f64::<LittleEndian>(x).unwrap();
            content.write_f64::<LittleEndian>(y).unwrap();
        }
        write_range_block(&mut content, 1., 3., &[ 1., 2., 3. ]);
        if with_m {
            write_range_block(&mut content, 4., 6., &[ 4., 5., 6. ]);
        }
        content
    }

    #[test]
    fn test_multi_patch_with_measures() {
        match parse_record_content(&multi_patch_content(true), 1).unwrap() {
            Geometry::MultiPatch(ref patch) => {
                assert_eq!(&[ 0 ], &*patch.part_types);
                assert_eq!(&[ 1., 2., 3. ], &*patch.z);
                assert_eq!(Some((4., 6.)), patch.m_range);
            }
            other => { panic!("expected a MultiPatch, got {}", other) },
        }
    }

    #[test]
    fn test_multi_patch_without_measures() {
        match parse_record_content(&multi_patch_content(false), 1).unwrap() {
            Geometry::MultiPatch(ref patch) => {
                assert_eq!((1., 3.), patch.z_range);
                assert_eq!(None, patch.m_range);
                assert_eq!(None, patch.m);
            }
            other => { panic!("expected a MultiPatch, got {}", other) },
        }
    }
}
