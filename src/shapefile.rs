//! Iterates over ".shp" and ".dbf" records simultaneously.
//!
//! By shapefile convention, record *i* of the ".shp" file and row *i* of the
//! ".dbf" file describe the same feature. Neither core reader checks that
//! pairing; this module zips the two streams for callers that want it, and
//! complains only when one stream outlives the other.

use std::error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::io;
use encoding;
use dbf;
use geom::Geometry;
use shp;

#[derive(Debug)]
pub enum ShapefileError {
    ShpError(shp::ShpError),
    DbfError(dbf::DbfError),
    JoinError(String),
}

impl error::Error for ShapefileError {
    fn description(&self) -> &str {
        match *self {
            ShapefileError::ShpError(ref err) => err.description(),
            ShapefileError::DbfError(ref err) => err.description(),
            ShapefileError::JoinError(ref description) => description,
        }
    }

    fn cause(&self) -> Option<&error::Error> {
        match *self {
            ShapefileError::ShpError(ref err) => Some(err),
            ShapefileError::DbfError(ref err) => Some(err),
            ShapefileError::JoinError(_) => None,
        }
    }
}

impl fmt::Display for ShapefileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShapefileError::ShpError(ref err) => err.fmt(f),
            ShapefileError::DbfError(ref err) => err.fmt(f),
            ShapefileError::JoinError(ref description) => write!(f, "Join error: {}", description),
        }
    }
}

/// One feature: a geometry and its attribute row, zipped positionally.
#[derive(Debug)]
pub struct ShapefileRecord {
    pub record_number: u32,
    pub geometry: Geometry,
    pub data: dbf::DbfRecord,
}

/// Iterates over ".shp" and ".dbf" records simultaneously.
///
/// # Examples
///
/// ```
/// # extern crate encoding;
/// # extern crate shapefile;
///
/// # fn main() {
///   use std::fs;
///   use std::io;
///   use encoding;
///   use shapefile::geom::{Geometry, Point};
///   use shapefile::dbf::{DbfRecord, DbfValue};
///   use shapefile::shapefile::ShapefileReader;
///
/// # let mut path = std::env::current_dir().unwrap();
/// # path.push("test/simple.shp");
///
///   let shp_f = io::BufReader::new(fs::File::open(&path).unwrap());
///   path.set_extension("dbf");
///   let dbf_f = io::BufReader::new(fs::File::open(&path).unwrap());
///
///   // builder returns Result<ShapefileReader, ShapefileError>
///   let mut reader = ShapefileReader::new(shp_f, dbf_f, encoding::all::UTF_8).unwrap();
///
///   // get_field() method returns Option<DbfField>
///   let foo = reader.get_field("foo").unwrap();
///   assert_eq!(3, foo.length);
///   let foo_index = reader.field_index("foo").unwrap();
///
///   // reader.next(), an Iterator method, returns
///   // Option<Result<ShapefileRecord, ShapefileError>>
///   let record = reader.next().unwrap().unwrap();
///
///   match record.data {
///       DbfRecord::Values(ref values) => {
///           assert_eq!(DbfValue::Text("bar".to_string()), values[foo_index]);
///       }
///       DbfRecord::Deleted => { panic!("record 1 is not deleted") }
///   }
///
///   match record.geometry {
///       Geometry::Polygon(ref polygon) => {
///           assert_eq!(1, polygon.n_rings());
///           assert_eq!(4, polygon.ring(0).len());
///           assert_eq!(Point(295., -249.), polygon.ring(0)[0]);
///       }
///       ref other => { panic!("expected a Polygon, got {}", other) }
///   }
///
///   // this file has two records....
///   let record2 = reader.next();
///   assert!(record2.is_some());
///   assert!(record2.unwrap().is_ok());
///
///   // ...so the iterator stops at number three
///   assert!(reader.next().is_none());
/// # }
/// ```
#[derive(Debug)]
pub struct ShapefileReader<R: io::Read, S: io::Read> {
    shp_reader: shp::ShpReader<R>,
    dbf_reader: dbf::DbfReader<S>,
}

impl<R: io::Read, S: io::Read> ShapefileReader<R, S> {
    pub fn new(r: R, s: S, encoding: encoding::EncodingRef) -> Result<ShapefileReader<R, S>, ShapefileError> {
        match (shp::ShpReader::new(r), dbf::DbfReader::new(s, encoding)) {
            // Check failures
            (Err(err), _) => Err(ShapefileError::ShpError(err)),
            (_, Err(err)) => Err(ShapefileError::DbfError(err)),

            (Ok(shp_reader), Ok(dbf_reader)) => {
                Ok(ShapefileReader {
                    shp_reader: shp_reader,
                    dbf_reader: dbf_reader
                })
            }
        }
    }

    pub fn header(&self) -> &shp::ShpHeader {
        &self.shp_reader.header
    }

    pub fn dbf_meta(&self) -> &dbf::DbfMeta {
        &self.dbf_reader.meta
    }

    pub fn dbf_fields(&self) -> Box<[dbf::DbfField]> {
        self.dbf_reader.meta.fields.clone()
    }

    pub fn get_field(&self, name: &str) -> Option<dbf::DbfField> {
        self.dbf_reader.get_field(name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.dbf_reader.meta.field_index(name)
    }
}

impl<R: io::Read, S: io::Read> Iterator for ShapefileReader<R, S> {
    type Item = Result<ShapefileRecord, ShapefileError>;

    fn next(&mut self) -> Option<Self::Item> {
        match (self.shp_reader.next(), self.dbf_reader.next()) {
            // Check for end of files
            (None, None) => None,
            (Some(_), None) => Some(Err(ShapefileError::JoinError("'.shp' file has more records than '.dbf' file".to_string()))),
            (None, Some(_)) => Some(Err(ShapefileError::JoinError("'.dbf' file has more records than '.shp' file".to_string()))),

            // check for errors
            (Some(Err(err)), _) => Some(Err(ShapefileError::ShpError(err))),
            (_, Some(Err(err))) => Some(Err(ShapefileError::DbfError(err))),

            // we have records!
            (Some(Ok(shape)), Some(Ok(data))) => {
                Some(Ok(ShapefileRecord {
                    record_number: shape.record_number,
                    geometry: shape.geometry,
                    data: data,
                }))
            }
        }
    }
}

/// Open by ".shp" filename.
///
/// This will automatically search for the accompanying ".dbf"; it will fail
/// if that file does not exist.
///
/// # Example
///
/// ```
/// # extern crate encoding;
/// # extern crate shapefile;
///
/// # fn main() {
/// use shapefile::shapefile::open;
/// use encoding;
///
/// # let mut path = std::env::current_dir().unwrap();
/// # path.push("test/simple.shp");
/// let reader = open(&path, encoding::all::UTF_8).unwrap();
///
/// for record in reader {
///     // record is a Result<ShapefileRecord, ShapefileError>
///     println!("{}", record.unwrap().geometry);
/// }
/// # }
/// ```
pub fn open(shp_path: &Path, encoding: encoding::EncodingRef) -> Result<ShapefileReader<io::BufReader<fs::File>, io::BufReader<fs::File>>, ShapefileError> {
    match shp::open(shp_path) {
        Err(err) => Err(ShapefileError::ShpError(err)),
        Ok(shp_reader) => {
            let mut dbf_path = PathBuf::from(shp_path);
            dbf_path.set_extension("dbf");

            match dbf::open(dbf_path.as_path(), encoding) {
                Err(err) => Err(ShapefileError::DbfError(err)),
                Ok(dbf_reader) => {
                    Ok(ShapefileReader {
                        shp_reader: shp_reader,
                        dbf_reader: dbf_reader,
                    })
                }
            }
        }
    }
}

pub fn open_ascii(shp_path: &Path) -> Result<ShapefileReader<io::BufReader<fs::File>, io::BufReader<fs::File>>, ShapefileError> {
    open(shp_path, encoding::all::ASCII)
}

pub fn open_utf8(shp_path: &Path) -> Result<ShapefileReader<io::BufReader<fs::File>, io::BufReader<fs::File>>, ShapefileError> {
    open(shp_path, encoding::all::UTF_8)
}

pub fn open_windows1252(shp_path: &Path) -> Result<ShapefileReader<io::BufReader<fs::File>, io::BufReader<fs::File>>, ShapefileError> {
    open(shp_path, encoding::all::WINDOWS_1252)
}
