//! Reads ".shp" geometry files and accompanying ".dbf" attribute files.
//!
//! There is one piece of information ".shp" and ".dbf" files _don't_
//! contain:
//!
//! * The _projection_ isn't specified. Sometimes there's a ".prj" file that
//!   contains that information, but no file format can represent all the
//!   projections out there in the world. This library ignores the file and
//!   returns `f64` points.
//!
//! Both readers pull lazily from caller-supplied streams: records decode
//! one at a time, in one forward pass, and the first malformed byte ends
//! the iteration with an error. Opening and closing the streams is the
//! caller's business.
//!
//! # Examples
//!
//! Open by ".shp" filename:
//!
//! ```
//! # let mut path = std::env::current_dir().unwrap();
//! # path.push("test/simple.shp");
//! let reader = shapefile::open_utf8(&path).unwrap();
//!
//! for record in reader {
//!     // record is a Result<ShapefileRecord, ShapefileError>
//!     println!("{}", record.unwrap().geometry);
//! }
//! ```
//!
//! Open by `io::Read` implementor (works best with `io::BufReader`):
//!
//! ```
//! # extern crate encoding;
//! # extern crate shapefile;
//!
//! # fn main() {
//! use std::fs;
//! use std::io;
//! use shapefile::ShapefileReader;
//! use encoding;
//!
//! # let mut path = std::env::current_dir().unwrap();
//! # path.push("test/simple.shp");
//! let shp_r = io::BufReader::new(fs::File::open(&path).unwrap());
//! path.set_extension("dbf");
//! let dbf_r = io::BufReader::new(fs::File::open(&path).unwrap());
//!
//! let reader = ShapefileReader::new(shp_r, dbf_r, encoding::all::UTF_8).unwrap();
//!
//! for record in reader {
//!     // record is a Result<ShapefileRecord, ShapefileError>
//!     println!("{:?}", record.unwrap());
//! }
//! # }
//! ```
//!
//! Dump DBF data:
//!
//! ```
//! use shapefile::dbf::DbfRecord;
//!
//! # let mut path = std::env::current_dir().unwrap();
//! # path.push("test/simple.shp");
//! let reader = shapefile::open_utf8(&path).unwrap();
//!
//! let fields = reader.dbf_fields();
//!
//! for record_result in reader {
//!     let record = record_result.unwrap();
//!
//!     match record.data {
//!         DbfRecord::Deleted => { println!("(deleted)") }
//!         DbfRecord::Values(ref values) => {
//!             for (field, value) in fields.iter().zip(values.iter()) {
//!                 print!("{}: {}; ", field.name, value);
//!             }
//!             println!("");
//!         }
//!     }
//! }
//! ```

extern crate byteorder;
extern crate encoding;
extern crate itertools;

pub mod geom;
pub mod shp;
pub mod dbf;
pub mod shapefile;

pub use dbf::{DbfField, DbfRecord, DbfValue};
pub use geom::{BoundingBox, Geometry, Point, ShapeType};
pub use shapefile::{ShapefileError, ShapefileReader, ShapefileRecord};
pub use shapefile::{open, open_ascii, open_utf8, open_windows1252};
