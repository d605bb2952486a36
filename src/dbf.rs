//! Reads xbase ".dbf" file, as per
//! https://www.clicketyclick.dk/databases/xbase/format/dbf.html
//!
//! The file is a 32-byte header, a 32-byte descriptor per field, one
//! terminator byte, then fixed-width rows: a deletion-flag byte followed by
//! each field's cell. [`DbfReader`](struct.DbfReader.html) decodes rows
//! lazily into typed [`DbfValue`](enum.DbfValue.html)s, one per descriptor.

use std::collections::HashMap;
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use byteorder::{ByteOrder, LittleEndian};
use encoding;

const DBF_HEADER_LENGTH: usize = 32;
const DBF_FIELD_DESCRIPTOR_LENGTH: usize = 32;
const DBF_DELETION_MARKER: u8 = 0x2a;

#[derive(Debug)]
pub enum DbfError {
    IOError(io::Error),
    /// The 32-byte header or the field-descriptor table ended early.
    TruncatedHeader,
    /// The stream ended before the byte that closes the descriptor table.
    MissingTerminator,
    /// A row holds a field of a type this decoder has no coercion for.
    UnsupportedFieldType(char),
    /// A Logical cell held something other than 1/T/t/Y/y or 0/F/f/N/n.
    InvalidLogicalValue(String),
    ParseError(String),
}

impl error::Error for DbfError {
    fn description(&self) -> &str {
        match *self {
            DbfError::IOError(ref err) => { err.description() },
            DbfError::TruncatedHeader => { "truncated header" },
            DbfError::MissingTerminator => { "missing field-descriptor terminator" },
            DbfError::UnsupportedFieldType(_) => { "unsupported field type" },
            DbfError::InvalidLogicalValue(_) => { "invalid logical value" },
            DbfError::ParseError(ref description) => { description },
        }
    }

    fn cause(&self) -> Option<&error::Error> {
        match *self {
            DbfError::IOError(ref err) => { Some(err) },
            _ => { None },
        }
    }
}

impl fmt::Display for DbfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DbfError::IOError(ref err) => { err.fmt(f) },
            DbfError::TruncatedHeader => { write!(f, "Parse error: header cut short") },
            DbfError::MissingTerminator => { write!(f, "Parse error: missing field-descriptor terminator byte") },
            DbfError::UnsupportedFieldType(code) => { write!(f, "Parse error: unsupported field type '{}'", code) },
            DbfError::InvalidLogicalValue(ref value) => { write!(f, "Parse error: unsupported logical value `{}`", value) },
            DbfError::ParseError(ref description) => { write!(f, "Parse error: {}", description) },
        }
    }
}

/// The one-character type codes a field descriptor can declare.
///
/// Only Character, VarChar, Number, Integer, Float, Double and Logical cells
/// can be coerced; rows holding any other type fail with
/// `UnsupportedFieldType` when decoded.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum FieldType {
    Character,
    Number,
    Logical,
    Date,
    Memo,
    Float,
    Binary,
    General,
    Picture,
    Currency,
    DateTime,
    Integer,
    VariField,
    VarChar,
    Timestamp,
    Double,
    Autoincrement,
    Unknown(u8),
}

impl FieldType {
    pub fn from_u8(b: u8) -> FieldType {
        match b {
            b'C' => FieldType::Character,
            b'N' => FieldType::Number,
            b'L' => FieldType::Logical,
            b'D' => FieldType::Date,
            b'M' => FieldType::Memo,
            b'F' => FieldType::Float,
            b'B' => FieldType::Binary,
            b'G' => FieldType::General,
            b'P' => FieldType::Picture,
            b'Y' => FieldType::Currency,
            b'T' => FieldType::DateTime,
            b'I' => FieldType::Integer,
            b'V' => FieldType::VariField,
            b'X' => FieldType::VarChar,
            b'@' => FieldType::Timestamp,
            b'O' => FieldType::Double,
            b'+' => FieldType::Autoincrement,
            other => FieldType::Unknown(other),
        }
    }

    pub fn code(&self) -> char {
        match *self {
            FieldType::Character => 'C',
            FieldType::Number => 'N',
            FieldType::Logical => 'L',
            FieldType::Date => 'D',
            FieldType::Memo => 'M',
            FieldType::Float => 'F',
            FieldType::Binary => 'B',
            FieldType::General => 'G',
            FieldType::Picture => 'P',
            FieldType::Currency => 'Y',
            FieldType::DateTime => 'T',
            FieldType::Integer => 'I',
            FieldType::VariField => 'V',
            FieldType::VarChar => 'X',
            FieldType::Timestamp => '@',
            FieldType::Double => 'O',
            FieldType::Autoincrement => '+',
            FieldType::Unknown(b) => b as char,
        }
    }
}

/// One 32-byte field descriptor: name (11 bytes, NUL-padded), type code,
/// cell width, decimal count.
#[derive(Debug,Clone,PartialEq)]
pub struct DbfField {
    pub name: String,
    pub field_type: FieldType,
    pub length: u8,
    pub decimal_count: u8,
}

/// One decoded cell.
#[derive(Debug,Clone,PartialEq)]
pub enum DbfValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for DbfValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DbfValue::Text(ref s) => { write!(f, "{}", s) },
            DbfValue::Integer(i) => { write!(f, "{}", i) },
            DbfValue::Float(x) => { write!(f, "{}", x) },
            DbfValue::Boolean(b) => { write!(f, "{}", b) },
        }
    }
}

/// One decoded row. A row whose deletion-flag byte is 0x2A decodes to
/// `Deleted` -- its bytes are consumed and the record counter advances, but
/// there are no values to give back. Callers must not treat it as an error.
#[derive(Debug,Clone,PartialEq)]
pub enum DbfRecord {
    Deleted,
    Values(Box<[DbfValue]>),
}

#[derive(Debug)]
struct DbfHeader {
    version: u8,
    last_update: (u16, u8, u8),
    n_records: usize,
    n_header_bytes: usize,
    n_bytes_per_record: usize,
}

/// Everything the header and descriptor table tell us, read once at open.
pub struct DbfMeta {
    pub version: u8,
    /// Last-update date: year, month, day.
    pub last_update: (u16, u8, u8),
    pub n_records: usize,
    pub n_bytes_per_record: usize,
    pub fields: Box<[DbfField]>,
    field_indices: HashMap<String, usize>,
    encoding: encoding::EncodingRef,
}

// encoding::EncodingRef does not implement std::fmt::Debug
impl fmt::Debug for DbfMeta {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("DbfMeta")
            .field("version", &self.version)
            .field("last_update", &self.last_update)
            .field("n_records", &self.n_records)
            .field("n_bytes_per_record", &self.n_bytes_per_record)
            .field("fields", &self.fields)
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

impl DbfMeta {
    /// Position of the named field, so callers can index into a record's
    /// values. If two fields share a name, the last one wins.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_indices.get(name).map(|i| *i)
    }

    pub fn get_field(&self, name: &str) -> Option<DbfField> {
        self.field_index(name).map(|i| self.fields[i].clone())
    }
}

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

/// Reads the first 32 bytes of the file.
///
/// Side-effect: advances the file cursor 32 bytes.
fn read_dbf_header<R: io::Read>(file: &mut R) -> Result<DbfHeader, DbfError> {
    let mut buf: [ u8; DBF_HEADER_LENGTH ] = [ 0; DBF_HEADER_LENGTH ];

    match read_full(file, &mut buf) {
        Err(err) => { Err(DbfError::IOError(err)) },
        Ok(n) if n < DBF_HEADER_LENGTH => { Err(DbfError::TruncatedHeader) },
        Ok(_) => {
            // It's hard to come up with a ParseError, because virtually any
            // combination of 32 bytes is a valid .dbf header.
            //
            // The one exception: invalid dates. bytes 1-3 (base 0) are "YMD"
            // in hex. All years are valid; there are 12 valid months and 31
            // valid days.
            if buf[2] > 12 || buf[3] > 31 {
                Err(DbfError::ParseError(String::from("The first four bytes of the file mention an invalid creation date. This is not a valid .dbf file.")))
            } else {
                Ok(DbfHeader {
                    version: buf[0],
                    last_update: (1900u16 + buf[1] as u16, buf[2], buf[3]),
                    n_records: LittleEndian::read_u32(&buf[4..]) as usize,
                    n_header_bytes: LittleEndian::read_u16(&buf[8..]) as usize,
                    n_bytes_per_record: LittleEndian::read_u16(&buf[10..]) as usize,
                })
            }
        }
    }
}

/// Trims the 11-byte name cell: everything from the first NUL on is padding,
/// and some writers pad with spaces besides.
fn parse_field_name(buf: &[u8], encoding: encoding::EncodingRef) -> Result<String, DbfError> {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    match encoding.decode(&buf[..end], encoding::DecoderTrap::Replace) {
        Err(err) => { Err(DbfError::ParseError(format!("Cannot decode field name: {}", err))) },
        Ok(name) => { Ok(name.trim().to_string()) },
    }
}

/// Reads all field descriptors plus the terminator byte that follows them.
///
/// Assumes exactly DBF_HEADER_LENGTH bytes of the file have been read
/// already. In other words, call this after read_dbf_header().
///
/// Side-effect: advances the file cursor to the first data record.
fn read_dbf_fields<R: io::Read>(file: &mut R, dbf_header: &DbfHeader, encoding: encoding::EncodingRef)
        -> Result<Box<[DbfField]>, DbfError> {
    if dbf_header.n_header_bytes < DBF_HEADER_LENGTH + 1 {
        return Err(DbfError::ParseError(format!("The file header says the header region is {} bytes, but the fixed header alone is {} bytes", dbf_header.n_header_bytes, DBF_HEADER_LENGTH)));
    }

    let n_fields = (dbf_header.n_header_bytes - DBF_HEADER_LENGTH) / DBF_FIELD_DESCRIPTOR_LENGTH;
    let mut buf = vec![ 0u8; n_fields * DBF_FIELD_DESCRIPTOR_LENGTH ];

    match read_full(file, &mut buf) {
        Err(err) => { return Err(DbfError::IOError(err)) },
        Ok(n) if n < buf.len() => { return Err(DbfError::TruncatedHeader) },
        Ok(_) => {},
    }

    let mut fields = Vec::<DbfField>::with_capacity(n_fields);
    for descriptor in buf.chunks(DBF_FIELD_DESCRIPTOR_LENGTH) {
        let name = match parse_field_name(&descriptor[0..11], encoding) {
            Err(err) => { return Err(err) },
            Ok(name) => { name },
        };
        fields.push(DbfField {
            name: name,
            field_type: FieldType::from_u8(descriptor[11]),
            length: descriptor[16],
            decimal_count: descriptor[17],
        });
    }

    // One terminator byte closes the descriptor table. Its value is not
    // worth checking; its absence is.
    let mut terminator = [ 0u8; 1 ];
    match read_full(file, &mut terminator) {
        Err(err) => { return Err(DbfError::IOError(err)) },
        Ok(0) => { return Err(DbfError::MissingTerminator) },
        Ok(_) => {},
    }

    Ok(fields.into_boxed_slice())
}

/// Reads the header, including field definitions, from a .dbf file.
///
/// Assumes the cursor is at the start of the file.
///
/// Side-effect: advances the file cursor to the first data record.
fn read_dbf_meta<R: io::Read>(file: &mut R, encoding: encoding::EncodingRef) -> Result<DbfMeta, DbfError> {
    read_dbf_header(file).and_then(|dbf_header| {
        read_dbf_fields(file, &dbf_header, encoding).and_then(|dbf_fields| {
            let n_cell_bytes: usize = dbf_fields.iter().map(|f| f.length as usize).sum();
            if dbf_header.n_bytes_per_record != 1 + n_cell_bytes {
                return Err(DbfError::ParseError(format!("The file header says each record is {} bytes, but the deletion flag plus {} field cells take {} bytes", dbf_header.n_bytes_per_record, dbf_fields.len(), 1 + n_cell_bytes)));
            }

            let mut field_indices = HashMap::new();
            for (i, field) in dbf_fields.iter().enumerate() {
                field_indices.insert(field.name.clone(), i);
            }

            Ok(DbfMeta {
                version: dbf_header.version,
                last_update: dbf_header.last_update,
                n_records: dbf_header.n_records,
                n_bytes_per_record: dbf_header.n_bytes_per_record,
                fields: dbf_fields,
                field_indices: field_indices,
                encoding: encoding,
            })
        })
    })
}

fn parse_text_cell(raw: &[u8], field: &DbfField, encoding: encoding::EncodingRef) -> Result<DbfValue, DbfError> {
    match encoding.decode(raw, encoding::DecoderTrap::Replace) {
        Err(err) => { Err(DbfError::ParseError(format!("Cannot decode text field {}: {}", field.name, err))) },
        Ok(s) => { Ok(DbfValue::Text(s.trim().to_string())) },
    }
}

fn parse_integer_cell(raw: &[u8], field: &DbfField) -> Result<DbfValue, DbfError> {
    let s = String::from_utf8_lossy(raw);
    let trimmed = s.trim();
    match trimmed.parse::<i64>() {
        Err(err) => { Err(DbfError::ParseError(format!("Cannot parse integer field {} from `{}`: {}", field.name, trimmed, err))) },
        Ok(i) => { Ok(DbfValue::Integer(i)) },
    }
}

/// Floats get special treatment: malformed numeric cells are common in
/// legacy data, so a cell that won't parse becomes a Text value holding the
/// parse-error description, and the record decodes anyway. This is a
/// deliberately permissive policy; callers wanting strictness must check
/// the variant they get back.
fn parse_float_cell(raw: &[u8]) -> DbfValue {
    let s = String::from_utf8_lossy(raw);
    match s.trim().parse::<f64>() {
        Err(err) => { DbfValue::Text(err.to_string()) },
        Ok(x) => { DbfValue::Float(x) },
    }
}

fn parse_logical_cell(raw: &[u8]) -> Result<DbfValue, DbfError> {
    match raw {
        b"1" | b"T" | b"t" | b"Y" | b"y" => { Ok(DbfValue::Boolean(true)) },
        b"0" | b"F" | b"f" | b"N" | b"n" => { Ok(DbfValue::Boolean(false)) },
        other => { Err(DbfError::InvalidLogicalValue(String::from_utf8_lossy(other).to_string())) },
    }
}

/// Decodes one row's bytes into typed values, one per descriptor.
fn parse_record(buf: &[u8], meta: &DbfMeta) -> Result<DbfRecord, DbfError> {
    if buf[0] == DBF_DELETION_MARKER {
        return Ok(DbfRecord::Deleted);
    }

    let mut values = Vec::<DbfValue>::with_capacity(meta.fields.len());
    let mut offset = 1;

    for field in meta.fields.iter() {
        let raw = &buf[offset..offset + field.length as usize];
        offset += field.length as usize;

        let value = match field.field_type {
            FieldType::Character | FieldType::VarChar => {
                match parse_text_cell(raw, field, meta.encoding) {
                    Err(err) => { return Err(err) },
                    Ok(value) => { value },
                }
            },
            FieldType::Number | FieldType::Integer if field.decimal_count == 0 => {
                match parse_integer_cell(raw, field) {
                    Err(err) => { return Err(err) },
                    Ok(value) => { value },
                }
            },
            // Number/Integer with decimals fall through to the float path.
            FieldType::Number | FieldType::Integer | FieldType::Float | FieldType::Double => {
                parse_float_cell(raw)
            },
            FieldType::Logical => {
                match parse_logical_cell(raw) {
                    Err(err) => { return Err(err) },
                    Ok(value) => { value },
                }
            },
            other => { return Err(DbfError::UnsupportedFieldType(other.code())) },
        };
        values.push(value);
    }

    Ok(DbfRecord::Values(values.into_boxed_slice()))
}

/// Reads an xBase ".dbf" file, following instructions at
/// https://www.clicketyclick.dk/databases/xbase/format/dbf.html
///
/// # Example
///
/// ```
/// # extern crate encoding;
/// # extern crate shapefile;
///
/// # fn main() {
/// use std::fs;
/// use std::io;
/// use shapefile::dbf::{DbfReader, DbfRecord, DbfValue};
/// use encoding;
///
/// # let mut path = std::env::current_dir().unwrap();
/// # path.push("test/simple.dbf");
/// let f = io::BufReader::new(fs::File::open(&path).unwrap());
/// let mut dbf_reader = DbfReader::new(f, encoding::all::UTF_8).unwrap();
///
/// assert_eq!(2, dbf_reader.meta.n_records);
/// assert_eq!(Some(0), dbf_reader.meta.field_index("foo"));
///
/// match dbf_reader.next().unwrap().unwrap() {
///     DbfRecord::Values(ref values) => {
///         assert_eq!(DbfValue::Text("bar".to_string()), values[0]);
///     }
///     DbfRecord::Deleted => { panic!("record 1 is not deleted") }
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct DbfReader<R: io::Read> {
    file: R,
    n_records_already_iterated: usize,
    pub meta: DbfMeta,
}

impl<R: io::Read> DbfReader<R> {
    pub fn new(mut file: R, encoding: encoding::EncodingRef) -> Result<DbfReader<R>, DbfError> {
        read_dbf_meta(&mut file, encoding).map(move |dbf_meta| {
            DbfReader::<R> {
                file: file,
                n_records_already_iterated: 0,
                meta: dbf_meta,
            }
        })
    }

    pub fn get_field(&self, name: &str) -> Option<DbfField> {
        self.meta.get_field(name)
    }
}

impl<R: io::Read> Iterator for DbfReader<R> {
    type Item = Result<DbfRecord, DbfError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.n_records_already_iterated == self.meta.n_records {
            None
        } else {
            // Deleted rows consume their bytes and count against the
            // declared total just like live ones.
            self.n_records_already_iterated += 1;

            let mut buf = vec![ 0u8; self.meta.n_bytes_per_record ];
            match self.file.read_exact(&mut buf) {
                Err(err) => { Some(Err(DbfError::IOError(err))) },
                Ok(_) => { Some(parse_record(&buf, &self.meta)) }
            }
        }
    }
}

/// Opens an xBase ".dbf" file from the filesystem.
///
/// # Example
///
/// ```
/// # extern crate encoding;
/// # extern crate shapefile;
///
/// # fn main() {
/// use shapefile::dbf;
/// use encoding;
///
/// # let mut path = std::env::current_dir().unwrap();
/// # path.push("test/simple.dbf");
/// let dbf_reader = dbf::open(&path, encoding::all::UTF_8).unwrap();
/// for record in dbf_reader {
///     println!("{:?}", record.unwrap());
/// }
/// # }
/// ```
pub fn open(path: &Path, encoding: encoding::EncodingRef) -> Result<DbfReader<io::BufReader<fs::File>>, DbfError> {
    match fs::File::open(path) {
        Err(err) => { Err(DbfError::IOError(err)) },
        Ok(f) => {
            let r = io::BufReader::new(f);
            DbfReader::new(r, encoding)
        }
    }
}

/// Opens an xBase ".dbf" file from the filesystem, decoding text as ASCII.
///
/// # Example
///
/// ```
/// use shapefile::dbf;
///
/// # let mut path = std::env::current_dir().unwrap();
/// # path.push("test/simple.dbf");
/// let dbf_reader = dbf::open_ascii(&path).unwrap();
/// for record in dbf_reader {
///     println!("{:?}", record.unwrap());
/// }
/// ```
pub fn open_ascii(path: &Path) -> Result<DbfReader<io::BufReader<fs::File>>, DbfError> {
    open(path, encoding::all::ASCII)
}
