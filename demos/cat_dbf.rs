extern crate shapefile;

use std::env;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use shapefile::dbf;

fn main() {
    let mut args = env::args();

    if args.len() != 2 {
        writeln!(&mut io::stderr(), "Usage: {} <DBF_PATH>", args.next().unwrap()).unwrap();
        process::exit(1);
    }

    args.next();
    let path = PathBuf::from(args.next().unwrap());

    match dbf::open_ascii(&path) {
        Err(err) => {
            writeln!(&mut io::stderr(), "{}", err).unwrap();
            process::exit(1);
        }
        Ok(reader) => {
            let fields = reader.meta.fields.clone();

            for record_result in reader {
                match record_result {
                    Err(err) => {
                        writeln!(&mut io::stderr(), "Error during read: {}", err).unwrap();
                        process::exit(1);
                    }
                    Ok(dbf::DbfRecord::Deleted) => {
                        println!("(deleted)");
                    }
                    Ok(dbf::DbfRecord::Values(ref values)) => {
                        for (field, value) in fields.iter().zip(values.iter()) {
                            print!("{}: {}; ", field.name, value);
                        }
                        println!("");
                    }
                }
            }
        }
    }
}
