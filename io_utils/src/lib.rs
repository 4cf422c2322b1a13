// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

// This file contains miscellaneous utilities for input and output.

extern crate flate2;
extern crate lz4;

use flate2::read::MultiGzDecoder;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// WRITE STUFF
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// fwriteln! is writeln! into an in-memory log (a Vec<u8> or String), where a
// write cannot fail, so the result is discarded.  fwrite! similar.

#[macro_export]
macro_rules! fwriteln {
    ($f:expr, $u:expr) => {
        let _ = writeln!( $f, $u );
    };
    ($f:expr, $u:expr, $($x:tt)*) => {
        let _ = writeln!( $f, $u, $($x)* );
    };
}

#[macro_export]
macro_rules! fwrite {
    ($f:expr, $u:expr) => {
        let _ = write!( $f, $u );
    };
    ($f:expr, $u:expr, $($x:tt)*) => {
        let _ = write!( $f, $u, $($x)* );
    };
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// OPEN FILES
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

pub fn open_lz4<P: AsRef<Path>>(filename: P) -> io::Result<lz4::Decoder<File>> {
    let f = File::open(filename)?;
    lz4::Decoder::new(f)
}

// Open a file for reading, decompressing on the fly if the name ends in .gz or
// .lz4.  Errors name the file.

pub fn open_maybe_compressed<P: AsRef<Path>>(filename: P) -> io::Result<Box<dyn BufRead>> {
    let path = filename.as_ref();
    let named = |e: io::Error| io::Error::new(e.kind(), format!("{}: {}", path.display(), e));
    let r: Box<dyn Read> = match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Box::new(MultiGzDecoder::new(File::open(path).map_err(named)?)),
        Some("lz4") => Box::new(open_lz4(path).map_err(named)?),
        _ => Box::new(File::open(path).map_err(named)?),
    };
    Ok(Box::new(BufReader::new(r)))
}

// Read all lines of a possibly compressed file.

pub fn read_lines_maybe_compressed<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
    let mut lines = Vec::<String>::new();
    for line in open_maybe_compressed(filename)?.lines() {
        lines.push(line?);
    }
    Ok(lines)
}
