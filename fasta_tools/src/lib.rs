// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

// Read a fasta file holding a protein multiple sequence alignment.  Sequences may
// contain the gap character '-' and are kept as text, with line breaks removed.
// The record id is the first whitespace-delimited token of the header line.

use io_utils::open_maybe_compressed;
use std::io::{self, BufRead};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub header: String,
    pub seq: String,
}

fn format_failure(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("fasta format failure: {}", what))
}

// Parse fasta records from lines.  Blank lines are ignored.  The first nonblank
// line must be a header.

pub fn parse_fasta_lines<I>(lines: I) -> io::Result<Vec<FastaRecord>>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut records = Vec::<FastaRecord>::new();
    let mut cur: Option<FastaRecord> = None;
    for line in lines {
        let line = line?;
        let s = line.trim_end();
        if s.is_empty() {
            continue;
        }
        if let Some(header) = s.strip_prefix('>') {
            if let Some(r) = cur.take() {
                records.push(r);
            }
            let id = header.split_whitespace().next().unwrap_or("").to_string();
            if id.is_empty() {
                return Err(format_failure("empty header line"));
            }
            cur = Some(FastaRecord {
                id,
                header: header.to_string(),
                seq: String::new(),
            });
        } else {
            match cur.as_mut() {
                Some(r) => r.seq.push_str(s.trim()),
                None => return Err(format_failure("sequence before first header")),
            }
        }
    }
    if let Some(r) = cur {
        records.push(r);
    }
    Ok(records)
}

pub fn parse_fasta_str(contents: &str) -> io::Result<Vec<FastaRecord>> {
    parse_fasta_lines(contents.lines().map(|l| Ok(l.to_string())))
}

// Read a fasta file or gzipped fasta file.  Duplicate ids are an error, since
// alignment rows are looked up by id.

pub fn read_protein_alignment<P: AsRef<Path>>(f: P) -> io::Result<Vec<FastaRecord>> {
    let records = parse_fasta_lines(open_maybe_compressed(&f)?.lines())?;
    for i in 1..records.len() {
        if records[..i].iter().any(|r| r.id == records[i].id) {
            return Err(format_failure(&format!(
                "duplicate id {} in {}",
                records[i].id,
                f.as_ref().display()
            )));
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const ALN: &str = ">B.HXB2 reference\nKMQKE-\nYALL\n\n>C.ZA.x\nKM-QKEYALL\n";

    #[test]
    fn test_parse_alignment() {
        let r = parse_fasta_str(ALN).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].id, "B.HXB2");
        assert_eq!(r[0].header, "B.HXB2 reference");
        assert_eq!(r[0].seq, "KMQKE-YALL");
        assert_eq!(r[1].seq, "KM-QKEYALL");
    }

    #[test]
    fn test_parse_failures() {
        assert!(parse_fasta_str("KMQ\n>a\nKMQ\n").is_err());
        assert!(parse_fasta_str(">\nKMQ\n").is_err());
        assert!(parse_fasta_str("").unwrap().is_empty());
    }

    #[test]
    fn test_read_gz_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let gz = dir.path().join("aln.fasta.gz");
        let mut e = GzEncoder::new(std::fs::File::create(&gz).unwrap(), Compression::default());
        e.write_all(ALN.as_bytes()).unwrap();
        e.finish().unwrap();
        let r = read_protein_alignment(&gz).unwrap();
        assert_eq!(r[1].id, "C.ZA.x");

        let dup = dir.path().join("dup.fasta");
        std::fs::write(&dup, ">a\nKM\n>a\nKM\n").unwrap();
        let err = read_protein_alignment(&dup).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
