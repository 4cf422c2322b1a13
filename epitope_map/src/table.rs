// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Reading and writing tables.  Inputs may be gzipped or lz4-compressed; outputs
// are plain csv with fixed column names.

use crate::error::Result;
use epitope_types::Response;
use io_utils::{open_maybe_compressed, read_lines_maybe_compressed};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub fn read_responses<P: AsRef<Path>>(path: P) -> Result<Vec<Response>> {
    let rdr = open_maybe_compressed(path)?;
    read_responses_from(rdr)
}

pub fn read_responses_from<R: std::io::Read>(rdr: R) -> Result<Vec<Response>> {
    let mut csv = csv::Reader::from_reader(rdr);
    let mut responses = Vec::<Response>::new();
    for r in csv.deserialize() {
        responses.push(r?);
    }
    Ok(responses)
}

pub fn write_rows_to<W: Write, T: Serialize>(w: W, rows: &[T]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(w);
    for r in rows.iter() {
        csv.serialize(r)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_rows<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    let f = std::fs::File::create(path)?;
    write_rows_to(std::io::BufWriter::new(f), rows)
}

// One peptide per line; blank lines are skipped.

pub fn read_peptides<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    Ok(read_lines_maybe_compressed(path)?
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use epitope_types::EpitopePair;

    #[test]
    fn test_read_responses() {
        let data = "ptid,protein,start,end,seq,RespID\n\
                    p1,Env,0,9,KMQKEYALL,R0\n\
                    p1,Env,1,10,MQKEYALLX,R1\n";
        let r = read_responses_from(data.as_bytes()).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r[1], Response::new("p1", "Env", 1, 10, "MQKEYALLX", "R1"));

        let data = "ptid,protein,start,end,seq,RespID,align seq\n\
                    p1,Env,0,9,KMQKEYALL,R0,KMQ-KEYALL\n\
                    p1,Env,1,10,MQKEYALLX,R1,\n";
        let r = read_responses_from(data.as_bytes()).unwrap();
        assert_eq!(r[0].align_seq.as_deref(), Some("KMQ-KEYALL"));
        assert_eq!(r[1].align_seq, None);

        let bad = "ptid,protein,start,end,seq,RespID\np1,Env,zero,9,KMQKEYALL,R0\n";
        assert!(read_responses_from(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_write_rows() {
        let rows = vec![EpitopePair {
            ptid: "p1".to_string(),
            island_id: "I0".to_string(),
            resp_id: "R0".to_string(),
            ep_id: "E0".to_string(),
            ep_seq: "MQKEYALL".to_string(),
            ep_start: 1,
            ep_end: 9,
            hlas: String::new(),
            floater: 0,
        }];
        let mut out = Vec::<u8>::new();
        write_rows_to(&mut out, &rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ptid,IslandID,RespID,EpID,EpSeq,EpStart,EpEnd,hlas,Floater\n\
             p1,I0,R0,E0,MQKEYALL,1,9,,0\n"
        );
    }

    #[test]
    fn test_files() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("peptides.txt");
        std::fs::write(&f, "KMQKEYALL\n\n  MQKEYALLX \n").unwrap();
        assert_eq!(read_peptides(&f).unwrap(), vec!["KMQKEYALL", "MQKEYALLX"]);

        let r = vec![Response::new("p1", "Env", 0, 9, "KMQKEYALL", "R0")];
        let g = dir.path().join("responses.csv");
        write_rows(&g, &r).unwrap();
        assert_eq!(read_responses(&g).unwrap(), r);
    }
}
