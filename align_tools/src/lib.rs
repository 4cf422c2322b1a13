// Copyright (c) 2018 10X Genomics, Inc. All rights reserved.

// Tools for placing peptides into the coordinate system of a protein multiple
// sequence alignment.  A peptide is matched exactly against the ungapped rows of
// the alignment; coordinates are reported in gapped (alignment column) space.

use fasta_tools::{read_protein_alignment, FastaRecord};
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub const GAP: u8 = b'-';

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// FIND A PEPTIDE IN A GAPPED SEQUENCE
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// Location of a peptide in a gapped sequence.  `seq[start..end]` is `gapped`, which
/// is the peptide with any interior gaps of the sequence retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeptideHit {
    pub start: usize,
    pub end: usize,
    pub gapped: String,
}

// Find pep in seq ignoring gaps, returning gapped coordinates.  The first
// occurrence (in ungapped space) is used.  The start lands on the first matched
// residue, so gaps immediately before the match are not included.  The peptide
// must match exactly; an empty peptide is never found.

pub fn findpeptide(pep: &str, seq: &str) -> Option<PeptideHit> {
    let (p, s) = (pep.as_bytes(), seq.as_bytes());
    if p.is_empty() {
        return None;
    }
    let mut residues = Vec::<u8>::with_capacity(s.len());
    let mut gapped_pos = Vec::<usize>::with_capacity(s.len());
    for (i, c) in s.iter().enumerate() {
        if *c != GAP {
            residues.push(*c);
            gapped_pos.push(i);
        }
    }
    if p.len() > residues.len() {
        return None;
    }
    let ng = residues.windows(p.len()).position(|w| w == p)?;
    let start = gapped_pos[ng];
    let end = gapped_pos[ng + p.len() - 1] + 1;
    Some(PeptideHit {
        start,
        end,
        gapped: seq[start..end].to_string(),
    })
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// REFERENCE ALIGNMENT
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// A read-only reference alignment: named gapped rows, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    names: Vec<String>,
    seqs: Vec<String>,
}

impl Alignment {
    pub fn new(rows: Vec<(String, String)>) -> Alignment {
        let (names, seqs) = rows.into_iter().unzip();
        Alignment { names, seqs }
    }

    pub fn from_records(records: Vec<FastaRecord>) -> Alignment {
        Alignment::new(records.into_iter().map(|r| (r.id, r.seq)).collect())
    }

    pub fn from_fasta<P: AsRef<Path>>(f: P) -> io::Result<Alignment> {
        Ok(Alignment::from_records(read_protein_alignment(f)?))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(self.seqs.iter())
            .map(|(n, s)| (n.as_str(), s.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.rows().find(|(n, _)| *n == name).map(|(_, s)| s)
    }
}

/// An alignment that is read from disk the first time it is asked for and shared
/// thereafter.  It is never modified after loading.
pub struct LazyAlignment {
    path: PathBuf,
    cell: OnceLock<Arc<Alignment>>,
}

impl LazyAlignment {
    pub fn new<P: AsRef<Path>>(path: P) -> LazyAlignment {
        LazyAlignment {
            path: path.as_ref().to_path_buf(),
            cell: OnceLock::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> io::Result<Arc<Alignment>> {
        if let Some(a) = self.cell.get() {
            return Ok(a.clone());
        }
        let a = Arc::new(Alignment::from_fasta(&self.path)?);
        debug!("loaded {} alignment rows from {}", a.len(), self.path.display());
        // If another thread won the race, use its copy.
        let _ = self.cell.set(a);
        Ok(self.cell.get().cloned().unwrap_or_default())
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// REALIGN PEPTIDES
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// One row of realignment output.  A peptide that could not be placed has
/// `align_start == align_end == -1` and empty alignment strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealignedPeptide {
    pub seq: String,
    /// alignment columns under the full peptide, taken from the alignment row
    #[serde(rename = "align seq")]
    pub align_seq: String,
    /// the peptide itself, with the alignment's gaps inserted
    #[serde(rename = "realign seq")]
    pub realign_seq: String,
    /// the gapped match of the sub-peptide that was actually found
    #[serde(rename = "align subseq")]
    pub align_subseq: String,
    #[serde(rename = "matched subseq")]
    pub matched_subseq: String,
    #[serde(rename = "align start")]
    pub align_start: i64,
    #[serde(rename = "align end")]
    pub align_end: i64,
    #[serde(rename = "L")]
    pub len: usize,
    #[serde(rename = "subL")]
    pub sub_len: usize,
    #[serde(rename = "subpos")]
    pub sub_pos: usize,
    #[serde(rename = "align seqs")]
    pub align_seqs: String,
}

impl RealignedPeptide {
    pub fn is_aligned(&self) -> bool {
        self.align_start >= 0
    }

    pub fn matching_names(&self) -> Vec<&str> {
        if self.align_seqs.is_empty() {
            Vec::new()
        } else {
            self.align_seqs.split('|').collect()
        }
    }
}

// Try to place pep[pos..pos+l] in every alignment row, and extend the placement
// outward through the alignment until it covers the whole peptide.  All rows
// that contain the sub-peptide are named; coordinates come from the last one.

fn realign_one(pep: &str, pos: usize, l: usize, alignment: &Alignment) -> RealignedPeptide {
    let p = pep.as_bytes();
    let sub = &pep[pos..pos + l];
    let (before, after) = (&p[..pos], &p[pos + l..]);
    let mut names = Vec::<&str>::new();
    let (mut start, mut end) = (-1_i64, -1_i64);
    let (mut gapped, mut core, mut matched) = (String::new(), Vec::<u8>::new(), String::new());
    for (name, seq) in alignment.rows() {
        let hit = match findpeptide(sub, seq) {
            Some(hit) => hit,
            None => continue,
        };
        let s = seq.as_bytes();
        names.push(name);
        gapped = hit.gapped.clone();
        core = hit.gapped.into_bytes();
        let (mut st, mut en) = (hit.start, hit.end);

        // Extend to the right, stopping at the end of the row.

        let mut added = 0;
        while added < after.len() && en < s.len() {
            if s[en] != GAP {
                core.push(after[added]);
                added += 1;
            } else {
                core.push(GAP);
            }
            en += 1;
        }

        // Extend to the left, stopping at the start of the row.

        let mut added = 0;
        let mut left = Vec::<u8>::new();
        while added < before.len() && st > 0 {
            if s[st - 1] != GAP {
                left.push(before[before.len() - added - 1]);
                added += 1;
            } else {
                left.push(GAP);
            }
            st -= 1;
        }
        left.reverse();
        left.append(&mut core);
        core = left;
        matched = seq[st..en].to_string();
        start = st as i64;
        end = en as i64;
    }
    if names.is_empty() {
        return RealignedPeptide {
            seq: pep.to_string(),
            align_seq: String::new(),
            realign_seq: String::new(),
            align_subseq: String::new(),
            matched_subseq: String::new(),
            align_start: -1,
            align_end: -1,
            len: pep.len(),
            sub_len: l,
            sub_pos: pos,
            align_seqs: String::new(),
        };
    }
    RealignedPeptide {
        seq: pep.to_string(),
        align_seq: matched,
        realign_seq: String::from_utf8_lossy(&core).into_owned(),
        align_subseq: gapped,
        matched_subseq: sub.to_string(),
        align_start: start,
        align_end: end,
        len: pep.len(),
        sub_len: l,
        sub_pos: pos,
        align_seqs: names.iter().format("|").to_string(),
    }
}

// Place one peptide.  The whole peptide is tried first.  If that fails and
// min_len is given, sub-peptides are tried from length len-1 down to min_len,
// left to right at each length, and the first placement found is used.
// Sub-peptides of exactly min_len are tried too, so min_len is the shortest
// length that may be placed rather than one below it.

pub fn realign_peptide(pep: &str, alignment: &Alignment, min_len: Option<usize>) -> RealignedPeptide {
    let n = pep.len();
    let mut out = realign_one(pep, 0, n, alignment);
    if out.is_aligned() || !pep.is_ascii() {
        return out;
    }
    if let Some(min_len) = min_len {
        for k in (min_len.max(1)..n).rev() {
            for pos in 0..=n - k {
                out = realign_one(pep, pos, k, alignment);
                if out.is_aligned() {
                    return out;
                }
            }
        }
    }
    out
}

// Place many peptides, in parallel.  Output order matches input order.

pub fn realign_peptides<S: AsRef<str> + Sync>(
    peptides: &[S],
    alignment: &Alignment,
    min_len: Option<usize>,
) -> Vec<RealignedPeptide> {
    peptides
        .par_iter()
        .map(|p| realign_peptide(p.as_ref(), alignment, min_len))
        .collect()
}
