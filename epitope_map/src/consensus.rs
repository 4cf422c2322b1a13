// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Alignment-free consensus of an island.  Responses are placed on the island's
// coordinate union by padding with gaps, then each column is voted.

use crate::coords::union_coords;
use epitope_types::Response;
use vector_utils::{count_less, make_freq_ordered};

const GAP: u8 = b'-';

/// Pad each response with gaps so that all line up on the union of the island's
/// coordinates.
pub fn align_peptides(island: &[&Response]) -> Vec<String> {
    let coords = union_coords(island);
    island
        .iter()
        .map(|r| {
            let left = count_less(&coords, &r.start);
            let right = coords.len() - count_less(&coords, &r.end);
            let mut s = String::with_capacity(left + r.seq.len() + right);
            s.extend(std::iter::repeat(GAP as char).take(left));
            s.push_str(&r.seq);
            s.extend(std::iter::repeat(GAP as char).take(right));
            s
        })
        .collect()
}

// Most frequent residue in each column.  With ignore_gaps, a gap wins only a
// column that is all gaps.  Ties go to the residue seen first.

pub fn consensus_peptide(island: &[&Response], ignore_gaps: bool) -> String {
    let align = align_peptides(island);
    let len = align.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut cons = String::with_capacity(len);
    let mut freq = Vec::<(u8, u32)>::new();
    for j in 0..len {
        let col: Vec<u8> = align.iter().filter_map(|s| s.as_bytes().get(j).cloned()).collect();
        make_freq_ordered(&col, &mut freq);
        if ignore_gaps && freq.len() > 1 {
            freq.retain(|(c, _)| *c != GAP);
        }
        let mut best = (GAP, 0);
        for &(c, m) in freq.iter() {
            if m > best.1 {
                best = (c, m);
            }
        }
        cons.push(best.0 as char);
    }
    cons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(start: i32, end: i32, seq: &str) -> Response {
        Response::new("p1", "Env", start, end, seq, "R")
    }

    #[test]
    fn test_align_peptides() {
        let a = resp(0, 9, "KMQKEYALL");
        let b = resp(1, 10, "MQKEYALLD");
        let c = resp(4, 8, "EYAL");
        assert_eq!(
            align_peptides(&[&a, &b, &c]),
            vec!["KMQKEYALL-", "-MQKEYALLD", "----EYAL--"]
        );
        assert!(align_peptides(&[]).is_empty());
    }

    #[test]
    fn test_consensus() {
        let a = resp(0, 9, "KMQKEYALL");
        let b = resp(1, 10, "MQKAYALLD");
        let c = resp(1, 10, "MQKAYALLD");
        assert_eq!(consensus_peptide(&[&a, &b, &c], true), "KMQKAYALLD");
        assert_eq!(consensus_peptide(&[&a, &b, &c], false), "-MQKAYALLD");
        assert_eq!(consensus_peptide(&[], true), "");
    }

    #[test]
    fn test_consensus_ties() {
        // Any residue of maximal frequency is acceptable; this one is the first.
        let a = resp(0, 4, "KMQK");
        let b = resp(0, 4, "KWQK");
        let cons = consensus_peptide(&[&a, &b], true);
        assert!(cons == "KMQK" || cons == "KWQK");
    }
}
