// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Bracket notation for sets of aligned peptides.  Each column is written as its
// residue if all peptides agree, else as a bracket group of the residues seen,
// e.g. K[MK][QV]KEY.  Decoding takes the full cross product of the groups, so it
// can yield peptides that were never encoded.

use crate::error::{EpitopeError, Result};
use vector_utils::distinct_ordered;

pub fn encode_variants<S: AsRef<str>>(peps: &[S]) -> Result<String> {
    let peps: Vec<&[u8]> = peps
        .iter()
        .map(|p| p.as_ref().as_bytes())
        .filter(|p| !p.is_empty())
        .collect();
    let len = match peps.first() {
        Some(p) => p.len(),
        None => return Ok(String::new()),
    };
    if peps.iter().any(|p| p.len() != len) {
        return Err(EpitopeError::UnequalLengths(
            peps.iter().map(|p| p.len()).collect(),
        ));
    }
    let mut out = String::new();
    for j in 0..len {
        let col: Vec<u8> = peps.iter().map(|p| p[j]).collect();
        let v = distinct_ordered(&col);
        if v.len() == 1 {
            out.push(v[0] as char);
        } else {
            out.push('[');
            out.extend(v.iter().map(|&c| c as char));
            out.push(']');
        }
    }
    Ok(out)
}

pub fn decode_variants(s: &str) -> Result<Vec<String>> {
    let malformed = || EpitopeError::MalformedVariant(s.to_string());
    let mut groups = Vec::<Vec<char>>::new();
    let mut cur: Option<Vec<char>> = None;
    for c in s.chars() {
        match c {
            '[' => {
                if cur.is_some() {
                    return Err(malformed());
                }
                cur = Some(Vec::new());
            }
            ']' => match cur.take() {
                Some(g) if !g.is_empty() => groups.push(g),
                _ => return Err(malformed()),
            },
            c => match cur.as_mut() {
                Some(g) => g.push(c),
                None => groups.push(vec![c]),
            },
        }
    }
    if cur.is_some() {
        return Err(malformed());
    }
    if groups.is_empty() {
        return Ok(Vec::new());
    }
    let peps = groups.iter().fold(vec![String::new()], |acc, g| {
        let mut next = Vec::<String>::with_capacity(acc.len() * g.len());
        for p in acc.iter() {
            for &c in g.iter() {
                let mut q = p.clone();
                q.push(c);
                next.push(q);
            }
        }
        next
    });
    Ok(peps)
}

// Number of differing positions, over the length of the shorter string.

pub fn hamming(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).filter(|(x, y)| x != y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let peps = ["KMQKEYALL", "KKQKEYALL", "KMVKEYHAL"];
        assert_eq!(encode_variants(&peps).unwrap(), "K[MK][QV]KEY[AH][LA]L");
        assert_eq!(encode_variants(&["KMQ", "", "KMQ"]).unwrap(), "KMQ");
        assert_eq!(encode_variants::<&str>(&[]).unwrap(), "");
        match encode_variants(&["KMQ", "KM"]) {
            Err(EpitopeError::UnequalLengths(l)) => assert_eq!(l, vec![3, 2]),
            _ => panic!("expected unequal lengths"),
        }
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode_variants("KMQ").unwrap(), vec!["KMQ"]);
        assert_eq!(
            decode_variants("K[MW]Q[AB]").unwrap(),
            vec!["KMQA", "KMQB", "KWQA", "KWQB"]
        );
        assert!(decode_variants("").unwrap().is_empty());
        for bad in ["K[MW", "KM]", "K[M[W]]", "K[]Q"] {
            assert!(decode_variants(bad).is_err());
        }
    }

    #[test]
    fn test_decode_contains_encoded() {
        let sets: Vec<Vec<&str>> = vec![
            vec!["KMQKEYALL", "KKQKEYALL", "KMVKEYHAL"],
            vec!["SLYNTVATL", "SLYNTVATL"],
            vec!["A", "C", "D", "E"],
            vec!["GAGAG", "GCGCG", "TATAT"],
        ];
        for peps in sets.iter() {
            let all = decode_variants(&encode_variants(peps.as_slice()).unwrap()).unwrap();
            for p in peps.iter() {
                assert!(all.iter().any(|q| q == p));
            }
        }
        // Lossy: two peptides with two differing columns decode to four.
        let all = decode_variants(&encode_variants(&["AA", "CC"]).unwrap()).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_hamming() {
        assert_eq!(hamming("KMQKEYALL", "KMQKEYALL"), 0);
        assert_eq!(hamming("KMQKEYALL", "KWQKEYHLL"), 2);
        assert_eq!(hamming("KMQ", "KWQKEY"), 1);
    }
}
