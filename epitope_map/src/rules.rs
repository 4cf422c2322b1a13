// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Shared rules.  A shared rule looks at a set of responses and decides whether
// they can all be explained by one epitope.  If so it synthesizes that epitope.
// A rule that is not satisfied returns Ok(None); an Err means the rule could not
// be evaluated at all.

use crate::config::RuleConfig;
use crate::coords::shared_coords;
use crate::error::{EpitopeError, Result};
use binding_rank::{mean, mer_windows, BindingSource};
use epitope_types::{EpitopeDesc, Response, RuleKind};
use vector_utils::distinct_ordered;

const GAP: u8 = b'-';
const MISMATCH: u8 = b'X';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapParams {
    pub min_overlap: usize,
    pub min_shared_aa: usize,
}

impl Default for OverlapParams {
    fn default() -> OverlapParams {
        OverlapParams {
            min_overlap: 8,
            min_shared_aa: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HlaParams {
    pub alleles: Vec<String>,
    pub top_pct: f64,
    pub nmer: Vec<usize>,
    pub use_x: bool,
}

pub enum SharedRule<'a> {
    /// Every response has the same sequence.
    Identical,
    /// Enough shared columns, and enough of them agreeing.
    Overlap(OverlapParams),
    /// Some k-mer of the shared region is a predicted binder, for one allele,
    /// in every response.
    Hla(HlaParams, &'a dyn BindingSource),
}

impl<'a> SharedRule<'a> {
    pub fn from_config(
        c: &RuleConfig,
        binding: Option<&'a dyn BindingSource>,
    ) -> Result<SharedRule<'a>> {
        match c.kind {
            RuleKind::Identical => Ok(SharedRule::Identical),
            RuleKind::Overlap => Ok(SharedRule::Overlap(OverlapParams {
                min_overlap: c.min_overlap,
                min_shared_aa: c.min_shared_aa,
            })),
            RuleKind::Hla => {
                let b = binding.ok_or_else(|| {
                    EpitopeError::Config("the hla rule needs a binding source".to_string())
                })?;
                Ok(SharedRule::Hla(
                    HlaParams {
                        alleles: c.alleles.clone(),
                        top_pct: c.top_pct,
                        nmer: c.nmer.clone(),
                        use_x: c.use_x,
                    },
                    b,
                ))
            }
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            SharedRule::Identical => RuleKind::Identical,
            SharedRule::Overlap(_) => RuleKind::Overlap,
            SharedRule::Hla(..) => RuleKind::Hla,
        }
    }

    pub fn apply(&self, group: &[&Response]) -> Result<Option<EpitopeDesc>> {
        match self {
            SharedRule::Identical => Ok(identical_rule(group)),
            SharedRule::Overlap(p) => Ok(overlap_rule(group, p)),
            SharedRule::Hla(p, b) => hla_rule(group, p, *b),
        }
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// COLUMNS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Distinct residues at a coordinate, in group order.  A response whose sequence
// stops short of the coordinate contributes nothing.

fn column_residues(group: &[&Response], coord: i32) -> Vec<u8> {
    let col: Vec<u8> = group.iter().filter_map(|r| r.residue_at(coord)).collect();
    distinct_ordered(&col)
}

fn push_variant(seq: &mut String, aas: &[u8], use_x: bool) {
    if aas.len() == 1 {
        seq.push(aas[0] as char);
    } else if use_x || aas.is_empty() {
        seq.push(MISMATCH as char);
    } else {
        seq.push('[');
        seq.extend(aas.iter().map(|&c| c as char));
        seq.push(']');
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// THE RULES
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

pub fn identical_rule(group: &[&Response]) -> Option<EpitopeDesc> {
    let first = group.first()?;
    if group.iter().any(|r| r.seq != first.seq) {
        return None;
    }
    Some(EpitopeDesc::new(
        first.seq.clone(),
        first.start,
        first.start + first.seq.len() as i32,
    ))
}

// Walk the shared columns.  A column in which some response has a gap is
// carried as a gap and does not count as overlapping.  Any other column counts
// as overlapping, and as matching if it holds exactly one residue.

pub fn overlap_rule(group: &[&Response], p: &OverlapParams) -> Option<EpitopeDesc> {
    let shared = shared_coords(group);
    let (first, last) = (*shared.first()?, *shared.last()?);
    let (mut n_overlap, mut n_matching) = (0, 0);
    let mut seq = String::with_capacity(shared.len());
    for &c in shared.iter() {
        let aas = column_residues(group, c);
        if aas.contains(&GAP) {
            seq.push(GAP as char);
            continue;
        }
        n_overlap += 1;
        if aas.len() == 1 {
            n_matching += 1;
        }
        push_variant(&mut seq, &aas, true);
    }
    if n_overlap >= p.min_overlap && n_matching >= p.min_shared_aa {
        Some(EpitopeDesc::new(seq, first, last + 1))
    } else {
        None
    }
}

/// The epitope over the shared columns of a group, with no acceptance test.
/// Disagreeing columns become X, or a bracket group of the residues seen.
pub fn overlap_epitope(group: &[&Response], use_x: bool) -> Option<EpitopeDesc> {
    let shared = shared_coords(group);
    let (first, last) = (*shared.first()?, *shared.last()?);
    let mut seq = String::with_capacity(shared.len());
    for &c in shared.iter() {
        push_variant(&mut seq, &column_residues(group, c), use_x);
    }
    Some(EpitopeDesc::new(seq, first, last + 1))
}

// Rank of one response's k-mer over the given coordinates.  A k-mer that runs
// off the response or contains a gap is not scored and keeps rank 1.

fn kmer_rank(
    r: &Response,
    window: &[i32],
    allele: &str,
    binding: &dyn BindingSource,
) -> Result<f64> {
    let mut kmer = String::with_capacity(window.len());
    for &c in window.iter() {
        match r.residue_at(c) {
            Some(GAP) | None => return Ok(1.0),
            Some(aa) => kmer.push(aa as char),
        }
    }
    Ok(binding.rank(allele, &kmer)?)
}

// Among all (window, allele) pairs whose rank is within top_pct for every
// response, take the one with the lowest mean rank; the first wins ties.

pub fn hla_rule(
    group: &[&Response],
    p: &HlaParams,
    binding: &dyn BindingSource,
) -> Result<Option<EpitopeDesc>> {
    let shared = shared_coords(group);
    if shared.is_empty() {
        return Ok(None);
    }
    let windows = mer_windows(&shared, &p.nmer);
    let mut best: Option<(f64, usize, usize)> = None;
    let mut ranks = Vec::<f64>::with_capacity(group.len());
    for (wi, w) in windows.iter().enumerate() {
        for (ai, allele) in p.alleles.iter().enumerate() {
            ranks.clear();
            for r in group.iter() {
                ranks.push(kmer_rank(r, w, allele, binding)?);
            }
            if ranks.iter().all(|&x| x <= p.top_pct) {
                let m = mean(&ranks);
                if best.map_or(true, |(b, _, _)| m < b) {
                    best = Some((m, wi, ai));
                }
            }
        }
    }
    let (_, wi, ai) = match best {
        Some(b) => b,
        None => return Ok(None),
    };
    let w = windows[wi];
    let mut seq = String::with_capacity(w.len());
    for &c in w.iter() {
        push_variant(&mut seq, &column_residues(group, c), p.use_x);
    }
    let mut ep = EpitopeDesc::new(seq, w[0], w[w.len() - 1] + 1);
    ep.hlas.push(p.alleles[ai].clone());
    Ok(Some(ep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use binding_rank::{AffinityRow, AffinityTable};

    fn resp(start: i32, end: i32, seq: &str) -> Response {
        Response::new("p1", "Env", start, end, seq, "R")
    }

    fn overlap(min_overlap: usize, min_shared_aa: usize) -> OverlapParams {
        OverlapParams {
            min_overlap,
            min_shared_aa,
        }
    }

    #[test]
    fn test_identical_rule() {
        let a = resp(20, 29, "ZZZZZZZZZ");
        let b = resp(20, 29, "ZZZZZZZZZ");
        let c = resp(20, 29, "ZZZZYZZZZ");
        let ep = identical_rule(&[&a]).unwrap();
        assert_eq!((ep.seq.as_str(), ep.start, ep.end), ("ZZZZZZZZZ", 20, 29));
        assert!(identical_rule(&[&a, &b]).is_some());
        assert!(identical_rule(&[&a, &c]).is_none());
        assert!(identical_rule(&[]).is_none());
        assert!(SharedRule::Identical.apply(&[&a, &b]).unwrap().is_some());
    }

    #[test]
    fn test_overlap_rule() {
        let a = resp(0, 9, "KMQKEYALL");
        let b = resp(1, 10, "MQKEYALLX");
        let ep = overlap_rule(&[&a, &b], &overlap(5, 4)).unwrap();
        assert_eq!((ep.seq.as_str(), ep.start, ep.end), ("MQKEYALL", 1, 9));

        let c = resp(1, 10, "MQKAYALLX");
        let ep = overlap_rule(&[&a, &c], &overlap(8, 6)).unwrap();
        assert_eq!(ep.seq, "MQKXYALL");
        assert!(overlap_rule(&[&a, &c], &overlap(8, 8)).is_none());
        assert!(overlap_rule(&[&a, &c], &overlap(9, 6)).is_none());
    }

    #[test]
    fn test_overlap_rule_gaps_and_short_sequences() {
        let a = resp(0, 9, "KMQKEYALL");
        let g = resp(1, 10, "MQK-YALLX");
        let ep = overlap_rule(&[&a, &g], &overlap(7, 7)).unwrap();
        assert_eq!(ep.seq, "MQK-YALL");
        assert!(overlap_rule(&[&a, &g], &overlap(8, 6)).is_none());

        // The short response contributes nothing past its own sequence, so the
        // tail columns are matched by the long one alone.
        let s = resp(0, 9, "KMQKE");
        let ep = overlap_rule(&[&a, &s], &overlap(9, 9)).unwrap();
        assert_eq!(ep.seq, "KMQKEYALL");
    }

    #[test]
    fn test_overlap_rule_disjoint() {
        let a = resp(0, 9, "KMQKEYALL");
        let z = resp(20, 29, "ZZZZZZZZZ");
        assert!(overlap_rule(&[&a, &z], &overlap(0, 0)).is_none());
        assert!(overlap_rule(&[], &overlap(0, 0)).is_none());
        assert!(overlap_epitope(&[&a, &z], true).is_none());
    }

    #[test]
    fn test_overlap_rule_monotonic() {
        let a = resp(0, 12, "KMQKEYALLDLW");
        let b = resp(2, 14, "QKAYALL-LWEE");
        let c = resp(3, 12, "KEYGLLDLW");
        for group in [vec![&a, &b], vec![&a, &c], vec![&b, &c], vec![&a, &b, &c]] {
            for o in 0..12 {
                for m in 0..12 {
                    if overlap_rule(&group, &overlap(o, m)).is_some() {
                        for o2 in 0..=o {
                            for m2 in 0..=m {
                                assert!(overlap_rule(&group, &overlap(o2, m2)).is_some());
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_overlap_epitope() {
        let a = resp(0, 9, "KMQKEYALL");
        let c = resp(1, 10, "MQKAYALLX");
        let ep = overlap_epitope(&[&a, &c], true).unwrap();
        assert_eq!((ep.seq.as_str(), ep.start, ep.end), ("MQKXYALL", 1, 9));
        let ep = overlap_epitope(&[&a, &c], false).unwrap();
        assert_eq!(ep.seq, "MQK[EA]YALL");
        assert!(ep.hlas.is_empty());
    }

    fn binding() -> AffinityTable {
        let mut t = AffinityTable::new(vec![
            AffinityRow {
                allele: "A".to_string(),
                peptide: "MQKEYALL".to_string(),
                ic50: 5.0,
            },
            AffinityRow {
                allele: "B".to_string(),
                peptide: "MQKEYALL".to_string(),
                ic50: 50.0,
            },
        ])
        .unwrap();
        let dist: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        t.set_reference("A", dist.clone());
        t.set_reference("B", dist);
        t
    }

    fn hla(alleles: &[&str]) -> HlaParams {
        HlaParams {
            alleles: alleles.iter().map(|a| a.to_string()).collect(),
            top_pct: 0.1,
            nmer: vec![8, 9, 10],
            use_x: true,
        }
    }

    #[test]
    fn test_hla_rule() {
        let t = binding();
        let a = resp(0, 9, "KMQKEYALL");
        let b = resp(1, 10, "MQKEYALLD");
        let ep = hla_rule(&[&a, &b], &hla(&["B", "A"]), &t).unwrap().unwrap();
        assert_eq!((ep.seq.as_str(), ep.start, ep.end), ("MQKEYALL", 1, 9));
        assert_eq!(ep.hlas, vec!["A".to_string()]);
        assert!(hla_rule(&[&a, &b], &hla(&["B"]), &t).unwrap().is_none());

        let rule = SharedRule::Hla(hla(&["A"]), &t);
        assert_eq!(rule.kind(), RuleKind::Hla);
        assert!(rule.apply(&[&a, &b]).unwrap().is_some());
    }

    #[test]
    fn test_hla_rule_ties() {
        // A and C bind equally well, so the allele listed first is taken.
        let mut t = AffinityTable::new(vec![
            AffinityRow {
                allele: "A".to_string(),
                peptide: "MQKEYALL".to_string(),
                ic50: 5.0,
            },
            AffinityRow {
                allele: "C".to_string(),
                peptide: "MQKEYALL".to_string(),
                ic50: 5.0,
            },
        ])
        .unwrap();
        let dist: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        t.set_reference("A", dist.clone());
        t.set_reference("C", dist);
        let a = resp(0, 9, "KMQKEYALL");
        let b = resp(1, 10, "MQKEYALLD");
        let ep = hla_rule(&[&a, &b], &hla(&["C", "A"]), &t).unwrap().unwrap();
        assert_eq!(ep.hlas, vec!["C".to_string()]);
        let ep = hla_rule(&[&a, &b], &hla(&["A", "C"]), &t).unwrap().unwrap();
        assert_eq!(ep.hlas, vec!["A".to_string()]);
        assert_eq!((ep.start, ep.end), (1, 9));
    }

    #[test]
    fn test_hla_rule_gaps_and_misses() {
        let t = binding();
        let a = resp(0, 9, "KMQKEYALL");
        let g = resp(1, 10, "MQK-YALLD");
        assert!(hla_rule(&[&a, &g], &hla(&["A"]), &t).unwrap().is_none());
        match hla_rule(&[&a], &hla(&["C"]), &t) {
            Err(EpitopeError::MissingAffinity { allele, .. }) => assert_eq!(allele, "C"),
            _ => panic!("expected a missing affinity"),
        }
    }

    #[test]
    fn test_from_config() {
        let mut c = RuleConfig::default();
        assert_eq!(SharedRule::from_config(&c, None).unwrap().kind(), RuleKind::Overlap);
        c.kind = RuleKind::Hla;
        c.alleles = vec!["A".to_string()];
        assert!(SharedRule::from_config(&c, None).is_err());
        let t = binding();
        let b: &dyn BindingSource = &t;
        assert_eq!(SharedRule::from_config(&c, Some(b)).unwrap().kind(), RuleKind::Hla);
    }
}
