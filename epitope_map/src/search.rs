// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Find a minimal family of response sets, each explained by one epitope, that
// together cover an island.
//
// 1. Optionally collapse responses with the same (start, end) to one
//    representative.
// 2. Find the sets accepted by the shared rule: every subset (exact), or sets
//    grown from seeds (greedy).
// 3. Delete each set that is strictly contained in another.
// 4. Repeatedly delete the smallest set all of whose members lie in other sets.
// 5. Put the collapsed responses back next to their representatives.

use crate::assemble::bare_desc;
use crate::error::{EpitopeError, Result};
use crate::rules::SharedRule;
use epitope_types::{EpitopeDesc, Response, SearchMode};
use itertools::Itertools;
use log::{debug, warn};
use vector_utils::is_strict_subset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    pub reduce: bool,
    pub mode: SearchMode,
    pub max_island_size: usize,
}

impl Default for SearchParams {
    fn default() -> SearchParams {
        SearchParams {
            reduce: true,
            mode: SearchMode::Exact,
            max_island_size: 20,
        }
    }
}

/// The explaining sets of an island, as indices into the island.  Responses in
/// no set are listed as unexplained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub sets: Vec<Vec<usize>>,
    /// parallel to sets: what the rule made of each set's representatives
    pub descs: Vec<EpitopeDesc>,
    pub unexplained: Vec<usize>,
    /// Exact or Greedy, whichever was actually run.
    pub mode: SearchMode,
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// REDUCTION
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// Representatives of the distinct (start, end) pairs of an island, in order of
/// first appearance, and for each the later responses it stands for.
pub struct Reduction {
    pub keep: Vec<usize>,
    pub redundant: Vec<Vec<usize>>,
}

impl Reduction {
    pub fn new(island: &[&Response], reduce: bool) -> Reduction {
        if !reduce {
            return Reduction {
                keep: (0..island.len()).collect(),
                redundant: vec![Vec::new(); island.len()],
            };
        }
        let mut keep = Vec::<usize>::new();
        let mut redundant = Vec::<Vec<usize>>::new();
        for (i, r) in island.iter().enumerate() {
            let rep = keep
                .iter()
                .position(|&k| island[k].start == r.start && island[k].end == r.end);
            match rep {
                Some(p) => redundant[p].push(i),
                None => {
                    keep.push(i);
                    redundant.push(Vec::new());
                }
            }
        }
        Reduction { keep, redundant }
    }

    // Map a set of representative positions back to island indices.

    pub fn expand(&self, set: &[usize]) -> Vec<usize> {
        let mut x = Vec::<usize>::with_capacity(set.len());
        for &p in set.iter() {
            x.push(self.keep[p]);
            x.extend(self.redundant[p].iter().cloned());
        }
        x
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// CANDIDATE SETS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

fn accepts(rule: &SharedRule, resp: &[&Response], set: &[usize]) -> Result<bool> {
    let group: Vec<&Response> = set.iter().map(|&i| resp[i]).collect();
    Ok(rule.apply(&group)?.is_some())
}

// Every nonempty subset, by increasing size, lexicographic within a size.

fn exact_sets(resp: &[&Response], rule: &SharedRule) -> Result<Vec<Vec<usize>>> {
    let mut sets = Vec::<Vec<usize>>::new();
    for k in 1..=resp.len() {
        for set in (0..resp.len()).combinations(k) {
            if accepts(rule, resp, &set)? {
                sets.push(set);
            }
        }
    }
    Ok(sets)
}

// Take each response not yet covered as a seed, and add every other response,
// in order, that keeps the set acceptable.  Covered responses may be added
// again, which is how floaters arise.

fn greedy_sets(resp: &[&Response], rule: &SharedRule) -> Result<Vec<Vec<usize>>> {
    let n = resp.len();
    let mut covered = vec![false; n];
    let mut sets = Vec::<Vec<usize>>::new();
    for seed in 0..n {
        if covered[seed] {
            continue;
        }
        let mut set = vec![seed];
        for j in 0..n {
            if j == seed {
                continue;
            }
            let mut trial = set.clone();
            let pos = trial.binary_search(&j).unwrap_or_else(|p| p);
            trial.insert(pos, j);
            if accepts(rule, resp, &trial)? {
                set = trial;
            }
        }
        if set.len() > 1 || accepts(rule, resp, &set)? {
            for &i in set.iter() {
                covered[i] = true;
            }
            if !sets.contains(&set) {
                sets.push(set);
            }
        }
    }
    Ok(sets)
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// PRUNING
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Delete every set that is strictly contained in another.  Sets must be sorted.
// A set contained in anything is contained in a maximal set, so it suffices to
// test against the maximal sets found so far, visiting large sets first.  The
// survivors keep their original order.

pub fn remove_subsets(sets: &mut Vec<Vec<usize>>) {
    let mut ids: Vec<usize> = (0..sets.len()).collect();
    ids.sort_by(|&i, &j| sets[j].len().cmp(&sets[i].len()).then(i.cmp(&j)));
    let mut maximal = Vec::<usize>::new();
    for &i in ids.iter() {
        if !maximal.iter().any(|&m| is_strict_subset(&sets[i], &sets[m])) {
            maximal.push(i);
        }
    }
    maximal.sort_unstable();
    let mut out = Vec::<Vec<usize>>::with_capacity(maximal.len());
    for &m in maximal.iter() {
        out.push(std::mem::take(&mut sets[m]));
    }
    *sets = out;
}

// Visit sets from smallest to largest (stable), and delete the first one whose
// members all lie in some other set; start over until nothing is deleted.
// Afterwards every set has a member that no other set has.

pub fn remove_covered(sets: &mut Vec<Vec<usize>>, n: usize) {
    let mut count = vec![0_usize; n];
    for s in sets.iter() {
        for &i in s.iter() {
            count[i] += 1;
        }
    }
    loop {
        let mut ids: Vec<usize> = (0..sets.len()).collect();
        ids.sort_by_key(|&i| sets[i].len());
        let victim = ids
            .into_iter()
            .find(|&i| sets[i].iter().all(|&m| count[m] >= 2));
        match victim {
            Some(v) => {
                for &m in sets[v].iter() {
                    count[m] -= 1;
                }
                sets.remove(v);
            }
            None => break,
        }
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// SEARCH
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

pub fn find_explaining_sets(
    island: &[&Response],
    rule: &SharedRule,
    p: &SearchParams,
) -> Result<Explanation> {
    let red = Reduction::new(island, p.reduce);
    let resp: Vec<&Response> = red.keep.iter().map(|&i| island[i]).collect();
    let n = resp.len();
    let mode = match p.mode {
        SearchMode::Exact if n > p.max_island_size => {
            return Err(EpitopeError::SearchExplosion {
                size: n,
                limit: p.max_island_size,
            });
        }
        SearchMode::Auto if n > p.max_island_size => {
            warn!(
                "island of {} distinct responses is above {}, searching greedily",
                n, p.max_island_size
            );
            SearchMode::Greedy
        }
        SearchMode::Auto => SearchMode::Exact,
        m => m,
    };
    let mut sets = match mode {
        SearchMode::Greedy => greedy_sets(&resp, rule)?,
        _ => exact_sets(&resp, rule)?,
    };
    let accepted = sets.len();
    remove_subsets(&mut sets);
    remove_covered(&mut sets, n);
    debug!(
        "{} responses, {} distinct, {} accepted sets, {} kept",
        island.len(),
        n,
        accepted,
        sets.len()
    );
    let mut descs = Vec::<EpitopeDesc>::with_capacity(sets.len());
    for s in sets.iter() {
        let group: Vec<&Response> = s.iter().map(|&i| resp[i]).collect();
        descs.push(rule.apply(&group)?.unwrap_or_else(|| bare_desc(&group)));
    }
    let sets: Vec<Vec<usize>> = sets.iter().map(|s| red.expand(s)).collect();
    let mut seen = vec![false; island.len()];
    for s in sets.iter() {
        for &i in s.iter() {
            seen[i] = true;
        }
    }
    let unexplained = (0..island.len()).filter(|&i| !seen[i]).collect();
    Ok(Explanation {
        sets,
        descs,
        unexplained,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::OverlapParams;

    const PROTEIN: &str = "ABCDEFGHIJKLMNOPQRSTUVWYZ";

    fn resp(start: i32, end: i32, seq: &str) -> Response {
        Response::new("p1", "Env", start, end, seq, "R")
    }

    // A response that matches the protein exactly.

    fn clean(start: i32, end: i32) -> Response {
        resp(start, end, &PROTEIN[start as usize..end as usize])
    }

    fn overlap(min_overlap: usize, min_shared_aa: usize) -> SharedRule<'static> {
        SharedRule::Overlap(OverlapParams {
            min_overlap,
            min_shared_aa,
        })
    }

    fn exact(reduce: bool) -> SearchParams {
        SearchParams {
            reduce,
            ..SearchParams::default()
        }
    }

    #[test]
    fn test_one_epitope() {
        let a = resp(0, 9, "KMQKEYALL");
        let b = resp(1, 10, "MQKEYALLX");
        let e = find_explaining_sets(&[&a, &b], &overlap(5, 4), &exact(true)).unwrap();
        assert_eq!(e.sets, vec![vec![0, 1]]);
        assert!(e.unexplained.is_empty());
        assert_eq!(e.mode, SearchMode::Exact);
    }

    #[test]
    fn test_floater() {
        let (a, b, c) = (clean(0, 10), clean(5, 15), clean(10, 20));
        let e = find_explaining_sets(&[&a, &b, &c], &overlap(5, 5), &exact(true)).unwrap();
        assert_eq!(e.sets, vec![vec![0, 1], vec![1, 2]]);
        let g = SearchParams {
            mode: SearchMode::Greedy,
            ..SearchParams::default()
        };
        let e = find_explaining_sets(&[&a, &b, &c], &overlap(5, 5), &g).unwrap();
        assert_eq!(e.sets, vec![vec![0, 1], vec![1, 2]]);
        assert_eq!(e.mode, SearchMode::Greedy);
    }

    #[test]
    fn test_covered_set_is_removed() {
        // Every pair shares eight residues but the triple only seven, so the
        // pairs survive subset removal and the first pair is covered by the
        // other two.
        let a = resp(0, 10, "KMQKEYALLD");
        let b = resp(0, 10, "WMFKEYALLD");
        let c = resp(0, 10, "KWFKEYALLD");
        let rule = overlap(10, 8);
        let e = find_explaining_sets(&[&a, &b, &c], &rule, &exact(false)).unwrap();
        assert_eq!(e.sets, vec![vec![0, 2], vec![1, 2]]);

        // With reduction the three collapse onto the first, which alone
        // describes the set.
        let e = find_explaining_sets(&[&a, &b, &c], &rule, &exact(true)).unwrap();
        assert_eq!(e.sets, vec![vec![0, 1, 2]]);
        assert_eq!(e.descs.len(), 1);
        assert_eq!((e.descs[0].seq.as_str(), e.descs[0].start), ("KMQKEYALLD", 0));
    }

    #[test]
    fn test_reduction() {
        let (a, b, c) = (clean(0, 9), clean(1, 10), clean(0, 9));
        let island = [&a, &b, &c];
        let red = Reduction::new(&island, true);
        assert_eq!(red.keep, vec![0, 1]);
        assert_eq!(red.redundant, vec![vec![2], vec![]]);
        assert_eq!(red.expand(&[0, 1]), vec![0, 2, 1]);
        let e = find_explaining_sets(&island, &overlap(5, 4), &exact(true)).unwrap();
        assert_eq!(e.sets, vec![vec![0, 2, 1]]);
    }

    #[test]
    fn test_unexplained() {
        let s = resp(0, 9, "KMQ");
        let e = find_explaining_sets(&[&s], &overlap(8, 6), &exact(true)).unwrap();
        assert!(e.sets.is_empty());
        assert_eq!(e.unexplained, vec![0]);
    }

    #[test]
    fn test_explosion_and_auto() {
        let r: Vec<Response> = (0..4).map(|i| clean(i, i + 10)).collect();
        let island: Vec<&Response> = r.iter().collect();
        let p = SearchParams {
            max_island_size: 3,
            ..SearchParams::default()
        };
        match find_explaining_sets(&island, &overlap(5, 5), &p) {
            Err(EpitopeError::SearchExplosion { size, limit }) => assert_eq!((size, limit), (4, 3)),
            _ => panic!("expected a search explosion"),
        }
        let p = SearchParams {
            mode: SearchMode::Auto,
            ..p
        };
        let e = find_explaining_sets(&island, &overlap(5, 5), &p).unwrap();
        assert_eq!(e.mode, SearchMode::Greedy);
        assert_eq!(e.sets, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_remove_subsets() {
        let mut sets = vec![vec![0], vec![1], vec![0, 1], vec![2], vec![1, 2], vec![0, 1, 2]];
        remove_subsets(&mut sets);
        assert_eq!(sets, vec![vec![0, 1, 2]]);
        let mut sets = vec![vec![0], vec![2], vec![0, 1], vec![1, 2]];
        remove_subsets(&mut sets);
        assert_eq!(sets, vec![vec![0, 1], vec![1, 2]]);
    }

    #[test]
    fn test_complete_and_nonredundant() {
        let mut x: u64 = 777;
        let mut rand = move |m: u64| {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (x >> 33) % m
        };
        let rule = overlap(4, 3);
        for _ in 0..40 {
            let n = 1 + rand(7) as usize;
            let mut r = Vec::<Response>::new();
            for _ in 0..n {
                let start = rand(12) as usize;
                let len = 3 + rand(10) as usize;
                let mut seq: Vec<u8> = PROTEIN.as_bytes()[start..start + len].to_vec();
                if rand(3) == 0 {
                    let k = rand(len as u64) as usize;
                    seq[k] = b'W';
                }
                let seq = String::from_utf8(seq).unwrap();
                r.push(resp(start as i32, (start + len) as i32, &seq));
            }
            let island: Vec<&Response> = r.iter().collect();
            for reduce in [false, true] {
                let e = find_explaining_sets(&island, &rule, &exact(reduce)).unwrap();
                let mut all: Vec<usize> = e.sets.iter().flatten().cloned().collect();
                all.extend(e.unexplained.iter().cloned());
                all.sort_unstable();
                all.dedup();
                assert_eq!(all, (0..n).collect::<Vec<usize>>());
                for (i, s) in e.sets.iter().enumerate() {
                    let mut si = s.clone();
                    si.sort_unstable();
                    assert!(e.unexplained.iter().all(|u| !si.contains(u)));
                    let mut own = false;
                    for &m in s.iter() {
                        let elsewhere = e
                            .sets
                            .iter()
                            .enumerate()
                            .any(|(j, t)| j != i && t.contains(&m));
                        own |= !elsewhere;
                    }
                    assert!(own);
                    for (j, t) in e.sets.iter().enumerate() {
                        let mut tj = t.clone();
                        tj.sort_unstable();
                        assert!(i == j || !is_strict_subset(&si, &tj));
                    }
                }
            }
        }
    }
}
