// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Coordinate sets of responses and epitopes.  A coordinate set is a sorted
// vector of reference positions, so the set operations in vector_utils apply.

use crate::error::{EpitopeError, Result};
use epitope_types::{CoordMode, EpitopeDesc, Response};
use vector_utils::{intersect_with, union};

// Check that a response describes a nonempty, nonnegative interval.

pub fn validate(r: &Response) -> Result<()> {
    let reason = if r.start < 0 {
        Some(format!("start {} is negative", r.start))
    } else if r.end <= r.start {
        Some(format!("end {} is not after start {}", r.end, r.start))
    } else {
        None
    };
    match reason {
        Some(reason) => Err(EpitopeError::MalformedResponse {
            ptid: r.ptid.clone(),
            resp_id: r.resp_id.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

// Coordinates of a response.  Response space runs start..end; plot space runs
// start..start+len(seq), which does not drift when an indel shifts end.

pub fn resp_coords(r: &Response, mode: CoordMode) -> Vec<i32> {
    match mode {
        CoordMode::Response => (r.start..r.end).collect(),
        CoordMode::Plot => (r.start..r.start + r.seq.len() as i32).collect(),
    }
}

pub fn ep_coords(ep: &EpitopeDesc, mode: CoordMode) -> Vec<i32> {
    match mode {
        CoordMode::Response => (ep.start..ep.end).collect(),
        CoordMode::Plot => (ep.start..ep.start + ep.seq.len() as i32).collect(),
    }
}

pub fn coord_overlap(start1: i32, end1: i32, start2: i32, end2: i32) -> Vec<i32> {
    (start1.max(start2)..end1.min(end2)).collect()
}

/// True if two responses are on the same protein and share a coordinate.
pub fn overlap(r1: &Response, r2: &Response) -> bool {
    r1.protein == r2.protein
        && r1.start < r1.end
        && r2.start < r2.end
        && r1.start < r2.end
        && r2.start < r1.end
}

// Coordinates covered by every member of a group; empty for an empty group.

pub fn shared_coords(group: &[&Response]) -> Vec<i32> {
    let mut sc = match group.first() {
        Some(r) => resp_coords(r, CoordMode::Response),
        None => return Vec::new(),
    };
    for r in group[1..].iter() {
        intersect_with(&mut sc, &resp_coords(r, CoordMode::Response));
    }
    sc
}

// Coordinates covered by any member of a group.

pub fn union_coords(group: &[&Response]) -> Vec<i32> {
    let mut uc = Vec::<i32>::new();
    let mut z = Vec::<i32>::new();
    for r in group.iter() {
        union(&uc, &resp_coords(r, CoordMode::Response), &mut z);
        std::mem::swap(&mut uc, &mut z);
    }
    uc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(protein: &str, start: i32, end: i32, seq: &str) -> Response {
        Response::new("p1", protein, start, end, seq, "R")
    }

    #[test]
    fn test_coords() {
        let r = resp("Env", 3, 7, "ABCDE");
        assert_eq!(resp_coords(&r, CoordMode::Response), vec![3, 4, 5, 6]);
        assert_eq!(resp_coords(&r, CoordMode::Plot), vec![3, 4, 5, 6, 7]);
        let ep = EpitopeDesc::new("QK".to_string(), 10, 13);
        assert_eq!(ep_coords(&ep, CoordMode::Response), vec![10, 11, 12]);
        assert_eq!(ep_coords(&ep, CoordMode::Plot), vec![10, 11]);
        assert_eq!(coord_overlap(0, 9, 5, 12), vec![5, 6, 7, 8]);
        assert!(coord_overlap(0, 5, 5, 12).is_empty());
    }

    #[test]
    fn test_overlap() {
        let a = resp("Env", 0, 9, "KMQKEYALL");
        let b = resp("Env", 8, 12, "LDLW");
        let c = resp("Env", 9, 12, "DLW");
        let d = resp("Gag", 0, 9, "KMQKEYALL");
        assert!(overlap(&a, &b));
        assert!(overlap(&b, &a));
        assert!(!overlap(&a, &c));
        assert!(!overlap(&a, &d));
    }

    #[test]
    fn test_shared_and_union() {
        let a = resp("Env", 0, 9, "KMQKEYALL");
        let b = resp("Env", 1, 10, "MQKEYALLX");
        let c = resp("Env", 5, 12, "YALLXZZ");
        assert_eq!(shared_coords(&[&a, &b]), (1..9).collect::<Vec<i32>>());
        assert_eq!(shared_coords(&[&a, &b, &c]), vec![5, 6, 7, 8]);
        assert!(shared_coords(&[]).is_empty());
        assert_eq!(union_coords(&[&c, &a]), (0..12).collect::<Vec<i32>>());
        assert!(union_coords(&[]).is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(validate(&resp("Env", 0, 9, "KMQKEYALL")).is_ok());
        assert!(validate(&resp("Env", 9, 9, "")).is_err());
        assert!(validate(&resp("Env", 9, 3, "KM")).is_err());
        assert!(validate(&resp("Env", -2, 3, "KMQKE")).is_err());
    }
}
