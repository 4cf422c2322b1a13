// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Turn the explaining sets of an island into epitopes.  A response that lies in
// more than one set is a floater.  Floaters do not shape the epitope: the rule
// is rerun on the other members of the set to get its descriptor.

use crate::error::Result;
use crate::rules::SharedRule;
use epitope_types::{
    epitope_label, AssignmentStatus, EpitopeAssignment, EpitopeDesc, EpitopePair, Response,
    ResponseEpitope,
};
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Epitope {
    pub id: String,
    pub desc: EpitopeDesc,
    /// island indices, in explaining set order
    pub members: Vec<usize>,
    /// parallel to members
    pub floater: Vec<bool>,
}

// Number of sets each island response lies in.

fn membership(sets: &[Vec<usize>], n: usize) -> Vec<usize> {
    let mut count = vec![0; n];
    for s in sets.iter() {
        for &i in s.iter() {
            count[i] += 1;
        }
    }
    count
}

/// An empty sequence spanning a group of responses.
pub fn bare_desc(group: &[&Response]) -> EpitopeDesc {
    let start = group.iter().map(|r| r.start).min().unwrap_or(0);
    let end = group.iter().map(|r| r.end).max().unwrap_or(start);
    EpitopeDesc::new(String::new(), start, end)
}

// Describe one set.  If every member is a floater, or the rule rejects the
// non-floaters alone, the whole set is used.  The rule may reject even that,
// when collapsed responses with the same coordinates carry different
// sequences; then the set keeps the descriptor found for its representatives,
// or failing that a bare one.

fn describe(
    island: &[&Response],
    set: &[usize],
    floater: &[bool],
    found: Option<&EpitopeDesc>,
    rule: &SharedRule,
) -> Result<EpitopeDesc> {
    let fixed: Vec<&Response> = set
        .iter()
        .zip(floater.iter())
        .filter(|x| !*x.1)
        .map(|(&i, _)| island[i])
        .collect();
    if !fixed.is_empty() {
        if let Some(d) = rule.apply(&fixed)? {
            return Ok(d);
        }
    }
    let all: Vec<&Response> = set.iter().map(|&i| island[i]).collect();
    if let Some(d) = rule.apply(&all)? {
        return Ok(d);
    }
    debug!("rule rejects a set of {} expanded responses", set.len());
    Ok(found.cloned().unwrap_or_else(|| bare_desc(&all)))
}

/// One epitope per explaining set.  `found` is parallel to `sets` and may be
/// shorter.
pub fn assemble_epitopes(
    island: &[&Response],
    sets: &[Vec<usize>],
    found: &[EpitopeDesc],
    rule: &SharedRule,
) -> Result<Vec<Epitope>> {
    let count = membership(sets, island.len());
    let mut eps = Vec::<Epitope>::with_capacity(sets.len());
    for (ei, set) in sets.iter().enumerate() {
        let floater: Vec<bool> = set.iter().map(|&i| count[i] > 1).collect();
        let desc = describe(island, set, &floater, found.get(ei), rule)?;
        eps.push(Epitope {
            id: epitope_label(ei),
            desc,
            members: set.clone(),
            floater,
        });
    }
    Ok(eps)
}

/// How each island response is explained, given the island's epitopes.
pub fn assignments(eps: &[Epitope], n: usize) -> Vec<EpitopeAssignment> {
    let mut ids = vec![Vec::<String>::new(); n];
    for ep in eps.iter() {
        for &i in ep.members.iter() {
            ids[i].push(ep.id.clone());
        }
    }
    ids.into_iter()
        .map(|mut x| match x.len() {
            0 => EpitopeAssignment::Unexplained,
            1 => EpitopeAssignment::Unique(x.remove(0)),
            _ => EpitopeAssignment::Ambiguous(x),
        })
        .collect()
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// OUTPUT ROWS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// One row per (epitope, member), epitopes in order.

pub fn pair_rows(island: &[&Response], island_id: &str, eps: &[Epitope]) -> Vec<EpitopePair> {
    let mut rows = Vec::<EpitopePair>::new();
    for ep in eps.iter() {
        for (&i, &f) in ep.members.iter().zip(ep.floater.iter()) {
            let r = island[i];
            rows.push(EpitopePair {
                ptid: r.ptid.clone(),
                island_id: island_id.to_string(),
                resp_id: r.resp_id.clone(),
                ep_id: ep.id.clone(),
                ep_seq: ep.desc.seq.clone(),
                ep_start: ep.desc.start,
                ep_end: ep.desc.end,
                hlas: ep.desc.hla_field(),
                floater: u8::from(f),
            });
        }
    }
    rows
}

// One row per island response.  The epitope columns hold the last epitope that
// claims the response; EpID and Assignment say whether there were others.

pub fn response_rows(
    island: &[&Response],
    island_id: &str,
    eps: &[Epitope],
) -> Vec<ResponseEpitope> {
    let assign = assignments(eps, island.len());
    let mut last: Vec<Option<&Epitope>> = vec![None; island.len()];
    for ep in eps.iter() {
        for &i in ep.members.iter() {
            last[i] = Some(ep);
        }
    }
    island
        .iter()
        .zip(assign.iter())
        .zip(last.iter())
        .map(|((r, a), ep)| ResponseEpitope {
            ptid: r.ptid.clone(),
            island_id: island_id.to_string(),
            resp_id: r.resp_id.clone(),
            ep_id: a.to_string(),
            ep_seq: ep.map(|e| e.desc.seq.clone()),
            ep_start: ep.map(|e| e.desc.start),
            ep_end: ep.map(|e| e.desc.end),
            hlas: ep.map(|e| e.desc.hla_field()).unwrap_or_default(),
            status: a.status(),
        })
        .collect()
}

// Rows for an island that could not be searched.

pub fn unexplained_rows(island: &[&Response], island_id: &str) -> Vec<ResponseEpitope> {
    island
        .iter()
        .map(|r| ResponseEpitope {
            ptid: r.ptid.clone(),
            island_id: island_id.to_string(),
            resp_id: r.resp_id.clone(),
            ep_id: String::new(),
            ep_seq: None,
            ep_start: None,
            ep_end: None,
            hlas: String::new(),
            status: AssignmentStatus::Unexplained,
        })
        .collect()
}

/// The part of a response under an epitope, read from its realigned sequence
/// if it has one.  Empty if the epitope runs off either end.
pub fn slice_resp_seq(r: &Response, ep: &EpitopeDesc) -> String {
    let s = r.align_seq.as_deref().unwrap_or(&r.seq);
    let start = ep.start - r.start;
    let stop = start + ep.seq.len() as i32;
    if start < 0 || stop as usize > s.len() {
        return String::new();
    }
    s.get(start as usize..stop as usize)
        .unwrap_or_default()
        .to_string()
}
