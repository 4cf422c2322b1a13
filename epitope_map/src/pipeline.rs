// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Map epitopes for a whole response table.  Responses are split by subject,
// each subject's responses are split into islands, and the islands are searched
// in parallel.  An island that cannot be searched is reported and its responses
// are left unexplained; the other islands are unaffected.

use crate::assemble::{assemble_epitopes, pair_rows, response_rows, unexplained_rows};
use crate::config::MapConfig;
use crate::consensus::consensus_peptide;
use crate::coords::{union_coords, validate};
use crate::error::Result;
use crate::islands::{assign_islands, island_members};
use crate::rules::SharedRule;
use crate::search::{find_explaining_sets, SearchParams};
use binding_rank::BindingSource;
use epitope_types::{island_label, EpitopePair, IslandRow, Response, ResponseEpitope, SearchMode};
use io_utils::fwriteln;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandFailure {
    pub ptid: String,
    #[serde(rename = "IslandID")]
    pub island_id: String,
    pub error: String,
}

/// One row per island.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandSummary {
    pub ptid: String,
    #[serde(rename = "IslandID")]
    pub island_id: String,
    pub protein: String,
    pub start: i32,
    pub end: i32,
    pub nresp: usize,
    pub nep: usize,
    pub consensus: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpitopeMap {
    /// per response, in input order
    pub islands: Vec<IslandRow>,
    pub summaries: Vec<IslandSummary>,
    pub pairs: Vec<EpitopePair>,
    /// per response, in input order
    pub responses: Vec<ResponseEpitope>,
    pub failures: Vec<IslandFailure>,
    /// number of islands searched greedily
    pub greedy: usize,
}

struct IslandJob {
    ptid: String,
    island_id: String,
    members: Vec<usize>,
}

struct IslandResult {
    summary: IslandSummary,
    pairs: Vec<EpitopePair>,
    responses: Vec<(usize, ResponseEpitope)>,
    failure: Option<IslandFailure>,
    greedy: bool,
}

// Search one island and build its rows.

fn run_island(
    job: &IslandJob,
    responses: &[Response],
    rule: &SharedRule,
    params: &SearchParams,
) -> IslandResult {
    let island: Vec<&Response> = job.members.iter().map(|&i| &responses[i]).collect();
    let coords = union_coords(&island);
    let mut summary = IslandSummary {
        ptid: job.ptid.clone(),
        island_id: job.island_id.clone(),
        protein: island[0].protein.clone(),
        start: coords.first().cloned().unwrap_or(0),
        end: coords.last().map(|&c| c + 1).unwrap_or(0),
        nresp: island.len(),
        nep: 0,
        consensus: consensus_peptide(&island, true),
    };
    let found = find_explaining_sets(&island, rule, params).and_then(|e| {
        let eps = assemble_epitopes(&island, &e.sets, &e.descs, rule)?;
        Ok((e, eps))
    });
    match found {
        Ok((e, eps)) => {
            summary.nep = eps.len();
            let rows = response_rows(&island, &job.island_id, &eps);
            IslandResult {
                summary,
                pairs: pair_rows(&island, &job.island_id, &eps),
                responses: job.members.iter().cloned().zip(rows).collect(),
                failure: None,
                greedy: e.mode == SearchMode::Greedy,
            }
        }
        Err(err) => {
            warn!("{} {}: {}", job.ptid, job.island_id, err);
            let rows = unexplained_rows(&island, &job.island_id);
            IslandResult {
                summary,
                pairs: Vec::new(),
                responses: job.members.iter().cloned().zip(rows).collect(),
                failure: Some(IslandFailure {
                    ptid: job.ptid.clone(),
                    island_id: job.island_id.clone(),
                    error: err.to_string(),
                }),
                greedy: false,
            }
        }
    }
}

// Indices of each subject's responses, subjects in order of first appearance.

fn by_subject(responses: &[Response]) -> Vec<(String, Vec<usize>)> {
    let mut groups = Vec::<(String, Vec<usize>)>::new();
    for (i, r) in responses.iter().enumerate() {
        match groups.iter_mut().find(|(p, _)| *p == r.ptid) {
            Some((_, g)) => g.push(i),
            None => groups.push((r.ptid.clone(), vec![i])),
        }
    }
    groups
}

pub fn map_epitopes(
    responses: &[Response],
    config: &MapConfig,
    binding: Option<&dyn BindingSource>,
) -> Result<EpitopeMap> {
    config.validate()?;
    for r in responses.iter() {
        validate(r)?;
    }
    let rule = SharedRule::from_config(&config.rule, binding)?;
    let params = SearchParams {
        reduce: config.reduce_responses,
        mode: config.search_mode,
        max_island_size: config.max_island_size,
    };

    // Assign islands.

    let mut map = EpitopeMap::default();
    let mut island_of = vec![String::new(); responses.len()];
    let mut jobs = Vec::<IslandJob>::new();
    for (ptid, ids) in by_subject(responses) {
        let subject: Vec<&Response> = ids.iter().map(|&i| &responses[i]).collect();
        let island = assign_islands(&subject, config.island_mode);
        for (k, members) in island_members(&island).into_iter().enumerate() {
            let island_id = island_label(k);
            let members: Vec<usize> = members.iter().map(|&m| ids[m]).collect();
            for &m in members.iter() {
                island_of[m] = island_id.clone();
            }
            jobs.push(IslandJob {
                ptid: ptid.clone(),
                island_id,
                members,
            });
        }
    }
    for (r, island_id) in responses.iter().zip(island_of.into_iter()) {
        map.islands.push(IslandRow {
            ptid: r.ptid.clone(),
            resp_id: r.resp_id.clone(),
            island_id,
        });
    }
    info!(
        "{} responses, {} islands, rule {}",
        responses.len(),
        jobs.len(),
        rule.kind()
    );

    // Search islands.

    let results: Vec<IslandResult> = jobs
        .par_iter()
        .map(|job| run_island(job, responses, &rule, &params))
        .collect();
    let mut resp_rows = Vec::<(usize, ResponseEpitope)>::with_capacity(responses.len());
    for res in results {
        map.summaries.push(res.summary);
        map.pairs.extend(res.pairs);
        resp_rows.extend(res.responses);
        map.failures.extend(res.failure);
        if res.greedy {
            map.greedy += 1;
        }
    }
    resp_rows.sort_by_key(|(i, _)| *i);
    map.responses = resp_rows.into_iter().map(|(_, r)| r).collect();
    info!(
        "{} epitopes, {} failed islands",
        map.summaries.iter().map(|s| s.nep).sum::<usize>(),
        map.failures.len()
    );
    Ok(map)
}

impl EpitopeMap {
    pub fn summary(&self, log: &mut Vec<u8>) {
        let nep: usize = self.summaries.iter().map(|s| s.nep).sum();
        let nfloat = self.pairs.iter().filter(|p| p.floater == 1).count();
        let nunex = self
            .responses
            .iter()
            .filter(|r| r.ep_id.is_empty())
            .count();
        fwriteln!(log, "responses = {}", self.responses.len());
        fwriteln!(log, "islands = {}", self.summaries.len());
        fwriteln!(log, "epitopes = {}", nep);
        fwriteln!(log, "floater memberships = {}", nfloat);
        fwriteln!(log, "unexplained responses = {}", nunex);
        if self.greedy > 0 {
            fwriteln!(log, "islands searched greedily = {}", self.greedy);
        }
        for f in self.failures.iter() {
            fwriteln!(log, "failed: {} {}: {}", f.ptid, f.island_id, f.error);
        }
    }
}
