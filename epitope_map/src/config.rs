// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Run configuration.  Every field has a default, so a JSON file need only name
// what it changes.

use crate::error::{EpitopeError, Result};
use epitope_types::{IslandMode, RuleKind, SearchMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub kind: RuleKind,
    /// overlap rule: shared columns without a gap
    pub min_overlap: usize,
    /// overlap rule: shared columns on which every response has the same residue
    pub min_shared_aa: usize,
    pub alleles: Vec<String>,
    pub top_pct: f64,
    pub nmer: Vec<usize>,
    /// Mark disagreeing columns of an hla epitope with X rather than a bracket group.
    pub use_x: bool,
}

impl Default for RuleConfig {
    fn default() -> RuleConfig {
        RuleConfig {
            kind: RuleKind::Overlap,
            min_overlap: 8,
            min_shared_aa: 6,
            alleles: Vec::new(),
            top_pct: 0.1,
            nmer: vec![8, 9, 10],
            use_x: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub rule: RuleConfig,
    /// Collapse responses with identical (start, end) before searching.
    pub reduce_responses: bool,
    pub island_mode: IslandMode,
    pub search_mode: SearchMode,
    /// Largest number of distinct responses in an island for which every subset
    /// is enumerated.
    pub max_island_size: usize,
    /// Emit one row per response instead of one row per (epitope, response).
    pub response_indexed: bool,
}

impl Default for MapConfig {
    fn default() -> MapConfig {
        MapConfig {
            rule: RuleConfig::default(),
            reduce_responses: true,
            island_mode: IslandMode::Connected,
            search_mode: SearchMode::Exact,
            max_island_size: 20,
            response_indexed: false,
        }
    }
}

// Above this, even the size of the subset list overflows what fits in memory.

const HARD_ISLAND_LIMIT: usize = 30;

impl MapConfig {
    pub fn from_json_str(s: &str) -> Result<MapConfig> {
        let c: MapConfig = serde_json::from_str(s)?;
        c.validate()?;
        Ok(c)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<MapConfig> {
        let s = std::fs::read_to_string(path)?;
        MapConfig::from_json_str(&s)
    }

    pub fn validate(&self) -> Result<()> {
        let r = &self.rule;
        if r.nmer.is_empty() || r.nmer.contains(&0) {
            return Err(EpitopeError::Config(
                "nmer must list positive lengths".to_string(),
            ));
        }
        if !(r.top_pct > 0.0 && r.top_pct <= 1.0) {
            return Err(EpitopeError::Config(format!(
                "top_pct {} is not in (0, 1]",
                r.top_pct
            )));
        }
        if r.kind == RuleKind::Hla && r.alleles.is_empty() {
            return Err(EpitopeError::Config(
                "the hla rule needs at least one allele".to_string(),
            ));
        }
        if self.max_island_size == 0 || self.max_island_size > HARD_ISLAND_LIMIT {
            return Err(EpitopeError::Config(format!(
                "max_island_size {} is not in 1..={}",
                self.max_island_size, HARD_ISLAND_LIMIT
            )));
        }
        Ok(())
    }
}
