// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Epitope mapping.  Overlapping T cell responses of a subject are grouped into
// islands, and within each island the smallest family of response sets that are
// each explained by one epitope is found, under a choice of shared rule.

pub mod assemble;
pub mod config;
pub mod consensus;
pub mod coords;
pub mod error;
pub mod islands;
pub mod pipeline;
pub mod rules;
pub mod search;
pub mod table;
pub mod variants;

pub use config::{MapConfig, RuleConfig};
pub use error::{EpitopeError, Result};
pub use pipeline::{map_epitopes, EpitopeMap, IslandFailure, IslandSummary};
pub use rules::SharedRule;
