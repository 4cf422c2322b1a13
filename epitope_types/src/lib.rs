// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// RESPONSES
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// One observed reactive peptide.  Coordinates are half-open, in reference
/// sequence space: the response covers start..end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub ptid: String,
    pub protein: String,
    pub start: i32,
    pub end: i32,
    pub seq: String,
    #[serde(rename = "RespID")]
    pub resp_id: String,
    /// Realigned sequence, if the response was placed in a reference alignment.
    #[serde(rename = "align seq", default)]
    pub align_seq: Option<String>,
    #[serde(rename = "align seqs", default)]
    pub align_seqs: Option<String>,
}

impl Response {
    pub fn new(ptid: &str, protein: &str, start: i32, end: i32, seq: &str, resp_id: &str) -> Response {
        Response {
            ptid: ptid.to_string(),
            protein: protein.to_string(),
            start,
            end,
            seq: seq.to_string(),
            resp_id: resp_id.to_string(),
            align_seq: None,
            align_seqs: None,
        }
    }

    pub fn with_align_seq(mut self, align_seq: &str) -> Response {
        self.align_seq = Some(align_seq.to_string());
        self
    }

    // Residue at a reference coordinate, if the sequence reaches that far.
    // Coordinates before start give None.

    pub fn residue_at(&self, coord: i32) -> Option<u8> {
        if coord < self.start {
            return None;
        }
        self.seq.as_bytes().get((coord - self.start) as usize).cloned()
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// EPITOPES
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// What a shared rule synthesizes for a set of responses that share one epitope.
/// The sequence may contain 'X' (disagreement), '-' (gap) or bracket groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpitopeDesc {
    pub seq: String,
    pub start: i32,
    pub end: i32,
    /// Alleles supporting the epitope; empty unless an HLA rule made it.
    pub hlas: Vec<String>,
}

impl EpitopeDesc {
    pub fn new(seq: String, start: i32, end: i32) -> EpitopeDesc {
        EpitopeDesc {
            seq,
            start,
            end,
            hlas: Vec::new(),
        }
    }

    pub fn hla_field(&self) -> String {
        self.hlas.join("|")
    }
}

pub fn island_label(i: usize) -> String {
    format!("I{}", i)
}

pub fn epitope_label(i: usize) -> String {
    format!("E{}", i)
}

/// How a response relates to the epitopes of its island.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpitopeAssignment {
    Unique(String),
    /// A floater: explained by more than one epitope.
    Ambiguous(Vec<String>),
    /// No accepted set contains the response, or its island failed.
    Unexplained,
}

impl fmt::Display for EpitopeAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpitopeAssignment::Unique(e) => write!(f, "{}", e),
            EpitopeAssignment::Ambiguous(es) => write!(f, "{}", es.join("|")),
            EpitopeAssignment::Unexplained => Ok(()),
        }
    }
}

impl EpitopeAssignment {
    pub fn status(&self) -> AssignmentStatus {
        match self {
            EpitopeAssignment::Unique(_) => AssignmentStatus::Unique,
            EpitopeAssignment::Ambiguous(_) => AssignmentStatus::Ambiguous,
            EpitopeAssignment::Unexplained => AssignmentStatus::Unexplained,
        }
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// CLOSED OPTION SETS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// The shared rules.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RuleKind {
    Identical,
    Overlap,
    Hla,
}

/// Coordinate space of a response: from end (response space) or from the
/// sequence length (plot space, robust to indels shifting end).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, EnumIter, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoordMode {
    Response,
    Plot,
}

/// How islands are formed from overlapping responses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, EnumIter, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IslandMode {
    /// Transitive closure of overlap, independent of input order.
    Connected,
    /// Each response joins the first island holding something it overlaps;
    /// islands are never merged afterwards.
    FirstMatch,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, EnumIter, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchMode {
    /// Enumerate every subset; islands above the size limit are an error.
    Exact,
    /// Seed-and-grow heuristic, any island size.
    Greedy,
    /// Exact up to the size limit, greedy beyond.
    Auto,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, EnumIter, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
    Unique,
    Ambiguous,
    Unexplained,
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// OUTPUT ROWS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Column names are consumed by downstream plotting and statistics code and must
// not change.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandRow {
    pub ptid: String,
    #[serde(rename = "RespID")]
    pub resp_id: String,
    #[serde(rename = "IslandID")]
    pub island_id: String,
}

/// One row per (epitope, response) membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpitopePair {
    pub ptid: String,
    #[serde(rename = "IslandID")]
    pub island_id: String,
    #[serde(rename = "RespID")]
    pub resp_id: String,
    #[serde(rename = "EpID")]
    pub ep_id: String,
    #[serde(rename = "EpSeq")]
    pub ep_seq: String,
    #[serde(rename = "EpStart")]
    pub ep_start: i32,
    #[serde(rename = "EpEnd")]
    pub ep_end: i32,
    pub hlas: String,
    /// 1 if the response belongs to more than one epitope, else 0.
    #[serde(rename = "Floater")]
    pub floater: u8,
}

/// One row per response.  For a floater the epitope columns hold the last
/// epitope that claimed it, and EpID lists every claimant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEpitope {
    pub ptid: String,
    #[serde(rename = "IslandID")]
    pub island_id: String,
    #[serde(rename = "RespID")]
    pub resp_id: String,
    #[serde(rename = "EpID")]
    pub ep_id: String,
    #[serde(rename = "EpSeq")]
    pub ep_seq: Option<String>,
    #[serde(rename = "EpStart")]
    pub ep_start: Option<i32>,
    #[serde(rename = "EpEnd")]
    pub ep_end: Option<i32>,
    pub hlas: String,
    #[serde(rename = "Assignment")]
    pub status: AssignmentStatus,
}
