// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

use binding_rank::BindingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EpitopeError {
    /// Coordinates that cannot describe a response, e.g. end <= start.
    #[error("malformed response {resp_id} of {ptid}: {reason}")]
    MalformedResponse {
        ptid: String,
        resp_id: String,
        reason: String,
    },

    /// Too many distinct responses in one island to enumerate their subsets.
    #[error("island of {size} distinct responses exceeds the exact search limit of {limit}")]
    SearchExplosion { size: usize, limit: usize },

    /// A rule could not evaluate a set of responses.
    #[error("shared rule {rule} failed: {reason}")]
    PredicateFailure { rule: String, reason: String },

    /// The binding source has no affinity for a k-mer the hla rule needs.
    #[error("no binding affinity for allele {allele} and k-mer {kmer}")]
    MissingAffinity { allele: String, kmer: String },

    #[error("peptides of unequal length cannot be encoded as variants: {0:?}")]
    UnequalLengths(Vec<usize>),

    #[error("malformed variant string {0:?}")]
    MalformedVariant(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<BindingError> for EpitopeError {
    fn from(e: BindingError) -> EpitopeError {
        match e {
            BindingError::MissingAffinity { allele, kmer } => {
                EpitopeError::MissingAffinity { allele, kmer }
            }
            e => EpitopeError::PredicateFailure {
                rule: "hla".to_string(),
                reason: e.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, EpitopeError>;
