// Copyright (c) 2018 10X Genomics, Inc. All rights reserved.

// Binding-affinity lookup for (HLA allele, k-mer) pairs.  Affinities are IC50-like:
// lower means stronger binding.  Each allele has a reference distribution of
// affinities, and the percentile rank of a k-mer is the fraction of that
// distribution that binds strictly more strongly.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use vector_utils::count_less_f64;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("no binding affinity for allele {allele} and k-mer {kmer}")]
    MissingAffinity { allele: String, kmer: String },
    #[error("no reference affinity distribution for allele {0}")]
    MissingReference(String),
    #[error("affinity for allele {allele} and k-mer {kmer} is not a number")]
    NotANumber { allele: String, kmer: String },
    #[error("reading binding table: {0}")]
    Csv(#[from] csv::Error),
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// BINDING SOURCE
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// A deterministic source of binding predictions.  Implementations must be
/// shareable across the threads that process islands.
pub trait BindingSource: Sync {
    fn affinity(&self, allele: &str, kmer: &str) -> Option<f64>;

    /// Sorted ascending.
    fn reference(&self, allele: &str) -> Option<&[f64]>;

    fn rank(&self, allele: &str, kmer: &str) -> Result<f64, BindingError> {
        let a = self
            .affinity(allele, kmer)
            .ok_or_else(|| BindingError::MissingAffinity {
                allele: allele.to_string(),
                kmer: kmer.to_string(),
            })?;
        let r = self
            .reference(allele)
            .ok_or_else(|| BindingError::MissingReference(allele.to_string()))?;
        Ok(percentile_rank(r, a))
    }
}

// Fraction of the sorted reference that is strictly less than x.  An empty
// reference gives rank 1, i.e. never in the top of anything.

pub fn percentile_rank(reference: &[f64], x: f64) -> f64 {
    if reference.is_empty() {
        return 1.0;
    }
    count_less_f64(reference, x) as f64 / reference.len() as f64
}

// Mean of some numbers, returning zero on an empty slice.

pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// IN-MEMORY AFFINITY TABLE
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AffinityRow {
    pub allele: String,
    pub peptide: String,
    pub ic50: f64,
}

/// Affinities keyed by allele then k-mer.  Unless set explicitly, the reference
/// distribution of an allele is every affinity the table holds for it.
#[derive(Debug, Clone, Default)]
pub struct AffinityTable {
    affinity: HashMap<String, HashMap<String, f64>>,
    reference: HashMap<String, Vec<f64>>,
}

impl AffinityTable {
    pub fn new(rows: Vec<AffinityRow>) -> Result<AffinityTable, BindingError> {
        let mut affinity = HashMap::<String, HashMap<String, f64>>::new();
        for r in rows {
            if r.ic50.is_nan() {
                return Err(BindingError::NotANumber {
                    allele: r.allele,
                    kmer: r.peptide,
                });
            }
            affinity.entry(r.allele).or_default().insert(r.peptide, r.ic50);
        }
        let mut reference = HashMap::<String, Vec<f64>>::new();
        for (allele, kmers) in affinity.iter() {
            let mut r: Vec<f64> = kmers.values().cloned().collect();
            r.sort_by(|a, b| a.total_cmp(b));
            reference.insert(allele.clone(), r);
        }
        Ok(AffinityTable { affinity, reference })
    }

    // Replace the reference distribution of an allele.

    pub fn set_reference(&mut self, allele: &str, mut dist: Vec<f64>) {
        dist.retain(|x| !x.is_nan());
        dist.sort_by(|a, b| a.total_cmp(b));
        self.reference.insert(allele.to_string(), dist);
    }

    // Load a table from a csv file with columns allele, peptide, ic50.

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<AffinityTable, BindingError> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut rows = Vec::<AffinityRow>::new();
        for r in rdr.deserialize() {
            rows.push(r?);
        }
        AffinityTable::new(rows)
    }

    pub fn alleles(&self) -> Vec<&str> {
        let mut a: Vec<&str> = self.affinity.keys().map(|x| x.as_str()).collect();
        a.sort_unstable();
        a
    }
}

impl BindingSource for AffinityTable {
    fn affinity(&self, allele: &str, kmer: &str) -> Option<f64> {
        self.affinity.get(allele)?.get(kmer).cloned()
    }

    fn reference(&self, allele: &str) -> Option<&[f64]> {
        self.reference.get(allele).map(|r| r.as_slice())
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// K-MER WINDOWS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// All contiguous windows of x whose length is in nmer, ordered by the position
// of the length in nmer, then by start.  Lengths longer than x contribute nothing.

pub fn mer_windows<'a, T>(x: &'a [T], nmer: &[usize]) -> Vec<&'a [T]> {
    let mut w = Vec::<&[T]>::new();
    for &k in nmer.iter() {
        if k == 0 || k > x.len() {
            continue;
        }
        w.extend(x.windows(k));
    }
    w
}
