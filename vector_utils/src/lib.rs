// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

// This file contains set operations on sorted vectors.  Coordinate sets and
// response index sets are kept as sorted, duplicate-free vectors throughout, and
// these are the primitives that act on them.

extern crate superslice;

use superslice::Ext;

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// INTERSECTION AND UNION
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Compute the intersection of two sorted vectors.

pub fn intersection<T: Ord + Clone>(x: &[T], y: &[T], z: &mut Vec<T>) {
    z.clear();
    let (mut i, mut j) = (0, 0);
    while i < x.len() && j < y.len() {
        if x[i] < y[j] {
            i += 1;
        } else if y[j] < x[i] {
            j += 1;
        } else {
            z.push(x[i].clone());
            i += 1;
            j += 1;
        }
    }
}

// Intersect a sorted vector in place with another sorted vector.

pub fn intersect_with<T: Ord + Clone>(x: &mut Vec<T>, y: &[T]) {
    let mut z = Vec::<T>::with_capacity(x.len());
    intersection(x, y, &mut z);
    *x = z;
}

// Compute the union of two sorted, duplicate-free vectors.

pub fn union<T: Ord + Clone>(x: &[T], y: &[T], z: &mut Vec<T>) {
    z.clear();
    z.reserve(x.len() + y.len());
    let (mut i, mut j) = (0, 0);
    while i < x.len() && j < y.len() {
        if x[i] < y[j] {
            z.push(x[i].clone());
            i += 1;
        } else if y[j] < x[i] {
            z.push(y[j].clone());
            j += 1;
        } else {
            z.push(x[i].clone());
            i += 1;
            j += 1;
        }
    }
    z.extend_from_slice(&x[i..]);
    z.extend_from_slice(&y[j..]);
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// SUBSETS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Determine if every element of the sorted vector x is in the sorted vector y.

pub fn is_subset<T: Ord>(x: &[T], y: &[T]) -> bool {
    if x.len() > y.len() {
        return false;
    }
    let mut j = 0;
    for a in x.iter() {
        while j < y.len() && y[j] < *a {
            j += 1;
        }
        if j == y.len() || y[j] != *a {
            return false;
        }
        j += 1;
    }
    true
}

// Strict version of is_subset: x is contained in y and y has something more.

pub fn is_strict_subset<T: Ord>(x: &[T], y: &[T]) -> bool {
    x.len() < y.len() && is_subset(x, y)
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// COUNTING
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Count the elements of a sorted vector that are strictly less than d.

pub fn count_less<T: Ord>(x: &[T], d: &T) -> usize {
    x.lower_bound(d)
}

// Same, for a sorted vector of floats.  NaNs are not allowed in x.

pub fn count_less_f64(x: &[f64], d: f64) -> usize {
    x.lower_bound_by(|a| a.partial_cmp(&d).unwrap_or(std::cmp::Ordering::Less))
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// FREQUENCY FUNCTIONS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Count elements of an unsorted vector, keeping them in order of first
// appearance.  The output consists of pairs (v,m) where m is the multiplicity of v.

pub fn make_freq_ordered<T: Eq + Clone>(x: &[T], freq: &mut Vec<(T, u32)>) {
    freq.clear();
    for v in x.iter() {
        match freq.iter_mut().find(|(w, _)| w == v) {
            Some(f) => f.1 += 1,
            None => freq.push((v.clone(), 1)),
        }
    }
}

// Return the distinct elements of an unsorted vector in order of first appearance.

pub fn distinct_ordered<T: Eq + Clone>(x: &[T]) -> Vec<T> {
    let mut d = Vec::<T>::new();
    for v in x.iter() {
        if !d.contains(v) {
            d.push(v.clone());
        }
    }
    d
}
