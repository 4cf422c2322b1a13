// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// Partition the responses of one subject into islands: maximal groups that are
// connected by chains of pairwise overlap on the same protein.

use crate::coords::overlap;
use epitope_types::{IslandMode, Response};
use std::mem::swap;

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// ORBITS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// An equivalence relation on 0..n.  Each orbit is a circular linked list, and
// every element carries the id of its orbit, so class lookup is O(1).  A join
// relabels the smaller orbit, so n joins cost O(n log n).

pub struct Orbits {
    next: Vec<usize>,  // next element in orbit
    class: Vec<usize>, // orbit class id
    size: Vec<usize>,  // orbit size, indexed by class id
}

impl Orbits {
    pub fn new(n: usize) -> Orbits {
        Orbits {
            next: (0..n).collect(),
            class: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub fn join(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (a, b);
        if self.class[a] == self.class[b] {
            return;
        }
        if self.orbit_size(a) < self.orbit_size(b) {
            swap(&mut a, &mut b);
        }
        let new_size = self.orbit_size(a) + self.orbit_size(b);

        // Splice the two cycles, then relabel what used to be b's orbit.

        self.next.swap(a, b);
        let mut n = self.next[a];
        while self.class[n] != self.class[a] {
            self.class[n] = self.class[a];
            n = self.next[n];
        }
        self.size[self.class[a]] = new_size;
    }

    pub fn class_id(&self, a: usize) -> usize {
        self.class[a]
    }

    pub fn orbit_size(&self, a: usize) -> usize {
        self.size[self.class[a]]
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// ISLAND ASSIGNMENT
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// Assign an island number to each response.  Islands are numbered 0, 1, ... in
/// order of the first input response that lies in them.
pub fn assign_islands(responses: &[&Response], mode: IslandMode) -> Vec<usize> {
    match mode {
        IslandMode::Connected => connected_islands(responses),
        IslandMode::FirstMatch => first_match_islands(responses),
    }
}

// Sweep each protein left to right.  A response whose start is below the
// largest end seen so far in the current run overlaps some earlier member of
// that run, so it joins it.

fn connected_islands(responses: &[&Response]) -> Vec<usize> {
    let n = responses.len();
    let mut ids: Vec<usize> = (0..n).collect();
    ids.sort_by(|&i, &j| {
        let (a, b) = (&responses[i], &responses[j]);
        (&a.protein, a.start).cmp(&(&b.protein, b.start))
    });
    let mut e = Orbits::new(n);
    let mut i = 0;
    while i < n {
        let r = &responses[ids[i]];
        let mut max_end = r.end;
        let mut j = i + 1;
        while j < n {
            let s = &responses[ids[j]];
            if s.protein != r.protein || s.start >= max_end {
                break;
            }
            e.join(ids[i], ids[j]);
            max_end = max_end.max(s.end);
            j += 1;
        }
        i = j;
    }
    let mut label = vec![usize::MAX; n];
    let mut island = vec![0; n];
    let mut count = 0;
    for i in 0..n {
        let c = e.class_id(i);
        if label[c] == usize::MAX {
            label[c] = count;
            count += 1;
        }
        island[i] = label[c];
    }
    island
}

// Each response joins the first island that holds something it overlaps, and
// islands are never merged, so the result depends on input order.

fn first_match_islands(responses: &[&Response]) -> Vec<usize> {
    let mut islands = Vec::<Vec<usize>>::new();
    let mut island = vec![0; responses.len()];
    for (i, r) in responses.iter().enumerate() {
        let hit = islands
            .iter()
            .position(|m| m.iter().any(|&j| overlap(r, responses[j])));
        match hit {
            Some(k) => {
                islands[k].push(i);
                island[i] = k;
            }
            None => {
                island[i] = islands.len();
                islands.push(vec![i]);
            }
        }
    }
    island
}

// Group response indices by island number, members in input order.

pub fn island_members(island: &[usize]) -> Vec<Vec<usize>> {
    let n = island.iter().map(|&k| k + 1).max().unwrap_or(0);
    let mut members = vec![Vec::<usize>::new(); n];
    for (i, &k) in island.iter().enumerate() {
        members[k].push(i);
    }
    members
}
