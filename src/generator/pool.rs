//! Candidate note sets the melodic walk moves through.
//!
//! A pool is an ascending list of pitches. The walk keeps an index into it,
//! so "a step" means one pool entry, not one semitone.

use crate::theory::{Scale, TheoryTables};

/// One pitch the walk may land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub pitch: i32,
    pub is_chord_tone: bool,
}

/// Ascending candidate pitches for one bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePool {
    notes: Vec<Candidate>,
}

impl NotePool {
    /// Every pitch within `center ± range/2` whose pitch class is one of `tones`.
    pub fn from_chord(tones: &[i32], range: u32, center: i32) -> Self {
        let half = (range / 2) as i32;
        let notes = (center - half..=center + half)
            .filter(|p| tones.iter().any(|t| t.rem_euclid(12) == p.rem_euclid(12)))
            .map(|pitch| Candidate {
                pitch,
                is_chord_tone: true,
            })
            .collect();
        Self { notes }
    }

    /// Every scale pitch within `root ± range/2`, chord tones marked by degree.
    pub fn from_scale(root: i32, scale: &Scale, range: u32, tables: &TheoryTables) -> Self {
        let half = (range / 2) as i32;
        Self::scale_span(root, scale, root - half, root + half, tables)
    }

    /// Scale pitches in `[low, high]` relative to `root`.
    pub fn scale_span(root: i32, scale: &Scale, low: i32, high: i32, tables: &TheoryTables) -> Self {
        let notes = (low..=high)
            .filter_map(|pitch| {
                let interval = (pitch - root).rem_euclid(12) as u8;
                scale.degree_of(interval).map(|degree| Candidate {
                    pitch,
                    is_chord_tone: tables.is_chord_tone_degree(degree, scale.len()),
                })
            })
            .collect();
        Self { notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.notes.get(index)
    }

    pub fn pitches(&self) -> impl Iterator<Item = i32> + '_ {
        self.notes.iter().map(|c| c.pitch)
    }

    /// Index of `target`, or of the closest pitch (first one on ties).
    /// Returns 0 for an empty pool.
    pub fn find_index(&self, target: i32) -> usize {
        if let Some(i) = self.notes.iter().position(|c| c.pitch == target) {
            return i;
        }
        let mut closest = 0;
        let mut min_dist = i32::MAX;
        for (i, c) in self.notes.iter().enumerate() {
            let dist = (c.pitch - target).abs();
            if dist < min_dist {
                min_dist = dist;
                closest = i;
            }
        }
        closest
    }

    /// Nearest chord-tone index to a proposed (possibly out-of-range) index,
    /// if one lies within `radius`. The first one wins ties.
    pub fn nearest_chord_tone(&self, proposed: isize, radius: usize) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (i, c) in self.notes.iter().enumerate() {
            if !c.is_chord_tone {
                continue;
            }
            let dist = (i as isize - proposed).unsigned_abs();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        best.filter(|&(_, d)| d <= radius).map(|(i, _)| i)
    }

    /// First chord tone within one index of `index`, scanning upward from the bottom.
    pub fn first_adjacent_chord_tone(&self, index: usize) -> Option<usize> {
        self.notes
            .iter()
            .enumerate()
            .find(|(i, c)| c.is_chord_tone && i.abs_diff(index) <= 1)
            .map(|(i, _)| i)
    }

    /// Clamp a signed index into the pool.
    pub fn clamp_index(&self, index: isize) -> usize {
        let max = self.notes.len().saturating_sub(1) as isize;
        index.clamp(0, max) as usize
    }
}
