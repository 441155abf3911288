//! Per-label statistics gathered while the labeler scans the raster.

use tracing::trace;

use crate::{
    chain_code::Contour,
    raster::{BoundingBox, Label, Point, BACKGROUND},
    types::{Blob, BlobSet, Moments},
    union_find::UnionFind,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BlobStats {
    pub area: u64,
    pub bbox: BoundingBox,
    pub moments: Moments,
    /// First pixel in raster order.
    pub first: Point,
}

impl BlobStats {
    fn new(p: Point) -> Self {
        let mut moments = Moments::default();
        moments.add_pixel(p);
        Self {
            area: 1,
            bbox: BoundingBox::from_point(p),
            moments,
            first: p,
        }
    }

    fn add(&mut self, p: Point) {
        self.area += 1;
        self.bbox.include(p);
        self.moments.add_pixel(p);
        if (p.y, p.x) < (self.first.y, self.first.x) {
            self.first = p;
        }
    }

    fn merge(&mut self, other: &BlobStats) {
        self.area += other.area;
        self.bbox.merge(&other.bbox);
        self.moments.merge(&other.moments);
        if (other.first.y, other.first.x) < (self.first.y, self.first.x) {
            self.first = other.first;
        }
    }

    fn into_blob(self, label: Label) -> Blob {
        Blob {
            label,
            area: self.area,
            bbox: self.bbox,
            centroid: self.moments.centroid().unwrap_or([self.first.x as f64, self.first.y as f64]),
            moments: self.moments,
            contour: Contour::new(self.first, Vec::new()),
            internal_contours: Vec::new(),
        }
    }
}

/// Statistics indexed by provisional label.
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    stats: Vec<Option<BlobStats>>,
}

/// Result of [`BlobRegistry::finalize`].
#[derive(Debug, Clone)]
pub struct FinalizedBlobs {
    /// Final label of every provisional label; index 0 maps to background.
    pub relabel: Vec<Label>,
    /// One blob per final label, contours not traced yet.
    pub blobs: BlobSet,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one pixel of provisional label `label`.
    pub fn observe(&mut self, label: Label, p: Point) {
        debug_assert_ne!(label, BACKGROUND);
        let i = label as usize;
        if self.stats.len() <= i {
            self.stats.resize(i + 1, None);
        }
        match &mut self.stats[i] {
            Some(s) => s.add(p),
            slot @ None => *slot = Some(BlobStats::new(p)),
        }
    }

    /// Folds the statistics of `from` into `into`.
    pub fn merge(&mut self, from: Label, into: Label) {
        if from == into {
            return;
        }
        let Some(moved) = self.stats.get_mut(from as usize).and_then(Option::take) else {
            return;
        };
        let i = into as usize;
        if self.stats.len() <= i {
            self.stats.resize(i + 1, None);
        }
        match &mut self.stats[i] {
            Some(s) => s.merge(&moved),
            slot @ None => *slot = Some(moved),
        }
    }

    /// Resolves every provisional label to its set's canonical label,
    /// combines their statistics, then numbers the surviving sets `1..=n`
    /// in canonical order, which is the raster order of their first pixel.
    pub fn finalize(mut self, sets: &mut UnionFind) -> FinalizedBlobs {
        let provisional = sets.len();
        for label in 1..=provisional as Label {
            let canonical = sets.canonical(label);
            if canonical != label {
                trace!(label, canonical, "merging provisional label");
                self.merge(label, canonical);
            }
        }

        let mut relabel = vec![BACKGROUND; provisional + 1];
        let mut blobs = BlobSet::new();
        let mut next: Label = 1;
        for label in 1..=provisional as Label {
            if sets.canonical(label) != label {
                continue;
            }
            if let Some(stats) = self.stats.get_mut(label as usize).and_then(Option::take) {
                relabel[label as usize] = next;
                blobs.insert(stats.into_blob(next));
                next += 1;
            }
        }
        for label in 1..=provisional as Label {
            let canonical = sets.canonical(label);
            relabel[label as usize] = relabel[canonical as usize];
        }

        FinalizedBlobs { relabel, blobs }
    }
}
