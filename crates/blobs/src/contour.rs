//! Boundary following on a finished label raster.
//!
//! External contours start at the topmost-leftmost pixel of a blob and run
//! clockwise on screen; internal contours start at the blob pixel directly
//! above the topmost-leftmost pixel of their hole and run counter-clockwise.
//! 8-connected blobs are traced with Moore neighbourhood tracing,
//! 4-connected blobs with left-hand boundary following over the four axis
//! neighbours. Both stop when the walk is back at its start pixel about to
//! repeat its first move.

use std::collections::VecDeque;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    chain_code::{Contour, Direction},
    error::{BlobError, Result},
    raster::{BoundingBox, Connectivity, Label, LabelRaster, Point},
    types::{Blob, BlobSet},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ContourTracer {
    pub connectivity: Connectivity,
}

impl ContourTracer {
    pub fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }

    /// Angular distance between scanned neighbours, in eighths of a turn.
    fn scan_step(&self) -> u8 {
        match self.connectivity {
            Connectivity::Four => 2,
            Connectivity::Eight => 1,
        }
    }

    /// First direction to test after arriving with move `d`. It always
    /// points at a pixel known to lie outside the traced region.
    fn resume_from(&self, d: Direction) -> Direction {
        match self.connectivity {
            Connectivity::Eight if d.is_diagonal() => d.rotate_cw(5),
            _ => d.rotate_cw(6),
        }
    }

    fn next_move(&self, labels: &LabelRaster, label: Label, at: Point, from: Direction) -> Option<Direction> {
        let step = self.scan_step();
        let mut d = from;
        for _ in 0..8 / step {
            if labels.at(d.apply(at)) == Some(label) {
                return Some(d);
            }
            d = d.rotate_cw(step);
        }
        None
    }

    /// Walks the boundary of `label` from `start`, probing clockwise from
    /// `search_from`, which must be a pixel outside the blob.
    fn follow(
        &self,
        labels: &LabelRaster,
        label: Label,
        start: Point,
        search_from: Direction,
    ) -> Result<Vec<Direction>> {
        let Some(first) = self.next_move(labels, label, start, search_from) else {
            // isolated pixel
            return Ok(Vec::new());
        };

        // each pixel is entered at most once per direction
        let limit = 8 * labels.width() as usize * labels.height() as usize + 8;
        let mut chain = vec![first];
        let mut at = first.apply(start);
        let mut last = first;
        loop {
            let next = self
                .next_move(labels, label, at, self.resume_from(last))
                .ok_or_else(|| {
                    BlobError::InvariantViolation(format!(
                        "contour of label {label} lost at {at:?}"
                    ))
                })?;
            if at == start && next == first {
                break;
            }
            if chain.len() >= limit {
                return Err(BlobError::InvariantViolation(format!(
                    "contour of label {label} does not close after {limit} steps"
                )));
            }
            chain.push(next);
            at = next.apply(at);
            last = next;
        }
        Ok(chain)
    }

    /// Topmost-leftmost pixel of `label`, searching `within` when given.
    pub fn find_start(&self, labels: &LabelRaster, label: Label, within: Option<&BoundingBox>) -> Result<Point> {
        let frame = BoundingBox {
            min_x: 0,
            min_y: 0,
            max_x: labels.width() as i32 - 1,
            max_y: labels.height() as i32 - 1,
        };
        let area = within.and_then(|b| b.intersect(&frame)).unwrap_or(frame);
        for y in area.min_y..=area.max_y {
            for x in area.min_x..=area.max_x {
                if labels.get(x, y) == Some(label) {
                    return Ok(Point::new(x, y));
                }
            }
        }
        Err(BlobError::InvariantViolation(format!(
            "no boundary pixel found for label {label}"
        )))
    }

    /// Outer contour of `label`.
    pub fn trace_external(&self, labels: &LabelRaster, label: Label) -> Result<Contour> {
        let start = self.find_start(labels, label, None)?;
        self.trace_external_from(labels, label, start)
    }

    /// Outer contour of `label` starting at its topmost-leftmost pixel `start`.
    pub fn trace_external_from(&self, labels: &LabelRaster, label: Label, start: Point) -> Result<Contour> {
        // the left neighbour of the first pixel in raster order is outside
        let chain = self.follow(labels, label, start, Direction::Left)?;
        Ok(Contour::new(start, chain))
    }

    /// Topmost-leftmost pixel of every hole of `label` inside `bbox`, in
    /// raster order. A hole is a component of non-`label` pixels, connected
    /// with the dual connectivity, that does not reach the area outside `bbox`.
    pub fn find_holes(&self, labels: &LabelRaster, label: Label, bbox: &BoundingBox) -> Vec<Point> {
        // local grid padded by one pixel on every side
        let w = bbox.width() as usize + 2;
        let h = bbox.height() as usize + 2;
        let origin = Point::new(bbox.min_x - 1, bbox.min_y - 1);
        let member = |cx: usize, cy: usize| {
            labels.get(origin.x + cx as i32, origin.y + cy as i32) == Some(label)
        };

        let offsets = self.connectivity.dual().offsets();
        let mut seen = vec![false; w * h];
        let fill = |seen: &mut Vec<bool>, sx: usize, sy: usize| {
            let mut queue = VecDeque::from([(sx, sy)]);
            seen[sy * w + sx] = true;
            while let Some((cx, cy)) = queue.pop_front() {
                for &(dx, dy) in offsets {
                    let nx = cx as i32 + dx;
                    let ny = cy as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if !seen[ny * w + nx] && !member(nx, ny) {
                        seen[ny * w + nx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
        };

        // the padded frame is never part of the blob and reaches everything outside
        fill(&mut seen, 0, 0);

        let mut holes = Vec::new();
        for cy in 1..h - 1 {
            for cx in 1..w - 1 {
                if !seen[cy * w + cx] && !member(cx, cy) {
                    holes.push(Point::new(origin.x + cx as i32, origin.y + cy as i32));
                    fill(&mut seen, cx, cy);
                }
            }
        }
        holes
    }

    /// Internal contour around the hole whose topmost-leftmost pixel is `hole`.
    pub fn trace_internal(&self, labels: &LabelRaster, label: Label, hole: Point) -> Result<Contour> {
        let start = Direction::Up.apply(hole);
        if labels.at(start) != Some(label) {
            return Err(BlobError::InvariantViolation(format!(
                "hole at {hole:?} is not bounded above by label {label}"
            )));
        }
        // probing starts at the hole pixel below the start
        let chain = self.follow(labels, label, start, Direction::Down)?;
        Ok(Contour::new(start, chain))
    }

    /// Fills in the external and internal contours of `blob`.
    pub fn trace_blob(&self, labels: &LabelRaster, blob: &mut Blob) -> Result<()> {
        let start = self.find_start(labels, blob.label, Some(&blob.bbox))?;
        blob.contour = self.trace_external_from(labels, blob.label, start)?;
        blob.internal_contours = self
            .find_holes(labels, blob.label, &blob.bbox)
            .into_iter()
            .map(|hole| self.trace_internal(labels, blob.label, hole))
            .collect::<Result<_>>()?;
        trace!(
            label = blob.label,
            steps = blob.contour.len(),
            holes = blob.internal_contours.len(),
            "traced blob"
        );
        Ok(())
    }

    /// Traces every blob of the set. Blobs are independent once the label
    /// raster is final, so `parallel` only changes how the work is scheduled.
    pub fn trace_all(&self, labels: &LabelRaster, blobs: &mut BlobSet, parallel: bool) -> Result<()> {
        if parallel {
            blobs
                .as_map_mut()
                .par_iter_mut()
                .try_for_each(|(_, blob)| self.trace_blob(labels, blob))?;
        } else {
            for blob in blobs.iter_mut() {
                self.trace_blob(labels, blob)?;
            }
        }
        debug!(blobs = blobs.len(), parallel, "traced contours");
        Ok(())
    }
}
