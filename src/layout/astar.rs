// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Undine-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Undine and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Epoch-stamped A* over the routing grid.
//!
//! The context keeps three parallel arrays (`cost_stamp`, `cost_so_far`,
//! `came_from`) alive across searches. A cell belongs to the current search
//! iff `cost_stamp[idx] == stamp`; bumping the stamp starts a fresh search
//! without reinitialising the arrays.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::OnceLock;

use smallvec::SmallVec;

use super::usage::{inverse_bit, step_bit, would_form_cross, SegmentUsage};

/// Inclusive search window in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl GridBounds {
    /// Bounding box of two grid indices, expanded by `margin` cells.
    pub fn around(a: usize, b: usize, stride: usize, margin: i32) -> Self {
        let (ax, ay) = ((a % stride) as i32, (a / stride) as i32);
        let (bx, by) = ((b % stride) as i32, (b / stride) as i32);
        Self {
            min_x: ax.min(bx) - margin,
            min_y: ay.min(by) - margin,
            max_x: ax.max(bx) + margin,
            max_y: ay.max(by) + margin,
        }
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Constraints injected into the strict search, checked inline per step.
#[derive(Debug, Clone, Copy)]
pub struct StrictConstraints<'a> {
    /// 4-bit connectivity mask per cell, `stride * height` long.
    pub used_points: &'a [u8],
    pub segments: &'a SegmentUsage,
    pub route_from: usize,
    pub route_to: usize,
    /// Node index the routed edge leaves from.
    pub edge_from: usize,
    /// Node index the routed edge arrives at.
    pub edge_to: usize,
}

/// Read-only grid view handed to a registered external search.
#[derive(Debug, Clone, Copy)]
pub struct SearchGrid<'a> {
    pub stride: usize,
    pub height: usize,
    pub blocked: &'a [bool],
}

/// Contract for a drop-in path search replacing the built-in A*.
///
/// Both methods must honor the same step rules as the built-in search; the
/// returned path is a list of grid indices from `from` to `to` inclusive.
pub trait PathSearch: Send + Sync {
    fn get_path(
        &self,
        grid: &SearchGrid<'_>,
        from: usize,
        to: usize,
        bounds: GridBounds,
    ) -> Option<Vec<usize>>;

    fn get_path_strict(
        &self,
        grid: &SearchGrid<'_>,
        from: usize,
        to: usize,
        bounds: GridBounds,
        constraints: &StrictConstraints<'_>,
    ) -> Option<Vec<usize>>;
}

static PATH_SEARCH: OnceLock<Box<dyn PathSearch>> = OnceLock::new();

/// Registers a process-wide replacement search. First registration wins.
pub fn register_path_search(search: Box<dyn PathSearch>) -> Result<(), Box<dyn PathSearch>> {
    PATH_SEARCH.set(search)
}

fn registered_path_search() -> Option<&'static dyn PathSearch> {
    PATH_SEARCH.get().map(|boxed| boxed.as_ref())
}

/// Reusable search state for one layout attempt.
#[derive(Debug)]
pub struct AStarContext {
    stride: usize,
    height: usize,
    blocked: Vec<bool>,
    stamp: u32,
    cost_stamp: Vec<u32>,
    cost_so_far: Vec<u32>,
    came_from: Vec<u32>,
    heap: BinaryHeap<Reverse<(u32, u32, u32)>>,
}

impl AStarContext {
    pub fn new(stride: usize, height: usize) -> Self {
        let cells = stride * height;
        Self {
            stride,
            height,
            blocked: vec![false; cells],
            stamp: 0,
            cost_stamp: vec![0; cells],
            cost_so_far: vec![0; cells],
            came_from: vec![0; cells],
            heap: BinaryHeap::new(),
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn blocked(&self) -> &[bool] {
        &self.blocked
    }

    pub fn idx(&self, x: i32, y: i32) -> usize {
        x as usize + y as usize * self.stride
    }

    pub fn coords(&self, idx: usize) -> (i32, i32) {
        ((idx % self.stride) as i32, (idx / self.stride) as i32)
    }

    pub fn block(&mut self, idx: usize) {
        self.blocked[idx] = true;
    }

    pub fn is_blocked(&self, idx: usize) -> bool {
        self.blocked[idx]
    }

    fn grid_view(&self) -> SearchGrid<'_> {
        SearchGrid { stride: self.stride, height: self.height, blocked: &self.blocked }
    }

    /// Starts a fresh search epoch. The stamp wraps past 0 because 0 is the
    /// "never touched" sentinel in `cost_stamp`.
    fn next_stamp(&mut self) -> u32 {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.cost_stamp.fill(0);
            self.stamp = 1;
        }
        self.stamp
    }

    fn heuristic(&self, idx: usize, to: usize) -> u32 {
        let (x, y) = self.coords(idx);
        let (tx, ty) = self.coords(to);
        let dx = (x - tx).unsigned_abs();
        let dy = (y - ty).unsigned_abs();
        // Bias toward straight-line completion, not detours.
        dx + dy + u32::from(dx != 0 && dy != 0)
    }

    /// Unconstrained 4-neighbour search. Only blocked cells are impassable,
    /// except the exact target, which may be entered even when blocked so the
    /// search can terminate on a node border.
    pub fn get_path(&mut self, from: usize, to: usize, bounds: GridBounds) -> Option<Vec<usize>> {
        if let Some(external) = registered_path_search() {
            return external.get_path(&self.grid_view(), from, to, bounds);
        }
        self.search(from, to, bounds, None)
    }

    /// Strict search: the unconstrained rules plus the crossing and
    /// segment-sharing rules, checked inline during neighbour expansion.
    pub fn get_path_strict(
        &mut self,
        from: usize,
        to: usize,
        bounds: GridBounds,
        constraints: &StrictConstraints<'_>,
    ) -> Option<Vec<usize>> {
        if let Some(external) = registered_path_search() {
            return external.get_path_strict(&self.grid_view(), from, to, bounds, constraints);
        }
        self.search(from, to, bounds, Some(constraints))
    }

    /// Whether the strict rules permit a unit step `a → b`. Also used by the
    /// deterministic self-loop constructor, which bypasses the search itself.
    pub(crate) fn step_allowed(
        &self,
        a: usize,
        b: usize,
        constraints: &StrictConstraints<'_>,
    ) -> bool {
        let bit = step_bit(a, b, self.stride);

        // Crossing rule: neither endpoint may accumulate all four directions.
        if would_form_cross(constraints.used_points[a], bit)
            || would_form_cross(constraints.used_points[b], inverse_bit(bit))
        {
            return false;
        }

        // Segment-sharing rule: a used segment may only be re-used as a shared
        // start (same source) or shared end (same target) step.
        if let Some(info) = constraints.segments.get(a, b) {
            if info.used_as_middle() || info.start_source_multi() || info.end_target_multi() {
                return false;
            }
            let is_start_step = a == constraints.route_from;
            let is_end_step = b == constraints.route_to;
            if !is_start_step && !is_end_step {
                return false;
            }
            if let Some(source) = info.start_source() {
                if !(is_start_step && source == constraints.edge_from) {
                    return false;
                }
            }
            if let Some(target) = info.end_target() {
                if !(is_end_step && target == constraints.edge_to) {
                    return false;
                }
            }
        }

        true
    }

    fn search(
        &mut self,
        from: usize,
        to: usize,
        bounds: GridBounds,
        constraints: Option<&StrictConstraints<'_>>,
    ) -> Option<Vec<usize>> {
        let stamp = self.next_stamp();
        self.heap.clear();

        self.cost_stamp[from] = stamp;
        self.cost_so_far[from] = 0;
        self.came_from[from] = from as u32;
        self.heap.push(Reverse((self.heuristic(from, to), 0, from as u32)));

        while let Some(Reverse((_, cost, idx))) = self.heap.pop() {
            let idx = idx as usize;
            // Stale entry: a cheaper cost has been recorded since this push.
            if self.cost_stamp[idx] != stamp || self.cost_so_far[idx] != cost {
                continue;
            }
            if idx == to {
                return Some(self.reconstruct(from, to));
            }

            let (x, y) = self.coords(idx);
            let neighbours = [
                (x + 1, y),
                (x - 1, y),
                (x, y + 1),
                (x, y - 1),
            ];
            for (nx, ny) in neighbours {
                if nx < 0 || ny < 0 || nx as usize >= self.stride || ny as usize >= self.height {
                    continue;
                }
                if !bounds.contains(nx, ny) {
                    continue;
                }
                let next = self.idx(nx, ny);
                if self.blocked[next] && next != to {
                    continue;
                }
                if let Some(constraints) = constraints {
                    if !self.step_allowed(idx, next, constraints) {
                        continue;
                    }
                }

                let new_cost = cost + 1;
                if self.cost_stamp[next] == stamp && self.cost_so_far[next] <= new_cost {
                    continue;
                }
                self.cost_stamp[next] = stamp;
                self.cost_so_far[next] = new_cost;
                self.came_from[next] = idx as u32;
                self.heap
                    .push(Reverse((new_cost + self.heuristic(next, to), new_cost, next as u32)));
            }
        }

        None
    }

    fn reconstruct(&self, from: usize, to: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = to;
        loop {
            path.push(current);
            if current == from {
                break;
            }
            current = self.came_from[current] as usize;
        }
        path.reverse();
        path
    }
}

/// Collapses collinear runs to `[endpoint, turn, …, turn, endpoint]`.
///
/// A unit step is horizontal iff the indices differ by 1; vertical steps
/// differ by the grid stride.
pub fn merge_path_idx(path: &[usize]) -> SmallVec<[usize; 8]> {
    let mut merged = SmallVec::new();
    if path.is_empty() {
        return merged;
    }
    merged.push(path[0]);
    for window in path.windows(3) {
        let first_horizontal = window[0].abs_diff(window[1]) == 1;
        let second_horizontal = window[1].abs_diff(window[2]) == 1;
        if first_horizontal != second_horizontal {
            merged.push(window[1]);
        }
    }
    if path.len() > 1 {
        merged.push(path[path.len() - 1]);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{merge_path_idx, AStarContext, GridBounds, StrictConstraints};
    use crate::layout::usage::{SegmentUsage, UsedPointSet};

    const STRIDE: usize = 16;
    const HEIGHT: usize = 16;

    fn wide_bounds() -> GridBounds {
        GridBounds { min_x: 0, min_y: 0, max_x: 15, max_y: 15 }
    }

    fn ctx() -> AStarContext {
        AStarContext::new(STRIDE, HEIGHT)
    }

    #[test]
    fn straight_path_has_no_detours() {
        let mut ctx = ctx();
        let from = ctx.idx(1, 1);
        let to = ctx.idx(6, 1);
        let path = ctx.get_path(from, to, wide_bounds()).expect("path");
        assert_eq!(path.len(), 6);
        assert_eq!(path[0], from);
        assert_eq!(path[5], to);
    }

    #[test]
    fn search_routes_around_blocked_cells() {
        let mut ctx = ctx();
        for y in 0..10 {
            let idx = ctx.idx(4, y);
            ctx.block(idx);
        }
        let from = ctx.idx(1, 1);
        let to = ctx.idx(8, 1);
        let path = ctx.get_path(from, to, wide_bounds()).expect("path");
        assert!(path.len() > 8);
        assert!(path.iter().all(|&idx| !ctx.is_blocked(idx)));
    }

    #[test]
    fn blocked_target_is_still_enterable() {
        let mut ctx = ctx();
        let to = ctx.idx(5, 5);
        ctx.block(to);
        let from = ctx.idx(1, 5);
        let path = ctx.get_path(from, to, wide_bounds()).expect("path");
        assert_eq!(*path.last().expect("non-empty"), to);
    }

    #[test]
    fn bounds_can_make_a_target_unreachable() {
        let mut ctx = ctx();
        for y in 0..16 {
            let idx = ctx.idx(4, y);
            ctx.block(idx);
        }
        let from = ctx.idx(1, 1);
        let to = ctx.idx(8, 1);
        // The wall spans the whole grid; no bound can help, but a narrow
        // bound must also fail cleanly.
        let narrow = GridBounds { min_x: 0, min_y: 0, max_x: 8, max_y: 2 };
        assert_eq!(ctx.get_path(from, to, narrow), None);
    }

    #[test]
    fn stamp_reuse_keeps_searches_independent() {
        let mut ctx = ctx();
        let from = ctx.idx(1, 1);
        let to = ctx.idx(3, 1);
        let first = ctx.get_path(from, to, wide_bounds()).expect("path");
        let second = ctx.get_path(from, to, wide_bounds()).expect("path");
        assert_eq!(first, second);
    }

    #[test]
    fn strict_search_respects_middle_segments() {
        let mut ctx = ctx();
        let points = UsedPointSet::new(STRIDE, HEIGHT);
        let mut segments = SegmentUsage::new(STRIDE);
        // A previous edge ran horizontally through row 1; its middle segments
        // are off limits, so an overlapping route must fail entirely inside a
        // one-row corridor.
        for x in 1..8 {
            segments.record_middle(ctx.idx(x, 1), ctx.idx(x + 1, 1));
        }
        let from = ctx.idx(1, 1);
        let to = ctx.idx(8, 1);
        let corridor = GridBounds { min_x: 0, min_y: 1, max_x: 15, max_y: 1 };
        let constraints = StrictConstraints {
            used_points: points.masks(),
            segments: &segments,
            route_from: from,
            route_to: to,
            edge_from: 0,
            edge_to: 1,
        };
        assert_eq!(ctx.get_path_strict(from, to, corridor, &constraints), None);

        // With one extra row the route detours around the used corridor.
        let wider = GridBounds { min_x: 0, min_y: 0, max_x: 15, max_y: 2 };
        let path = ctx.get_path_strict(from, to, wider, &constraints).expect("path");
        assert!(path.len() > 8);
    }

    #[test]
    fn strict_search_allows_shared_start_for_same_source() {
        let mut ctx = ctx();
        let points = UsedPointSet::new(STRIDE, HEIGHT);
        let mut segments = SegmentUsage::new(STRIDE);
        let from = ctx.idx(2, 2);
        let right = ctx.idx(3, 2);
        segments.record_start(from, right, 7);

        let to = ctx.idx(6, 2);
        let constraints = StrictConstraints {
            used_points: points.masks(),
            segments: &segments,
            route_from: from,
            route_to: to,
            edge_from: 7,
            edge_to: 9,
        };
        let corridor = GridBounds { min_x: 0, min_y: 2, max_x: 15, max_y: 2 };
        assert!(ctx.get_path_strict(from, to, corridor, &constraints).is_some());

        // A different source may not share that first segment.
        let foreign = StrictConstraints { edge_from: 8, ..constraints };
        assert_eq!(ctx.get_path_strict(from, to, corridor, &foreign), None);
    }

    #[test]
    fn strict_search_crosses_plain_strokes_but_never_completes_a_junction() {
        let mut ctx = ctx();
        let mut points = UsedPointSet::new(STRIDE, HEIGHT);
        let segments = SegmentUsage::new(STRIDE);
        let blocked = vec![false; STRIDE * HEIGHT];

        let from = ctx.idx(2, 2);
        let to = ctx.idx(6, 2);
        let corridor = GridBounds { min_x: 0, min_y: 2, max_x: 15, max_y: 2 };

        // A plain vertical stroke through (4,2) may be crossed; the crossing
        // becomes a bridge during de-ambiguation.
        points.record_step(ctx.idx(4, 1), ctx.idx(4, 2), &blocked);
        points.record_step(ctx.idx(4, 2), ctx.idx(4, 3), &blocked);
        let constraints = StrictConstraints {
            used_points: points.masks(),
            segments: &segments,
            route_from: from,
            route_to: to,
            edge_from: 0,
            edge_to: 1,
        };
        assert!(ctx.get_path_strict(from, to, corridor, &constraints).is_some());

        // (4,2) already joins three strokes; adding a fourth is refused.
        let mut points = UsedPointSet::new(STRIDE, HEIGHT);
        points.record_step(ctx.idx(3, 2), ctx.idx(4, 2), &blocked);
        points.record_step(ctx.idx(4, 2), ctx.idx(4, 1), &blocked);
        points.record_step(ctx.idx(4, 2), ctx.idx(4, 3), &blocked);
        let constraints = StrictConstraints {
            used_points: points.masks(),
            segments: &segments,
            route_from: from,
            route_to: to,
            edge_from: 0,
            edge_to: 1,
        };
        assert_eq!(ctx.get_path_strict(from, to, corridor, &constraints), None);

        // Allowed once it may hop a row around the junction.
        let wider = GridBounds { min_x: 0, min_y: 0, max_x: 15, max_y: 3 };
        assert!(ctx.get_path_strict(from, to, wider, &constraints).is_some());
    }

    #[test]
    fn merge_collapses_collinear_runs() {
        let ctx = ctx();
        let path = vec![
            ctx.idx(1, 1),
            ctx.idx(2, 1),
            ctx.idx(3, 1),
            ctx.idx(3, 2),
            ctx.idx(3, 3),
            ctx.idx(4, 3),
        ];
        let merged = merge_path_idx(&path);
        assert_eq!(
            merged.as_slice(),
            &[ctx.idx(1, 1), ctx.idx(3, 1), ctx.idx(3, 3), ctx.idx(4, 3)]
        );
    }

    #[test]
    fn merge_handles_trivial_paths() {
        assert!(merge_path_idx(&[]).is_empty());
        assert_eq!(merge_path_idx(&[5]).as_slice(), &[5]);
        assert_eq!(merge_path_idx(&[5, 6]).as_slice(), &[5, 6]);
    }
}
