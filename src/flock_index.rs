/*
 * Flock Index Module
 *
 * This module defines the FlockIndex, a uniform 3D grid used to find the
 * neighbors of every fish in a single frame. The grid covers the swim volume
 * and its cell size equals the perception radius, so scanning the 3x3x3
 * block around a fish's cell covers its whole neighborhood.
 *
 * Buckets are singly linked lists threaded through two flat arrays: `head`
 * holds the first agent of every cell and `next` chains agents within a
 * cell. Rebuilding only refills those arrays, so nothing is allocated per
 * frame once the flock size is stable.
 */

use glam::Vec3;

use crate::params::Bounds;

const EMPTY: usize = usize::MAX;
const MIN_CELL_SIZE: f32 = 1.0e-3;

pub struct FlockIndex {
    bounds: Bounds,
    cell_size: f32,
    inv_cell_size: f32,
    // Cells along x, y, z
    dims: [usize; 3],
    // Added to floor(position / cell_size) to get a non-negative cell coordinate
    offset: [i64; 3],
    head: Vec<usize>,
    next: Vec<usize>,
    agent_cell: Vec<usize>,
    positions: Vec<Vec3>,
}

impl FlockIndex {
    pub fn new(bounds: Bounds, cell_size: f32) -> Self {
        let cell_size = cell_size.max(MIN_CELL_SIZE);
        let half_extents = [bounds.half_width(), bounds.half_height(), bounds.half_depth()];

        let mut dims = [0usize; 3];
        let mut offset = [0i64; 3];
        for axis in 0..3 {
            let cells_per_side = (half_extents[axis] / cell_size).ceil() as i64;
            offset[axis] = cells_per_side;
            dims[axis] = (2 * cells_per_side + 1) as usize;
        }

        Self {
            bounds,
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            dims,
            offset,
            head: vec![EMPTY; dims[0] * dims[1] * dims[2]],
            next: Vec::new(),
            agent_cell: Vec::new(),
            positions: Vec::new(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.head.len()
    }

    // Number of agents in the last rebuild, indexed or not
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    // Grid coordinates of a position, or None outside the swim volume
    fn cell_coords(&self, position: Vec3) -> Option<[usize; 3]> {
        let half_extents = [
            self.bounds.half_width(),
            self.bounds.half_height(),
            self.bounds.half_depth(),
        ];
        let components = [position.x, position.y, position.z];

        let mut coords = [0usize; 3];
        for axis in 0..3 {
            let value = components[axis];
            if !value.is_finite() || value.abs() > half_extents[axis] {
                return None;
            }
            let cell = (value * self.inv_cell_size).floor() as i64 + self.offset[axis];
            if cell < 0 || cell >= self.dims[axis] as i64 {
                return None;
            }
            coords[axis] = cell as usize;
        }
        Some(coords)
    }

    #[inline]
    fn flatten(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    /// Cell holding `position`, or `None` when it lies outside the grid.
    pub fn cell_of(&self, position: Vec3) -> Option<usize> {
        self.cell_coords(position).map(|coords| self.flatten(coords))
    }

    /// Cell an agent was bucketed into by the last rebuild.
    pub fn agent_cell(&self, index: usize) -> Option<usize> {
        match self.agent_cell.get(index) {
            Some(&cell) if cell != EMPTY => Some(cell),
            _ => None,
        }
    }

    /// Re-bucket every agent. Returns how many were outside the grid and left out.
    pub fn rebuild<I>(&mut self, positions: I) -> usize
    where
        I: IntoIterator<Item = Vec3>,
    {
        self.head.fill(EMPTY);
        self.positions.clear();
        self.positions.extend(positions);

        let count = self.positions.len();
        self.next.clear();
        self.next.resize(count, EMPTY);
        self.agent_cell.clear();
        self.agent_cell.resize(count, EMPTY);

        let mut out_of_bounds = 0;
        for i in 0..count {
            let position = self.positions[i];
            match self.cell_of(position) {
                Some(cell) => {
                    // Prepend to the cell's list
                    self.next[i] = self.head[cell];
                    self.head[cell] = i;
                    self.agent_cell[i] = cell;
                }
                None => out_of_bounds += 1,
            }
        }

        out_of_bounds
    }

    /// Candidate neighbors of agent `index` from the last rebuild, written to `out`.
    ///
    /// The result is every other indexed agent inside the axis-aligned box of
    /// half-size `cell_size` around the agent. Callers filter by true distance.
    /// An agent that was left out of the grid gets no candidates.
    pub fn query_neighbors(&self, index: usize, out: &mut Vec<usize>) {
        out.clear();
        if self.agent_cell(index).is_none() {
            return;
        }
        let position = self.positions[index];
        if let Some(coords) = self.cell_coords(position) {
            self.scan_block(coords, position, index, out);
        }
    }

    /// Candidate neighbors around an arbitrary point, optionally skipping one agent.
    pub fn query_position(&self, position: Vec3, exclude: Option<usize>, out: &mut Vec<usize>) {
        out.clear();
        if let Some(coords) = self.cell_coords(position) {
            self.scan_block(coords, position, exclude.unwrap_or(EMPTY), out);
        }
    }

    // Walk the 3x3x3 block of cells around `center`
    fn scan_block(&self, center: [usize; 3], origin: Vec3, exclude: usize, out: &mut Vec<usize>) {
        let range = |axis: usize| {
            let lo = center[axis].saturating_sub(1);
            let hi = (center[axis] + 1).min(self.dims[axis] - 1);
            lo..=hi
        };

        let cell_size = self.cell_size;
        for z in range(2) {
            for y in range(1) {
                for x in range(0) {
                    let mut candidate = self.head[self.flatten([x, y, z])];

                    while candidate != EMPTY {
                        if candidate != exclude {
                            let other = self.positions[candidate];
                            // Cheap per-axis rejects before accepting
                            if (other.x - origin.x).abs() <= cell_size
                                && (other.y - origin.y).abs() <= cell_size
                                && (other.z - origin.z).abs() <= cell_size
                            {
                                out.push(candidate);
                            }
                        }
                        candidate = self.next[candidate];
                    }
                }
            }
        }
    }

    /// Agents in one cell, most recently inserted first.
    pub fn bucket(&self, cell: usize) -> Bucket<'_> {
        Bucket {
            next: &self.next,
            current: self.head.get(cell).copied().unwrap_or(EMPTY),
        }
    }
}

pub struct Bucket<'a> {
    next: &'a [usize],
    current: usize,
}

impl Iterator for Bucket<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current == EMPTY {
            return None;
        }
        let item = self.current;
        self.current = self.next[item];
        Some(item)
    }
}
