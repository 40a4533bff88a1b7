//! Tolerance-based point lookup on a quantized grid.
//!
//! Coordinates are bucketed into cubic cells of edge `tolerance`; a query
//! probes its own cell and the 26 around it, so any stored point within
//! `tolerance` is found regardless of which side of a cell wall it fell on.

use std::collections::HashMap;

use rootgen_math::{Point3, Tolerance};

type CellKey = (i64, i64, i64);

/// Smallest cell edge, keeps the inverse finite.
const MIN_CELL: f64 = 1e-12;

/// A set of points with tolerance-based membership.
#[derive(Debug, Clone)]
pub struct PointSet {
    tolerance: Tolerance,
    inv_cell: f64,
    cells: HashMap<CellKey, Vec<u32>>,
    points: Vec<Point3>,
}

impl PointSet {
    /// Create an empty set matching points within `tolerance` of each other.
    pub fn new(tolerance: f64) -> Self {
        let cell = if tolerance.is_finite() {
            tolerance.max(MIN_CELL)
        } else {
            1e-5
        };
        Self {
            tolerance: Tolerance::with_linear(cell),
            inv_cell: 1.0 / cell,
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    /// Build a set holding every point of `points`, duplicates included.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>, tolerance: f64) -> Self {
        let mut set = Self::new(tolerance);
        for p in points {
            set.insert(*p);
        }
        set
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point is stored.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Stored points in insertion order.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Store `p` unconditionally and return its id.
    pub fn insert(&mut self, p: Point3) -> u32 {
        let id = self.points.len() as u32;
        self.cells.entry(self.key(&p)).or_default().push(id);
        self.points.push(p);
        id
    }

    /// Return the id of a stored point within tolerance of `p`, storing `p`
    /// first when there is none. The flag is true when `p` was new.
    pub fn insert_unique(&mut self, p: Point3) -> (u32, bool) {
        match self.find(&p) {
            Some(id) => (id, false),
            None => (self.insert(p), true),
        }
    }

    /// Id of the nearest stored point within tolerance of `p`.
    pub fn find(&self, p: &Point3) -> Option<u32> {
        let (kx, ky, kz) = self.key(p);
        let mut best: Option<(u32, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&(
                        kx.saturating_add(dx),
                        ky.saturating_add(dy),
                        kz.saturating_add(dz),
                    )) else {
                        continue;
                    };
                    for &id in bucket {
                        let q = &self.points[id as usize];
                        if !self.tolerance.points_equal(q, p) {
                            continue;
                        }
                        let d2 = (q - p).norm_squared();
                        if best.map_or(true, |(_, b)| d2 < b) {
                            best = Some((id, d2));
                        }
                    }
                }
            }
        }
        best.map(|(id, _)| id)
    }

    /// The matching tolerance.
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// True when a stored point lies within tolerance of `p`.
    pub fn contains(&self, p: &Point3) -> bool {
        self.find(p).is_some()
    }

    fn key(&self, p: &Point3) -> CellKey {
        // float-to-int casts saturate, NaN lands in cell 0
        (
            (p.x * self.inv_cell).floor() as i64,
            (p.y * self.inv_cell).floor() as i64,
            (p.z * self.inv_cell).floor() as i64,
        )
    }
}
