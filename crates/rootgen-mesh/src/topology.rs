//! Edge-to-face incidence and vertex adjacency.

use std::collections::HashMap;

use rootgen_math::Vec3;

use crate::mesh::PolyMesh;

/// Undirected edge with the smaller point id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub u32, pub u32);

impl EdgeKey {
    /// Canonical key for the edge between `a` and `b`.
    #[inline]
    pub fn new(a: u32, b: u32) -> Self {
        if a < b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }
}

/// Directed edges of a polygon in winding order, closing back to the start.
pub fn face_edges(face: &[u32]) -> impl Iterator<Item = (u32, u32)> + '_ {
    let n = face.len();
    (0..n).map(move |i| (face[i], face[(i + 1) % n]))
}

/// Map from every undirected edge to the faces using it.
#[derive(Debug, Clone, Default)]
pub struct EdgeMap {
    uses: HashMap<EdgeKey, Vec<usize>>,
}

impl EdgeMap {
    /// Build the incidence map of `mesh`'s faces.
    pub fn build(mesh: &PolyMesh) -> Self {
        let mut uses: HashMap<EdgeKey, Vec<usize>> = HashMap::with_capacity(mesh.faces.len() * 3);
        for (fi, face) in mesh.faces.iter().enumerate() {
            for (a, b) in face_edges(face) {
                if a != b {
                    uses.entry(EdgeKey::new(a, b)).or_default().push(fi);
                }
            }
        }
        Self { uses }
    }

    /// Faces using the edge `a`–`b`.
    pub fn faces_of(&self, a: u32, b: u32) -> &[usize] {
        self.uses
            .get(&EdgeKey::new(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True when exactly one face uses the edge `a`–`b`.
    pub fn is_boundary(&self, a: u32, b: u32) -> bool {
        self.faces_of(a, b).len() == 1
    }

    /// All edges with their incident faces.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &Vec<usize>)> {
        self.uses.iter()
    }

    /// Number of distinct edges.
    pub fn len(&self) -> usize {
        self.uses.len()
    }

    /// True when the mesh had no face edges.
    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }
}

/// Sorted, deduplicated edge neighbours of every point.
pub fn vertex_neighbors(mesh: &PolyMesh) -> Vec<Vec<u32>> {
    let mut neighbors = vec![Vec::new(); mesh.points.len()];
    for face in &mesh.faces {
        for (a, b) in face_edges(face) {
            if a != b {
                neighbors[a as usize].push(b);
                neighbors[b as usize].push(a);
            }
        }
    }
    for n in &mut neighbors {
        n.sort_unstable();
        n.dedup();
    }
    neighbors
}

/// Unit normal of face `face` by Newell's method, zero for degenerate faces.
pub fn face_normal(mesh: &PolyMesh, face: usize) -> Vec3 {
    let ids = &mesh.faces[face];
    let mut n = Vec3::zeros();
    for (a, b) in face_edges(ids) {
        let p = mesh.points[a as usize];
        let q = mesh.points[b as usize];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n.try_normalize(0.0).unwrap_or_else(Vec3::zeros)
}
