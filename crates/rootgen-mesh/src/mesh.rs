//! The indexed polygon mesh shared by every stage of the pipeline.

use rootgen_math::{Point3, Transform, Vec3};

use crate::error::{MeshError, Result};

/// An indexed surface: points, polygonal faces and 2-point polylines.
///
/// Faces and lines store indices into `points`. Operations return new
/// meshes; a `PolyMesh` is never shared mutably between stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    /// Vertex positions. The index of a point is its vertex id.
    pub points: Vec<Point3>,
    /// Polygonal faces, each an ordered list of at least three point ids.
    pub faces: Vec<Vec<u32>>,
    /// Polyline edges as point id pairs.
    pub lines: Vec<[u32; 2]>,
}

impl PolyMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from points and faces, without lines.
    pub fn from_faces(points: Vec<Point3>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            points,
            faces,
            lines: Vec::new(),
        }
    }

    /// Create a lines-only mesh.
    pub fn from_lines(points: Vec<Point3>, lines: Vec<[u32; 2]>) -> Self {
        Self {
            points,
            faces: Vec::new(),
            lines,
        }
    }

    /// Number of points.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of polyline edges.
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// True when the mesh has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check that every face has at least three vertices and that every
    /// face and line index is in range.
    pub fn validate(&self) -> Result<()> {
        let count = self.points.len();
        for (item, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(MeshError::FaceTooSmall {
                    face: item,
                    len: face.len(),
                });
            }
            if let Some(&index) = face.iter().find(|&&i| i as usize >= count) {
                return Err(MeshError::IndexOutOfRange {
                    element: "face",
                    item,
                    index,
                    count,
                });
            }
        }
        for (item, line) in self.lines.iter().enumerate() {
            if let Some(&index) = line.iter().find(|&&i| i as usize >= count) {
                return Err(MeshError::IndexOutOfRange {
                    element: "line",
                    item,
                    index,
                    count,
                });
            }
        }
        Ok(())
    }

    /// A copy of this mesh moved by `offset`.
    pub fn translated(&self, offset: &Vec3) -> Self {
        Self {
            points: self.points.iter().map(|p| p + offset).collect(),
            faces: self.faces.clone(),
            lines: self.lines.clone(),
        }
    }

    /// A copy of this mesh with every point mapped through `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            points: self.points.iter().map(|p| transform.apply_point(p)).collect(),
            faces: self.faces.clone(),
            lines: self.lines.clone(),
        }
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (lo.inf(p), hi.sup(p))
        }))
    }

    /// Drop points not referenced by any face or line and renumber the rest,
    /// keeping their relative order.
    pub fn compacted(&self) -> Self {
        let mut remap: Vec<Option<u32>> = vec![None; self.points.len()];
        for &i in self.faces.iter().flatten().chain(self.lines.iter().flatten()) {
            remap[i as usize] = Some(0);
        }
        let mut points = Vec::new();
        for (i, slot) in remap.iter_mut().enumerate() {
            if slot.is_some() {
                *slot = Some(points.len() as u32);
                points.push(self.points[i]);
            }
        }
        let map = |i: &u32| remap[*i as usize].unwrap_or(0);
        Self {
            points,
            faces: self
                .faces
                .iter()
                .map(|f| f.iter().map(map).collect())
                .collect(),
            lines: self.lines.iter().map(|l| [map(&l[0]), map(&l[1])]).collect(),
        }
    }
}

/// Concatenate meshes, offsetting the indices of each one past the points of
/// the meshes before it.
pub fn append(meshes: &[&PolyMesh]) -> PolyMesh {
    let mut out = PolyMesh::new();
    for mesh in meshes {
        let offset = out.points.len() as u32;
        out.points.extend_from_slice(&mesh.points);
        out.faces.extend(
            mesh.faces
                .iter()
                .map(|f| f.iter().map(|&i| i + offset).collect::<Vec<_>>()),
        );
        out.lines
            .extend(mesh.lines.iter().map(|l| [l[0] + offset, l[1] + offset]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_square() -> PolyMesh {
        PolyMesh::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        )
    }

    #[test]
    fn test_validate_ok() {
        assert!(make_square().validate().is_ok());
    }

    #[test]
    fn test_validate_out_of_range() {
        let mut mesh = make_square();
        mesh.faces.push(vec![0, 1, 4]);
        assert_eq!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange {
                element: "face",
                item: 2,
                index: 4,
                count: 4
            })
        );

        let mut mesh = make_square();
        mesh.lines.push([3, 9]);
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange { element: "line", .. })
        ));
    }

    #[test]
    fn test_validate_small_face() {
        let mut mesh = make_square();
        mesh.faces.push(vec![0, 1]);
        assert!(matches!(mesh.validate(), Err(MeshError::FaceTooSmall { face: 2, len: 2 })));
    }

    #[test]
    fn test_translated() {
        let mesh = make_square().translated(&Vec3::new(0.0, 0.0, -0.5));
        assert_relative_eq!(mesh.points[2], Point3::new(1.0, 1.0, -0.5));
        assert_eq!(mesh.faces, make_square().faces);
    }

    #[test]
    fn test_bounds() {
        let (lo, hi) = make_square().bounds().unwrap();
        assert_relative_eq!(lo, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(hi, Point3::new(1.0, 1.0, 0.0));
        assert!(PolyMesh::new().bounds().is_none());
    }

    #[test]
    fn test_append_offsets_indices() {
        let a = make_square();
        let b = PolyMesh::from_lines(
            vec![Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 0.0, 0.0)],
            vec![[0, 1]],
        );
        let merged = append(&[&a, &b]);
        assert_eq!(merged.num_points(), 6);
        assert_eq!(merged.num_faces(), 2);
        assert_eq!(merged.lines, vec![[4, 5]]);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_compacted_drops_unused() {
        let mut mesh = make_square();
        mesh.points.insert(0, Point3::new(9.0, 9.0, 9.0));
        for f in &mut mesh.faces {
            for i in f.iter_mut() {
                *i += 1;
            }
        }
        let compact = mesh.compacted();
        assert_eq!(compact, make_square());
    }
}
