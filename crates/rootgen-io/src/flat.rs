//! Flat numeric mesh form used by JSON requests.
//!
//! `point_values` holds `x0, y0, z0, x1, ...`. `cell_values` is a sequence of
//! count-prefixed cells: `n, i0, .., i(n-1)`. A count of 2 is a line; a count
//! of 3 or more is a polygonal face.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use rootgen_math::Point3;
use rootgen_mesh::PolyMesh;

use crate::error::{IoError, Result};

/// A mesh as two flat number arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatMesh {
    /// Point coordinates, three per point.
    pub point_values: Vec<f64>,
    /// Count-prefixed cells. Integral floats such as `3.0` are accepted.
    #[serde(deserialize_with = "integral_values")]
    pub cell_values: Vec<i64>,
}

/// A cell entry as sent by clients that build the array from a float buffer.
#[derive(Deserialize)]
#[serde(untagged)]
enum CellValue {
    Int(i64),
    Float(f64),
}

/// Largest magnitude below which every integer is exact in an `f64`.
const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

fn integral_values<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<CellValue>::deserialize(deserializer)?
        .into_iter()
        .map(|value| match value {
            CellValue::Int(i) => Ok(i),
            CellValue::Float(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT => Ok(f as i64),
            CellValue::Float(f) => Err(D::Error::custom(format!("cell value {f} is not an integer"))),
        })
        .collect()
}

impl FlatMesh {
    /// Flatten a mesh: lines first, then faces.
    pub fn from_mesh(mesh: &PolyMesh) -> Self {
        let point_values = mesh.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        let mut cell_values = Vec::new();
        for line in &mesh.lines {
            cell_values.extend([2, line[0] as i64, line[1] as i64]);
        }
        for face in &mesh.faces {
            cell_values.push(face.len() as i64);
            cell_values.extend(face.iter().map(|&i| i as i64));
        }
        Self {
            point_values,
            cell_values,
        }
    }

    /// Rebuild the indexed mesh, validating counts and indices.
    pub fn to_mesh(&self) -> Result<PolyMesh> {
        if self.point_values.len() % 3 != 0 {
            return Err(IoError::InvalidData(format!(
                "pointValues length {} is not a multiple of 3",
                self.point_values.len()
            )));
        }
        let points: Vec<Point3> = self
            .point_values
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();

        let mut mesh = PolyMesh::from_faces(points, Vec::new());
        let mut rest = self.cell_values.as_slice();
        while let Some((&count, tail)) = rest.split_first() {
            let count = usize::try_from(count)
                .ok()
                .filter(|&c| c >= 2 && c <= tail.len())
                .ok_or_else(|| {
                    IoError::InvalidData(format!(
                        "cell count {count} at offset {}",
                        self.cell_values.len() - rest.len()
                    ))
                })?;
            let (cell, next) = tail.split_at(count);
            let ids = cell
                .iter()
                .map(|&i| {
                    u32::try_from(i)
                        .map_err(|_| IoError::InvalidData(format!("negative or huge index {i}")))
                })
                .collect::<Result<Vec<u32>>>()?;
            if count == 2 {
                mesh.lines.push([ids[0], ids[1]]);
            } else {
                mesh.faces.push(ids);
            }
            rest = next;
        }

        mesh.validate()?;
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_layout() {
        let flat = FlatMesh {
            point_values: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            cell_values: vec![3, 0, 1, 2, 3, 0, 2, 3],
        };
        let mesh = flat.to_mesh().unwrap();
        assert_eq!(mesh.num_points(), 4);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(FlatMesh::from_mesh(&mesh), flat);
    }

    #[test]
    fn test_lines_and_quads() {
        let flat = FlatMesh {
            point_values: vec![0.0; 12],
            cell_values: vec![2, 0, 1, 4, 0, 1, 2, 3],
        };
        let mesh = flat.to_mesh().unwrap();
        assert_eq!(mesh.lines, vec![[0, 1]]);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_json_field_names() {
        let json = r#"{"pointValues":[0,0,0,1,0,0,0,1,0],"cellValues":[3,0,1,2]}"#;
        let flat: FlatMesh = serde_json::from_str(json).unwrap();
        assert_eq!(flat.to_mesh().unwrap().num_faces(), 1);
        let out = serde_json::to_string(&flat).unwrap();
        assert!(out.contains("\"pointValues\""));
        assert!(out.contains("\"cellValues\""));
    }

    #[test]
    fn test_integral_float_cells() {
        let json = r#"{"pointValues":[0,0,0,1,0,0,0,1,0],"cellValues":[3.0,0,1.0,2]}"#;
        let flat: FlatMesh = serde_json::from_str(json).unwrap();
        assert_eq!(flat.cell_values, vec![3, 0, 1, 2]);
        assert_eq!(flat.to_mesh().unwrap().faces, vec![vec![0, 1, 2]]);

        let json = r#"{"pointValues":[0,0,0,1,0,0,0,1,0],"cellValues":[3,0,1.5,2]}"#;
        assert!(serde_json::from_str::<FlatMesh>(json).is_err());
        let json = r#"{"pointValues":[],"cellValues":[1e300]}"#;
        assert!(serde_json::from_str::<FlatMesh>(json).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        let bad_points = FlatMesh {
            point_values: vec![0.0; 4],
            cell_values: vec![],
        };
        assert!(matches!(bad_points.to_mesh(), Err(IoError::InvalidData(_))));

        let truncated = FlatMesh {
            point_values: vec![0.0; 9],
            cell_values: vec![3, 0, 1],
        };
        assert!(matches!(truncated.to_mesh(), Err(IoError::InvalidData(_))));

        let single = FlatMesh {
            point_values: vec![0.0; 9],
            cell_values: vec![1, 0],
        };
        assert!(matches!(single.to_mesh(), Err(IoError::InvalidData(_))));

        let negative = FlatMesh {
            point_values: vec![0.0; 9],
            cell_values: vec![3, 0, -1, 2],
        };
        assert!(matches!(negative.to_mesh(), Err(IoError::InvalidData(_))));

        let out_of_range = FlatMesh {
            point_values: vec![0.0; 9],
            cell_values: vec![3, 0, 1, 5],
        };
        assert!(matches!(out_of_range.to_mesh(), Err(IoError::Mesh(_))));
    }
}
