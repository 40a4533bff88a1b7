//! Request and response payloads, and the handlers that serve them.
//!
//! Two request shapes are accepted. The XML form carries a VTK PolyData
//! document in `polydata` and is answered with the root as a Base64-wrapped
//! document. The flat form carries `pointValues` / `cellValues` arrays and
//! is answered in kind.

use log::info;
use serde::{Deserialize, Serialize};

use rootgen_io::{read_vtp, read_vtp_base64, write_vtp_base64, FlatMesh};
use rootgen_math::Point3;
use rootgen_mesh::PolyMesh;

use crate::error::{Result, RootError};
use crate::frame::LandmarkPoints;
use crate::pipeline::{generate_root, RootOutput};
use crate::settings::RootSettings;

/// Landmark record sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsInfo {
    /// Tooth identifier, echoed in the response.
    pub tooth_name: String,
    /// Bottom landmark.
    pub bottom_sphere_center: [f64; 3],
    /// Top landmark.
    pub top_sphere_center: [f64; 3],
    /// Radius landmark.
    pub radius_sphere_center: [f64; 3],
}

impl PointsInfo {
    /// The landmark positions.
    pub fn landmarks(&self) -> LandmarkPoints {
        LandmarkPoints {
            bottom: Point3::from(self.bottom_sphere_center),
            top: Point3::from(self.top_sphere_center),
            radius_ref: Point3::from(self.radius_sphere_center),
        }
    }
}

/// Request carrying a VTK XML PolyData crown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XmlRootRequest {
    /// The crown document, as XML or Base64-wrapped XML.
    pub polydata: String,
    /// Landmarks.
    pub points_info: PointsInfo,
}

/// Response to an [`XmlRootRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XmlRootResponse {
    /// Tooth identifier from the request.
    pub tooth_name: String,
    /// The root document, Base64-wrapped.
    pub polydata: String,
}

/// Request carrying a crown as flat arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRootRequest {
    /// The crown mesh.
    #[serde(flatten)]
    pub mesh: FlatMesh,
    /// Landmarks.
    pub points_info: PointsInfo,
}

/// Response to a [`FlatRootRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRootResponse {
    /// Tooth identifier from the request.
    pub tooth_name: String,
    /// The root mesh.
    #[serde(flatten)]
    pub mesh: FlatMesh,
}

/// Decode a `polydata` field, accepting raw or Base64-wrapped XML.
pub fn decode_polydata(polydata: &str) -> Result<PolyMesh> {
    let trimmed = polydata.trim_start();
    let mesh = if trimmed.starts_with('<') {
        read_vtp(trimmed)?
    } else {
        read_vtp_base64(trimmed)?
    };
    Ok(mesh)
}

/// Serve an XML request.
pub fn handle_xml(request: &XmlRootRequest, settings: &RootSettings) -> Result<XmlRootResponse> {
    let crown = decode_polydata(&request.polydata)?;
    let out = run(&crown, &request.points_info, settings)?;
    Ok(XmlRootResponse {
        tooth_name: request.points_info.tooth_name.clone(),
        polydata: write_vtp_base64(&out.mesh),
    })
}

/// Serve a flat-array request.
pub fn handle_flat(request: &FlatRootRequest, settings: &RootSettings) -> Result<FlatRootResponse> {
    let crown = request.mesh.to_mesh()?;
    let out = run(&crown, &request.points_info, settings)?;
    Ok(FlatRootResponse {
        tooth_name: request.points_info.tooth_name.clone(),
        mesh: FlatMesh::from_mesh(&out.mesh),
    })
}

/// Parse and serve a JSON request body of either shape, returning the
/// JSON response body.
pub fn handle_json(body: &str, settings: &RootSettings) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let response = if value.get("polydata").is_some() {
        let request: XmlRootRequest = serde_json::from_value(value)?;
        serde_json::to_string(&handle_xml(&request, settings)?)?
    } else if value.get("pointValues").is_some() {
        let request: FlatRootRequest = serde_json::from_value(value)?;
        serde_json::to_string(&handle_flat(&request, settings)?)?
    } else {
        return Err(RootError::InputParse(
            "request has neither polydata nor pointValues".into(),
        ));
    };
    Ok(response)
}

fn run(crown: &PolyMesh, info: &PointsInfo, settings: &RootSettings) -> Result<RootOutput> {
    info!(
        "generating root for tooth {:?}: {} points, {} faces",
        info.tooth_name,
        crown.num_points(),
        crown.num_faces()
    );
    generate_root(crown, &info.landmarks(), settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rootgen_io::write_vtp;

    fn square_settings() -> RootSettings {
        RootSettings {
            smooth: false,
            clean_single_point_faces: false,
            ..Default::default()
        }
    }

    fn points_info() -> PointsInfo {
        PointsInfo {
            tooth_name: "UR1".into(),
            bottom_sphere_center: [0.0, 0.0, -10.0],
            top_sphere_center: [0.0, 0.0, 0.0],
            radius_sphere_center: [1.0, 0.0, 0.0],
        }
    }

    fn square_flat() -> FlatMesh {
        FlatMesh {
            point_values: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            cell_values: vec![3, 0, 1, 2, 3, 0, 2, 3],
        }
    }

    #[test]
    fn test_points_info_json() {
        let json = r#"{
            "toothName": "LL6",
            "bottomSphereCenter": [1, 2, 3],
            "topSphereCenter": [1, 2, 9],
            "radiusSphereCenter": [2.5, 2, 3]
        }"#;
        let info: PointsInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.tooth_name, "LL6");
        let lm = info.landmarks();
        assert_eq!(lm.top, Point3::new(1.0, 2.0, 9.0));
        assert_eq!(lm.radius_ref, Point3::new(2.5, 2.0, 3.0));
    }

    #[test]
    fn test_handle_flat() {
        let request = FlatRootRequest {
            mesh: square_flat(),
            points_info: points_info(),
        };
        let response = handle_flat(&request, &square_settings()).unwrap();
        assert_eq!(response.tooth_name, "UR1");
        let mesh = response.mesh.to_mesh().unwrap();
        assert!(mesh.num_faces() > 0);
    }

    #[test]
    fn test_handle_xml_raw_and_wrapped() {
        let crown = square_flat().to_mesh().unwrap();
        for polydata in [write_vtp(&crown), write_vtp_base64(&crown)] {
            let request = XmlRootRequest {
                polydata,
                points_info: points_info(),
            };
            let response = handle_xml(&request, &square_settings()).unwrap();
            assert_eq!(response.tooth_name, "UR1");
            let root = read_vtp_base64(&response.polydata).unwrap();
            assert!(root.num_faces() > 0);
            assert!(root.validate().is_ok());
        }
    }

    #[test]
    fn test_handle_json_dispatch() {
        let body = serde_json::json!({
            "pointValues": square_flat().point_values,
            "cellValues": square_flat().cell_values,
            "pointsInfo": points_info(),
        })
        .to_string();
        let out: serde_json::Value =
            serde_json::from_str(&handle_json(&body, &square_settings()).unwrap()).unwrap();
        assert_eq!(out["toothName"], "UR1");
        assert!(out["cellValues"].as_array().is_some_and(|c| !c.is_empty()));

        let err = handle_json(r#"{"pointsInfo": {}}"#, &square_settings()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputParse);
        let err = handle_json("not json", &square_settings()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputParse);
    }

    #[test]
    fn test_bad_payloads() {
        let request = XmlRootRequest {
            polydata: "<VTKFile type=\"PolyData\" compressor=\"vtkZLibDataCompressor\"/>".into(),
            points_info: points_info(),
        };
        let err = handle_xml(&request, &square_settings()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputParse);

        let mut flat = square_flat();
        flat.cell_values.push(7);
        let request = FlatRootRequest {
            mesh: flat,
            points_info: points_info(),
        };
        let err = handle_flat(&request, &square_settings()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputParse);
    }
}
