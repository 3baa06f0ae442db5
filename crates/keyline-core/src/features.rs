//! GeoJSON feature assembly for the analysis output.
//!
//! The collection carries Point features for keypoints and pond sites and
//! LineString features for keylines. Keylines below the minimum point count
//! are excluded here and only here: they still exist in the result's
//! `keylines` list, so callers working with raw geometry must apply their
//! own length filter.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::keyline::Keyline;
use crate::keypoint::Keypoint;
use crate::pond::PondSite;

/// Keylines with fewer traced points than this are degenerate and left out
/// of the feature collection.
pub const MIN_KEYLINE_POINTS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub geometry: Geometry,
    pub properties: Value,
}

impl Feature {
    fn new(geometry: Geometry, properties: Value) -> Self {
        Self { feature_type: "Feature".to_string(), geometry, properties }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self { collection_type: "FeatureCollection".to_string(), features: Vec::new() }
    }
}

/// Package keypoints, keylines, and pond sites into one feature collection.
pub fn assemble_features(
    keypoints: &[Keypoint],
    keylines: &[Keyline],
    pond_sites: &[PondSite],
) -> FeatureCollection {
    let mut features = Vec::new();

    for kp in keypoints {
        features.push(Feature::new(
            Geometry::Point { coordinates: [kp.lng, kp.lat] },
            json!({
                "type": "keypoint",
                "elevation": kp.elevation,
                "slopeAbove": kp.slope_above,
                "slopeBelow": kp.slope_below,
                "confidence": kp.confidence * 100.0,
                "pondSuitability": kp.pond_suitability * 100.0,
            }),
        ));
    }

    for kl in keylines {
        if kl.coordinates.len() < MIN_KEYLINE_POINTS {
            continue;
        }
        features.push(Feature::new(
            Geometry::LineString { coordinates: kl.coordinates.clone() },
            json!({
                "type": "keyline",
                "elevation": kl.elevation,
                "length": kl.length,
                "recommendedSpacing": kl.recommended_spacing,
            }),
        ));
    }

    for site in pond_sites {
        features.push(Feature::new(
            Geometry::Point { coordinates: [site.lng, site.lat] },
            json!({
                "type": "pond-site",
                "elevation": site.elevation,
                "catchmentArea": site.catchment_area,
                "suggestedSize": site.suggested_size,
                "score": site.score * 100.0,
                "reasons": site.reasons,
            }),
        ));
    }

    FeatureCollection { collection_type: "FeatureCollection".to_string(), features }
}
