//! Persisted form of the source collection.
//!
//! Records are read leniently: a missing or mistyped field takes its default
//! and a malformed list element is skipped, so a partly damaged document
//! still restores everything it can.

use crate::automation::{AutomationPoint, PathAutomation};
use crate::path::{PathKind, PathPoint, SourcePath};
use crate::position::Spherical;
use crate::source::SoundSource;
use crate::sources::Sources;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spatia_core::MAX_SOURCES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub radius: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub selected: bool,
    pub path_type: PathKind,
    pub path_points: Vec<PathPoint>,
    pub automation_points: Vec<AutomationPoint>,
}

impl Default for SourceRecord {
    fn default() -> Self {
        Self::from(&SoundSource::default())
    }
}

impl From<&SoundSource> for SourceRecord {
    fn from(source: &SoundSource) -> Self {
        let position = source.position();
        Self {
            radius: position.radius(),
            azimuth: position.azimuth(),
            elevation: position.elevation(),
            selected: source.is_selected(),
            path_type: source.path().kind(),
            path_points: source.path().points().to_vec(),
            automation_points: source.automation().points().to_vec(),
        }
    }
}

impl SourceRecord {
    /// Reads a record, falling back to defaults field by field.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        Self {
            radius: field(value, "radius").unwrap_or(defaults.radius),
            azimuth: field(value, "azimuth").unwrap_or(defaults.azimuth),
            elevation: field(value, "elevation").unwrap_or(defaults.elevation),
            selected: field(value, "selected").unwrap_or(defaults.selected),
            path_type: field(value, "path_type").unwrap_or(defaults.path_type),
            path_points: list(value, "path_points"),
            automation_points: list(value, "automation_points"),
        }
    }

    pub fn into_source(self) -> SoundSource {
        SoundSource::from_parts(
            Spherical::new(self.radius, self.azimuth, self.elevation),
            self.selected,
            false,
            SourcePath::from_points(
                self.path_points
                    .into_iter()
                    .filter(|p| p.position.is_finite())
                    .collect(),
                self.path_type,
            ),
            PathAutomation::from_points(self.automation_points),
        )
    }
}

fn field<T: DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    value
        .get(key)
        .and_then(|v| T::deserialize(v).ok())
}

fn list<T: DeserializeOwned>(value: &Value, key: &str) -> Vec<T> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| T::deserialize(v).ok()).collect())
        .unwrap_or_default()
}

/// Serialises every source, in index order.
pub fn sources_to_records(sources: &Sources) -> Vec<SourceRecord> {
    sources.iter().map(SourceRecord::from).collect()
}

/// Rebuilds the collection from persisted records. Records past
/// [`MAX_SOURCES`] are dropped.
pub fn sources_from_values(values: &[Value]) -> Sources {
    if values.len() > MAX_SOURCES {
        tracing::warn!(
            "Persisted state holds {} sources, keeping the first {}",
            values.len(),
            MAX_SOURCES
        );
    }
    let items: Vec<SoundSource> = values
        .iter()
        .take(MAX_SOURCES)
        .map(|v| SourceRecord::from_value(v).into_source())
        .collect();
    Sources::from_vec(items).unwrap_or_else(|_| Sources::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Vec3;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_record_round_trip() {
        let mut sources = Sources::default();
        sources.add_source_at(Vec3::new(0.0, 1.0, 2.0));
        sources.drop_path_point(None);
        sources.drop_path_point(Some(Vec3::new(3.0, 0.0, 0.0)));
        sources.add_automation_point(1.5, 0.25);

        let values: Vec<Value> = sources_to_records(&sources)
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect();
        let restored = sources_from_values(&values);

        assert_eq!(restored.len(), 2);
        let original = &sources[1];
        let reloaded = &restored[1];
        assert_relative_eq!(reloaded.xyz().y, original.xyz().y, epsilon = 1e-6);
        assert_eq!(reloaded.path(), original.path());
        assert_eq!(reloaded.automation(), original.automation());
        assert!(reloaded.is_selected());
    }

    #[test]
    fn test_mistyped_fields_take_defaults() {
        let value = json!({
            "radius": "far",
            "azimuth": 1.0,
            "path_type": 7,
            "path_points": [
                {"position": {"x": 1.0, "y": 0.0, "z": 0.0}},
                "junk",
            ],
        });
        let record = SourceRecord::from_value(&value);
        assert_eq!(record.radius, 1.0);
        assert_eq!(record.azimuth, 1.0);
        assert_eq!(record.path_type, PathKind::Open);
        assert_eq!(record.path_points.len(), 1);
        assert!(record.automation_points.is_empty());
    }

    #[test]
    fn test_non_object_record_is_default_source() {
        let restored = sources_from_values(&[json!(42)]);
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0], SoundSource::default());
    }

    #[test]
    fn test_excess_records_are_dropped() {
        let values = vec![json!({}); MAX_SOURCES + 2];
        assert_eq!(sources_from_values(&values).len(), MAX_SOURCES);
    }
}
