//! Grouping of fetched records by space and measurement type.
//!
//! A record belongs to every space its sensor was discovered under. Within a
//! space, each numeric field becomes one [`MeasurementGroup`] whose values are
//! ordered by `(timestamp, sensor_id)`.
//!
//! Only spaces with at least one attached sensor, document or image produce a
//! [`SpaceResult`]. Results are ordered by space name, groups by field name.

use super::traversal::ResolvedSet;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use twinfed_types::measurement::{
    Measurement, MeasurementGroup, MeasurementRecord, MeasurementSummary, unit_for,
};
use twinfed_types::query::SpaceResult;

#[derive(Default)]
struct SpaceAccumulator {
    result: Option<SpaceResult>,
    groups: BTreeMap<String, Vec<Measurement>>,
}

impl SpaceAccumulator {
    fn result(&mut self, name: &str) -> &mut SpaceResult {
        self.result.get_or_insert_with(|| SpaceResult::new(name))
    }
}

/// Merge the resolved set and fetched records into per-space results.
pub fn aggregate(resolved: &ResolvedSet, records: &[MeasurementRecord]) -> Vec<SpaceResult> {
    let mut spaces: BTreeMap<String, SpaceAccumulator> = BTreeMap::new();
    let mut membership: FxHashMap<&str, Vec<&str>> = FxHashMap::default();

    for sensor in &resolved.sensors {
        membership
            .entry(sensor.id.as_str())
            .or_default()
            .push(sensor.space.as_str());
        spaces
            .entry(sensor.space.clone())
            .or_default()
            .result(&sensor.space)
            .sensors
            .push(sensor.clone());
    }
    for document in &resolved.documents {
        spaces
            .entry(document.space.clone())
            .or_default()
            .result(&document.space)
            .documents
            .push(document.clone());
    }
    for image in &resolved.images {
        spaces
            .entry(image.space.clone())
            .or_default()
            .result(&image.space)
            .images
            .push(image.clone());
    }

    let mut orphaned = 0usize;
    for record in records {
        let Some(member_of) = membership.get(record.sensor_id.as_str()) else {
            orphaned += 1;
            continue;
        };

        for space in member_of {
            let Some(acc) = spaces.get_mut(*space) else {
                continue;
            };
            for (field, value) in &record.fields {
                acc.groups.entry(field.clone()).or_default().push(Measurement {
                    sensor_id: record.sensor_id.clone(),
                    timestamp: record.timestamp,
                    value: *value,
                });
            }
        }
    }
    if orphaned > 0 {
        log::debug!("{} records belong to no resolved sensor; ignored", orphaned);
    }

    spaces
        .into_values()
        .filter_map(|acc| {
            let mut result = acc.result?;
            result.sensors.sort_by(|a, b| a.id.cmp(&b.id));
            result.documents.sort_by(|a, b| a.identity().cmp(b.identity()));
            result.images.sort_by(|a, b| a.identity().cmp(b.identity()));
            result.measurements = acc
                .groups
                .into_iter()
                .map(|(field, values)| build_group(field, values))
                .collect();
            Some(result)
        })
        .collect()
}

fn build_group(name: String, mut values: Vec<Measurement>) -> MeasurementGroup {
    values.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.sensor_id.cmp(&b.sensor_id))
    });
    let summary = MeasurementSummary::from_values(&values);

    MeasurementGroup {
        unit: unit_for(&name).to_string(),
        name,
        values,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinfed_types::entity::{Document, Image, Sensor};

    fn sensor(id: &str, space: &str) -> Sensor {
        Sensor {
            id: id.to_string(),
            name: None,
            x: None,
            y: None,
            space: space.to_string(),
        }
    }

    fn resolved(sensors: Vec<Sensor>) -> ResolvedSet {
        ResolvedSet {
            sensors,
            ..ResolvedSet::default()
        }
    }

    #[test]
    fn test_temperature_values_ordered_with_unit() {
        let set = resolved(vec![sensor("s1", "Room")]);
        let records = vec![
            MeasurementRecord::new("s1", 200).with_field("temperature", 21.0),
            MeasurementRecord::new("s1", 100).with_field("temperature", 20.0),
        ];

        let results = aggregate(&set, &records);
        assert_eq!(results.len(), 1);

        let group = results[0].measurement("temperature").unwrap();
        assert_eq!(group.unit, "°C");
        let pairs: Vec<(i64, f64)> = group.values.iter().map(|m| (m.timestamp, m.value)).collect();
        assert_eq!(pairs, vec![(100, 20.0), (200, 21.0)]);

        let summary = group.summary.as_ref().unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, 20.5);
        assert_eq!(summary.first_timestamp, 100);
        assert_eq!(summary.last_timestamp, 200);
    }

    #[test]
    fn test_multi_membership_not_merged() {
        let set = resolved(vec![sensor("meter", "House"), sensor("meter", "Garage")]);
        let records = vec![MeasurementRecord::new("meter", 10).with_field("power", 1500.0)];

        let results = aggregate(&set, &records);
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Garage", "House"]);

        for result in &results {
            assert_eq!(result.sensors.len(), 1);
            let power = result.measurement("power").unwrap();
            assert_eq!(power.unit, "W");
            assert_eq!(power.values.len(), 1);
        }
    }

    #[test]
    fn test_every_numeric_field_gets_a_group() {
        let set = resolved(vec![sensor("s1", "Kitchen"), sensor("s2", "Kitchen")]);
        let records = vec![
            MeasurementRecord::new("s1", 5)
                .with_field("humidity", 40.0)
                .with_field("voc", 3.0),
            MeasurementRecord::new("s2", 5).with_field("humidity", 42.0),
        ];

        let results = aggregate(&set, &records);
        let groups: Vec<(&str, &str)> = results[0]
            .measurements
            .iter()
            .map(|g| (g.name.as_str(), g.unit.as_str()))
            .collect();
        assert_eq!(groups, vec![("humidity", "%"), ("voc", "units")]);

        let humidity = results[0].measurement("humidity").unwrap();
        let ids: Vec<&str> = humidity.values.iter().map(|m| m.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
    }

    #[test]
    fn test_attachments_without_records() {
        let set = ResolvedSet {
            documents: vec![Document {
                id: "d".into(),
                name: Some("Manual".into()),
                url: Some("manual.pdf".into()),
                space: "Boiler".into(),
            }],
            images: vec![Image {
                id: "i".into(),
                name: None,
                url: Some("boiler.jpg".into()),
                space: "Boiler".into(),
            }],
            ..ResolvedSet::default()
        };

        let results = aggregate(&set, &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Boiler");
        assert_eq!(results[0].documents.len(), 1);
        assert_eq!(results[0].images.len(), 1);
        assert!(results[0].measurements.is_empty());
    }

    #[test]
    fn test_sensor_without_records_keeps_space() {
        let set = resolved(vec![sensor("quiet", "Attic")]);
        let results = aggregate(&set, &[]);
        assert_eq!(results.len(), 1);
        assert!(results[0].measurements.is_empty());
        assert_eq!(results[0].sensors[0].id, "quiet");
    }

    #[test]
    fn test_unknown_sensor_records_ignored() {
        let set = resolved(vec![sensor("s1", "Room")]);
        let records = vec![MeasurementRecord::new("stranger", 1).with_field("temperature", 99.0)];

        let results = aggregate(&set, &records);
        assert!(results[0].measurements.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&ResolvedSet::default(), &[]).is_empty());
    }
}
