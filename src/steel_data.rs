//! Per-point steel properties such as hardness and retained austenite.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::{FatigueError, Result};

/// Name of the Vickers hardness field used by the built-in material laws.
pub const HARDNESS: &str = "HV";

/// Named scalar fields aligned positionally with the points of a stress history.
///
/// Every field has the same length. Fields are kept in name order so that
/// iteration, slicing and expression contexts are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SteelData {
    fields: BTreeMap<String, Vec<f64>>,
    points: usize,
}

impl SteelData {
    /// Builds steel data from named fields, checking that all fields have the same length.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut data = SteelData::default();
        for (name, values) in fields {
            data.insert(name, values)?;
        }
        Ok(data)
    }

    /// Steel data with a single hardness field.
    pub fn from_hardness(hv: Vec<f64>) -> Self {
        let points = hv.len();
        let mut fields = BTreeMap::new();
        fields.insert(HARDNESS.to_string(), hv);
        SteelData { fields, points }
    }

    /// Adds a field. The first field fixes the number of points.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if self.fields.is_empty() {
            self.points = values.len();
        } else if values.len() != self.points {
            return Err(FatigueError::shape(
                format!("steel data field {}", name),
                self.points,
                values.len(),
            ));
        }
        self.fields.insert(name, values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    pub fn field(&self, name: &str) -> Result<&[f64]> {
        self.fields
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| FatigueError::MissingSteelField(name.to_string()))
    }

    pub fn hardness(&self) -> Result<&[f64]> {
        self.field(HARDNESS)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the steel data of the points in `range`, with every field sliced identically.
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.points {
            return Err(FatigueError::InvalidArgument(format!(
                "point range {:?} outside steel data with {} points",
                range, self.points
            )));
        }
        let fields = self
            .fields
            .iter()
            .map(|(name, values)| (name.clone(), values[range.clone()].to_vec()))
            .collect();
        Ok(SteelData {
            fields,
            points: range.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_must_have_equal_length() {
        let err = SteelData::new(vec![("HV", vec![700.0, 710.0]), ("RA", vec![0.1])]).unwrap_err();
        match err {
            FatigueError::ShapeMismatch { expected, actual, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_slice() {
        let data = SteelData::new(vec![
            ("HV", vec![700.0, 710.0, 720.0, 730.0]),
            ("RA", vec![0.1, 0.2, 0.3, 0.4]),
        ])
        .unwrap();
        let part = data.slice(1..3).unwrap();
        assert_eq!(part.len(), 2);
        assert_eq!(part.hardness().unwrap(), &[710.0, 720.0]);
        assert_eq!(part.field("RA").unwrap(), &[0.2, 0.3]);
        assert!(data.slice(3..5).is_err());
    }

    #[test]
    fn test_missing_field() {
        let data = SteelData::from_hardness(vec![750.0]);
        assert!(matches!(
            data.field("RA"),
            Err(FatigueError::MissingSteelField(name)) if name == "RA"
        ));
    }
}
