//! Base implementation of records.
use crate::error::BorderError;
use std::collections::HashMap;

/// Values stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, typically a loss or a learning rate.
    Scalar(f32),
}

/// Mapping from metric names to values.
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair, overwriting an existing value.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Gets the value associated with `k`.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Gets a scalar value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist.
    pub fn get_scalar(&self, k: &str) -> Result<f32, BorderError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            None => Err(BorderError::RecordKeyError(k.to_string())),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_scalar() {
        let mut record = Record::from_slice(&[("loss", RecordValue::Scalar(0.5))]);
        assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
        assert!(matches!(
            record.get_scalar("lr"),
            Err(BorderError::RecordKeyError(_))
        ));

        record.insert("loss", RecordValue::Scalar(0.25));
        record.insert("lr", RecordValue::Scalar(1e-3));
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("loss"), Some(&RecordValue::Scalar(0.25)));
        assert_eq!(record.get_scalar("lr").unwrap(), 1e-3);
    }

    #[test]
    fn test_empty() {
        let record = Record::empty();
        assert!(record.is_empty());
        assert!(record.get("loss").is_none());
    }
}
