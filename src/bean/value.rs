//! Shape of a polled bean's attributes.

use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute name to value, sorted so interpretation order is stable
pub type Attributes = BTreeMap<String, BeanValue>;

/// One attribute value, classified by shape
#[derive(Debug, Clone, PartialEq)]
pub enum BeanValue {
    /// A number; published directly
    Scalar(f64),
    /// A composite attribute holding further attributes
    Nested(Attributes),
    /// A sequence of numbers, candidate histogram buckets
    BucketArray(Vec<f64>),
    /// Anything else (strings, booleans, nulls, mixed arrays)
    Other,
}

impl BeanValue {
    /// Classify a decoded JSON value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or(BeanValue::Other, BeanValue::Scalar),
            Value::Object(map) => BeanValue::Nested(attributes_from_json(map)),
            Value::Array(items) => items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
                .map_or(BeanValue::Other, BeanValue::BucketArray),
            Value::Bool(_) | Value::String(_) | Value::Null => BeanValue::Other,
        }
    }
}

impl From<&Value> for BeanValue {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

/// Classify every member of a JSON object
pub fn attributes_from_json(map: &serde_json::Map<String, Value>) -> Attributes {
    map.iter()
        .map(|(key, value)| (key.clone(), BeanValue::from_json(value)))
        .collect()
}
