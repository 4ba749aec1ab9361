//! Bean interpretation: classify attribute values, derive dotted metric names
//! from bean identifiers and decide gauge versus counter semantics.

pub mod interpreter;
pub mod meta;
pub mod name;
pub mod value;

pub use interpreter::{AttributeFailure, BeanInterpreter, Interpretation};
pub use meta::{split_bean_id, MetricMeta};
pub use name::{metric_name, percentile_name, sanitize};
pub use value::{attributes_from_json, Attributes, BeanValue};
