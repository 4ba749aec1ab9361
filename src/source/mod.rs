//! Bean sources.
//!
//! Beans arrive as Jolokia `read` responses. A response either covers a
//! single MBean, in which case `value` is its attribute map, or an MBean
//! pattern such as `org.apache.cassandra.metrics:*`, in which case `value`
//! maps each matching bean identifier to its attribute map. Documents may
//! hold one response or a bulk array of them.

use crate::bean::{attributes_from_json, Attributes};
use crate::core::{JmxstatError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

const STATUS_OK: u16 = 200;
const READ: &str = "read";

/// One polled bean
#[derive(Debug, Clone, PartialEq)]
pub struct Bean {
    /// `<namespace>:<key>=<value>,...`
    pub id: String,
    /// Classified attributes
    pub attributes: Attributes,
}

/// Request echoed back by the agent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JolokiaRequest {
    /// MBean name or pattern
    #[serde(default)]
    pub mbean: Option<String>,
    /// Request type; only `read` responses carry attribute values
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// One Jolokia response
#[derive(Debug, Clone, Deserialize)]
pub struct JolokiaResponse {
    /// The request this answers
    #[serde(default)]
    pub request: Option<JolokiaRequest>,
    /// Payload
    #[serde(default)]
    pub value: Value,
    /// HTTP-like status code
    pub status: u16,
    /// Error message for failed requests
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Bulk(Vec<JolokiaResponse>),
    Single(JolokiaResponse),
}

/// Beans fetched in one cycle plus whatever could not be fetched
#[derive(Debug, Default)]
pub struct SourceBatch {
    /// Beans to interpret
    pub beans: Vec<Bean>,
    /// Responses or inputs that failed; the rest of the batch is usable
    pub failures: Vec<JmxstatError>,
}

impl SourceBatch {
    fn absorb(&mut self, other: SourceBatch) {
        self.beans.extend(other.beans);
        self.failures.extend(other.failures);
    }
}

fn is_pattern(mbean: &str) -> bool {
    mbean.contains(['*', '?'])
}

impl JolokiaResponse {
    /// Extract the beans carried by this response
    pub fn into_beans(self) -> Result<Vec<Bean>> {
        if self.status != STATUS_OK {
            return Err(JmxstatError::Agent {
                status: self.status,
                message: self.error.unwrap_or_else(|| "no error message".to_string()),
            });
        }

        let request = self.request.unwrap_or_default();
        if let Some(kind) = request.kind.as_deref().filter(|kind| !kind.eq_ignore_ascii_case(READ)) {
            tracing::debug!("Ignoring Jolokia {} response", kind);
            return Ok(Vec::new());
        }

        let Value::Object(map) = self.value else {
            tracing::debug!("Ignoring non-object Jolokia value");
            return Ok(Vec::new());
        };

        let single = request.mbean.filter(|mbean| !is_pattern(mbean));

        if let Some(id) = single {
            return Ok(vec![Bean {
                id,
                attributes: attributes_from_json(&map),
            }]);
        }

        Ok(map
            .into_iter()
            .filter_map(|(id, attributes)| match attributes {
                Value::Object(attributes) => Some(Bean {
                    attributes: attributes_from_json(&attributes),
                    id,
                }),
                _ => {
                    tracing::debug!("Ignoring bean {} without attribute map", id);
                    None
                },
            })
            .collect())
    }
}

/// Decode a Jolokia document. Malformed JSON fails the whole document;
/// failed responses inside a bulk document are reported individually.
pub fn parse_document(text: &str) -> Result<SourceBatch> {
    let responses = match serde_json::from_str::<Document>(text) {
        Ok(Document::Bulk(responses)) => responses,
        Ok(Document::Single(response)) => vec![response],
        Err(_) => {
            // Re-parse without the untagged wrapper for a useful message
            serde_json::from_str::<JolokiaResponse>(text)?;
            return Err(JmxstatError::parse("unrecognized Jolokia document"));
        },
    };

    let mut batch = SourceBatch::default();
    for response in responses {
        match response.into_beans() {
            Ok(beans) => batch.beans.extend(beans),
            Err(error) => batch.failures.push(error),
        }
    }
    Ok(batch)
}

/// Supplies the beans of one poll cycle
pub trait BeanSource {
    /// Fetch every bean available right now
    fn fetch(&mut self) -> Result<SourceBatch>;
}

/// Reads Jolokia documents from files, typically refreshed by an agent-side
/// dump or a sidecar
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: Vec<PathBuf>,
}

impl FileSource {
    /// Create a source over `paths`
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Files read on every fetch
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl BeanSource for FileSource {
    fn fetch(&mut self) -> Result<SourceBatch> {
        let mut batch = SourceBatch::default();
        for path in &self.paths {
            let document = std::fs::read_to_string(path)
                .map_err(JmxstatError::from)
                .and_then(|text| parse_document(&text));

            match document {
                Ok(document) => batch.absorb(document),
                Err(error) => {
                    tracing::warn!("Failed to read beans from {:?}: {}", path, error);
                    batch.failures.push(error);
                },
            }
        }
        Ok(batch)
    }
}

/// Fixed set of beans, handy for tests and replays
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    beans: Vec<Bean>,
}

impl StaticSource {
    /// Create a source returning `beans` on every fetch
    pub fn new(beans: Vec<Bean>) -> Self {
        Self { beans }
    }
}

impl BeanSource for StaticSource {
    fn fetch(&mut self) -> Result<SourceBatch> {
        Ok(SourceBatch {
            beans: self.beans.clone(),
            failures: Vec::new(),
        })
    }
}
