//! Parsing of bean identifiers such as
//! `org.apache.cassandra.metrics:type=ClientRequest,scope=Read,name=Latency`.

use crate::core::{JmxstatError, Result};
use std::collections::BTreeMap;

/// Split an identifier (or an identifier extended with `.attribute` suffixes)
/// into its namespace and its `key=value` metadata at the first colon
pub fn split_bean_id(prefix: &str) -> Result<(&str, &str)> {
    prefix
        .split_once(':')
        .ok_or_else(|| JmxstatError::MalformedBeanId(prefix.to_string()))
}

/// Naming-relevant parts of a bean's metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricMeta {
    /// Value of the `name` key
    pub name: Option<String>,
    /// Value of `scope` if present and non-empty, else of `type`
    pub metric_type: Option<String>,
    /// Every other key, passed along with the published metrics
    pub dimensions: BTreeMap<String, String>,
}

impl MetricMeta {
    /// Parse comma separated `key=value` items. Every item must hold exactly
    /// one `=`; later duplicates win.
    pub fn parse(meta: &str) -> Result<Self> {
        let mut pairs = BTreeMap::new();
        for item in meta.split(',') {
            match item.split_once('=') {
                Some((key, value)) if !value.contains('=') => {
                    pairs.insert(key.to_string(), value.to_string());
                },
                _ => return Err(JmxstatError::malformed_meta(meta, item)),
            }
        }

        // Beans like org.apache.cassandra.auth:type=PermissionsCache carry no name
        let name = pairs.remove("name");
        let literal_type = pairs.remove("type");
        let scope = pairs.remove("scope").filter(|scope| !scope.is_empty());

        Ok(Self {
            name,
            metric_type: scope.or(literal_type),
            dimensions: pairs,
        })
    }

    /// Parse the metadata half of a full bean identifier
    pub fn from_bean_id(bean_id: &str) -> Result<Self> {
        let (_, meta) = split_bean_id(bean_id)?;
        Self::parse(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_on_first_colon() {
        assert_eq!(
            split_bean_id("org.apache.cassandra.db:type=Caches").unwrap(),
            ("org.apache.cassandra.db", "type=Caches")
        );
        assert_eq!(split_bean_id("a:b=c:d").unwrap(), ("a", "b=c:d"));
        assert!(matches!(
            split_bean_id("no-colon-here"),
            Err(JmxstatError::MalformedBeanId(_))
        ));
    }

    #[test]
    fn test_scope_overrides_type() {
        let meta = MetricMeta::parse("type=ColumnFamily,keyspace=ks,scope=Foo,name=Bar").unwrap();
        assert_eq!(meta.name.as_deref(), Some("Bar"));
        assert_eq!(meta.metric_type.as_deref(), Some("Foo"));
        assert_eq!(
            meta.dimensions,
            BTreeMap::from([("keyspace".to_string(), "ks".to_string())])
        );
    }

    #[test]
    fn test_empty_scope_keeps_type() {
        let meta = MetricMeta::parse("type=Cache,scope=").unwrap();
        assert_eq!(meta.metric_type.as_deref(), Some("Cache"));
    }

    #[test]
    fn test_missing_name() {
        let meta = MetricMeta::parse("type=PermissionsCache").unwrap();
        assert_eq!(meta.name, None);
        assert_eq!(meta.metric_type.as_deref(), Some("PermissionsCache"));
        assert!(meta.dimensions.is_empty());
    }

    #[test]
    fn test_malformed_items() {
        assert!(matches!(
            MetricMeta::parse("type=Cache,broken"),
            Err(JmxstatError::MalformedMeta { item, .. }) if item == "broken"
        ));
        assert!(MetricMeta::parse("name=a=b").is_err());
        assert!(MetricMeta::parse("").is_err());
    }

    #[test]
    fn test_from_bean_id() {
        let meta = MetricMeta::from_bean_id("org.apache.cassandra.metrics:type=Client,name=connectedNativeClients").unwrap();
        assert_eq!(meta.name.as_deref(), Some("connectedNativeClients"));
        assert_eq!(meta.metric_type.as_deref(), Some("Client"));
    }
}
