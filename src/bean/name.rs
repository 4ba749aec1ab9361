//! Dotted metric names built from bean metadata.

use super::meta::MetricMeta;
use once_cell::sync::Lazy;
use regex::Regex;

static QUOTES_AND_BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["'(){}<>\[\]]"#).expect("Valid quote pattern"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[:,.]+").expect("Valid separator pattern"));
static UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_.+-]+").expect("Valid unsafe pattern"));

/// Make `text` safe for a dotted hierarchical metric name.
///
/// Quotes and brackets are dropped, runs of `:` `,` `.` become a single `.`,
/// and any other run of characters outside `[A-Za-z0-9_.+-]` becomes `_`.
pub fn sanitize(text: &str) -> String {
    let text = QUOTES_AND_BRACKETS.replace_all(text, "");
    let text = SEPARATORS.replace_all(&text, ".");
    UNSAFE.replace_all(&text, "_").into_owned()
}

/// Name for scalar attribute `key` of a bean.
///
/// Components, in order: the configured prefix, the bean namespace, the
/// derived type, the bean name and the lowercased key (left out when it is
/// `value`). Returns `None` when nothing publishable is left after
/// sanitizing.
pub fn metric_name(prefix: Option<&str>, namespace: &str, meta: &MetricMeta, key: &str) -> Option<String> {
    let key = key.to_lowercase();

    let mut components: Vec<&str> = Vec::with_capacity(5);
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        components.push(prefix);
    }
    components.push(namespace);
    if let Some(metric_type) = meta.metric_type.as_deref().filter(|t| !t.is_empty()) {
        components.push(metric_type);
    }
    if let Some(name) = meta.name.as_deref().filter(|n| !n.is_empty()) {
        components.push(name);
    }
    if key != "value" {
        components.push(&key);
    }

    non_empty(sanitize(&components.join(".")))
}

/// Name for percentile `percentile` of the histogram at `path`
pub fn percentile_name(path: &str, percentile: u8) -> Option<String> {
    non_empty(sanitize(&format!("{}.p{}", path, percentile)))
}

fn non_empty(name: String) -> Option<String> {
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("a.b.c"), "a.b.c");
        assert_eq!(sanitize("org.apache:type=Cache"), "org.apache.type_Cache");
        assert_eq!(sanitize("a..b,,c::d"), "a.b.c.d");
        assert_eq!(sanitize("\"quoted\"(x)[y]"), "quotedxy");
        assert_eq!(sanitize("space and/slash"), "space_and_slash");
        assert_eq!(sanitize("keep+-_"), "keep+-_");
        assert_eq!(sanitize("\"'"), "");
    }

    #[test]
    fn test_metric_name_components() {
        let meta = MetricMeta::parse("type=ColumnFamily,scope=Foo,name=Bar").unwrap();
        assert_eq!(
            metric_name(Some("cassandra"), "org.apache.cassandra.db", &meta, "Count").as_deref(),
            Some("cassandra.org.apache.cassandra.db.Foo.Bar.count")
        );
        assert_eq!(
            metric_name(None, "org.apache.cassandra.db", &meta, "Value").as_deref(),
            Some("org.apache.cassandra.db.Foo.Bar")
        );
    }

    #[test]
    fn test_metric_name_without_name_key() {
        let meta = MetricMeta::parse("type=PermissionsCache").unwrap();
        assert_eq!(
            metric_name(None, "org.apache.cassandra.auth", &meta, "Value").as_deref(),
            Some("org.apache.cassandra.auth.PermissionsCache")
        );
    }

    #[test]
    fn test_unsanitizable_name() {
        let meta = MetricMeta::parse("owner=x").unwrap();
        assert_eq!(metric_name(None, "\"'", &meta, "Value"), None);
        assert_eq!(metric_name(Some(""), "()", &meta, "value"), None);
    }

    #[test]
    fn test_percentile_name() {
        assert_eq!(
            percentile_name("org.apache.cassandra.db:type=ColumnFamily,name=cf.RecentReadLatencyHistogramMicros", 99)
                .as_deref(),
            Some("org.apache.cassandra.db.type_ColumnFamily.name_cf.RecentReadLatencyHistogramMicros.p99")
        );
    }
}
