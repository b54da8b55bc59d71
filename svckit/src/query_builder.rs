// svckit/src/query_builder.rs
//
// Canonical query strings for the LogPulse REST API

/// Ordered query-string builder that drops absent and empty values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pairs: Vec<(String, String)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key=value` unless the value is absent or renders as an empty string.
    pub fn param<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push<V: ToString>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.pairs.push((key.to_string(), value));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    /// Form-encoded query string with a leading `?`, or `""` when nothing survived.
    pub fn build(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let mut serializer = form_urlencoded::Serializer::for_suffix(String::from("?"), 1);
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    pub fn append_to(&self, path: &str) -> String {
        format!("{}{}", path, self.build())
    }
}

/// Builds a query string from `(key, value)` pairs in iteration order.
pub fn build_query<K, V, I>(params: I) -> String
where
    K: AsRef<str>,
    V: ToString,
    I: IntoIterator<Item = (K, Option<V>)>,
{
    params
        .into_iter()
        .fold(QueryBuilder::new(), |builder, (key, value)| builder.param(key.as_ref(), value))
        .build()
}
