//! Request and response types for the accounts proxy.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};

use crate::cache::CachedPayload;

/// Inbound query parameters, forwarded upstream as-is.
///
/// A repeated key keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(IndexMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = IndexMap::new();
        for (k, v) in pairs {
            map.insert(k.into(), v.into());
        }
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Target of a single upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub path: String,
    pub query: QueryParams,
}

impl UpstreamRequest {
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url, self.path.trim_start_matches('/'))
    }
}

/// Upstream body, parsed as JSON when possible.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Parsed(Value),
    Raw(String),
}

impl UpstreamBody {
    /// Never fails: anything that is not valid JSON comes back as `Raw`.
    pub fn try_parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Parsed(value),
            Err(_) => Self::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Raw text is wrapped as `{"text": ...}`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Parsed(value) => value,
            Self::Raw(text) => json!({ "text": text }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Cache,
    Nibo,
}

/// Successful `/accounts` reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountsReply {
    pub source: ReplySource,
    #[serde(flatten)]
    pub payload: CachedPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_parse_accepts_json() {
        let body = UpstreamBody::try_parse(br#"{"a":1}"#);
        assert_eq!(body, UpstreamBody::Parsed(json!({ "a": 1 })));
    }

    #[test]
    fn try_parse_falls_back_to_text() {
        let body = UpstreamBody::try_parse(b"<html>oops</html>");
        assert_eq!(body.into_value(), json!({ "text": "<html>oops</html>" }));

        let empty = UpstreamBody::try_parse(b"");
        assert_eq!(empty.into_value(), json!({ "text": "" }));
    }

    #[test]
    fn try_parse_handles_invalid_utf8() {
        let body = UpstreamBody::try_parse(&[0xff, 0xfe, b'x']);
        match body {
            UpstreamBody::Raw(text) => assert!(text.ends_with('x')),
            other => panic!("expected raw body, got {other:?}"),
        }
    }

    #[test]
    fn repeated_keys_keep_first_position_and_last_value() {
        let q = QueryParams::from_pairs([("$top", "10"), ("$skip", "5"), ("$top", "20")]);
        let pairs: Vec<_> = q.iter().collect();
        assert_eq!(pairs, vec![("$top", "20"), ("$skip", "5")]);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn url_joins_base_and_path() {
        let req = UpstreamRequest {
            path: "/empresas/v1/accounts".into(),
            query: QueryParams::new(),
        };
        assert_eq!(
            req.url("https://api.nibo.com.br"),
            "https://api.nibo.com.br/empresas/v1/accounts"
        );
    }

    #[test]
    fn reply_serializes_flat() {
        let reply = AccountsReply {
            source: ReplySource::Nibo,
            payload: CachedPayload {
                status: 200,
                data: json!({ "a": 1 }),
            },
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({ "source": "nibo", "status": 200, "data": { "a": 1 } })
        );
    }
}
