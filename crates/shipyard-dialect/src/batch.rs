//! Bulk framing rules, one per wire protocol.
//!
//! | backend | framing |
//! |---|---|
//! | search | `header\nquery\n` per query, trailing newline |
//! | property graph | `{"statements": [{statement, parameters}, ...]}` |
//! | declarative graph | `{` named blocks `}` as raw bytes |
//! | scripted traversal | `{"gremlin": script, "bindings": {name: [...]}}` |
//! | embedded engine | JSON array of statement strings |
//!
//! Every framer accepts an empty input and yields the backend's empty batch.

use crate::request::{ContentType, Payload, RequestBody};
use bytes::Bytes;
use serde_json::{json, Value};

/// Newline-delimited `(header, query)` pairs.
pub fn ndjson_pairs<I>(header: &Value, queries: I) -> RequestBody
where
    I: IntoIterator<Item = String>,
{
    let header = header.to_string();
    let mut body = String::new();
    for query in queries {
        body.push_str(&header);
        body.push('\n');
        body.push_str(&query);
        body.push('\n');
    }
    RequestBody::text(ContentType::NdJson, body)
}

pub fn statements_envelope(statements: Vec<Value>) -> RequestBody {
    RequestBody::json(&json!({ "statements": statements }))
}

pub fn dql_document<I>(blocks: I) -> RequestBody
where
    I: IntoIterator<Item = String>,
{
    let mut document = String::from("{");
    for block in blocks {
        document.push_str(&block);
    }
    document.push('}');
    RequestBody {
        content_type: ContentType::Dql,
        payload: Payload::Binary(Bytes::from(document)),
    }
}

pub fn gremlin_envelope(script: String, binding: &str, values: Vec<Value>) -> RequestBody {
    let mut bindings = serde_json::Map::new();
    bindings.insert(binding.to_string(), Value::Array(values));
    RequestBody::json(&json!({
        "gremlin": script,
        "bindings": bindings,
    }))
}

pub fn statement_list(statements: Vec<String>) -> RequestBody {
    RequestBody {
        content_type: ContentType::Json,
        payload: Payload::Statements(statements),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndjson_trailing_newline() {
        let body = ndjson_pairs(&json!({"index": "i"}), vec!["{}".to_string()]);
        assert_eq!(body.payload.as_text().unwrap(), "{\"index\":\"i\"}\n{}\n");
        let empty = ndjson_pairs(&json!({"index": "i"}), Vec::new());
        assert_eq!(empty.payload.as_text().unwrap(), "");
    }

    #[test]
    fn test_empty_envelopes() {
        assert_eq!(
            statements_envelope(Vec::new()).payload.as_text().unwrap(),
            "{\"statements\":[]}"
        );
        assert_eq!(dql_document(Vec::new()).payload.as_text().unwrap(), "{}");
        assert_eq!(statement_list(Vec::new()).payload.to_bytes().as_ref(), b"[]");
        let gremlin = gremlin_envelope("return []".to_string(), "samples", Vec::new());
        let value: Value = serde_json::from_str(gremlin.payload.as_text().unwrap()).unwrap();
        assert_eq!(value["bindings"]["samples"], json!([]));
    }
}
