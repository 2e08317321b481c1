//! Request body and query-string decoding.
//!
//! Decoding never fails. A body that cannot be understood for its declared
//! content type becomes an empty map; the raw bytes stay on the request.

use serde_json::{Map, Value};
use tracing::debug;
use url::form_urlencoded;

/// Parses `raw` according to `content_type` into a field map.
pub(crate) fn parse(raw: &[u8], content_type: &str) -> Map<String, Value> {
    if content_type.contains("application/json") {
        json_object(raw)
    } else if content_type.contains("application/x-www-form-urlencoded") {
        urlencoded(raw)
    } else if content_type.contains("multipart/form-data") {
        match boundary(content_type) {
            Some(boundary) => multipart(raw, boundary),
            None => {
                debug!(content_type, "multipart body without boundary");
                Map::new()
            }
        }
    } else {
        Map::new()
    }
}

/// Decodes a query string. Repeated keys keep the last value.
pub(crate) fn query(raw: &str) -> Map<String, Value> {
    urlencoded(raw.as_bytes())
}

fn json_object(raw: &[u8]) -> Map<String, Value> {
    if raw.is_empty() {
        return Map::new();
    }
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            debug!("json body is not an object");
            Map::new()
        }
        Err(e) => {
            debug!(error = %e, "malformed json body");
            Map::new()
        }
    }
}

fn urlencoded(raw: &[u8]) -> Map<String, Value> {
    form_urlencoded::parse(raw)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

fn boundary(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|b| !b.is_empty())
}

/// Text fields of a `multipart/form-data` body. File parts are skipped.
fn multipart(raw: &[u8], boundary: &str) -> Map<String, Value> {
    let delimiter = format!("--{boundary}");
    let mut fields = Map::new();

    for part in split(raw, delimiter.as_bytes()).skip(1) {
        // `--` right after the delimiter closes the body.
        if part.starts_with(b"--") {
            break;
        }
        let part = part.strip_prefix(b"\r\n").unwrap_or(part);
        let Some(split_at) = find(part, b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&part[..split_at]);
        let value = &part[split_at + 4..];
        let value = value.strip_suffix(b"\r\n").unwrap_or(value);

        let Some(disposition) = head
            .split("\r\n")
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.trim().eq_ignore_ascii_case("content-disposition").then_some(value)
            })
        else {
            continue;
        };

        if disposition_param(disposition, "filename").is_some() {
            continue;
        }
        if let Some(name) = disposition_param(disposition, "name") {
            fields.insert(
                name.to_owned(),
                Value::String(String::from_utf8_lossy(value).into_owned()),
            );
        }
    }
    fields
}

fn disposition_param<'a>(disposition: &'a str, key: &str) -> Option<&'a str> {
    disposition
        .split(';')
        .filter_map(|p| p.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().trim_matches('"'))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split<'a>(mut rest: &'a [u8], delimiter: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match find(rest, delimiter) {
            Some(at) => {
                let head = &rest[..at];
                rest = &rest[at + delimiter.len()..];
                Some(head)
            }
            None => {
                done = true;
                Some(rest)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_object_body() {
        let map = parse(br#"{"name":"alice","age":30}"#, "application/json; charset=utf-8");
        assert_eq!(Value::Object(map), json!({"name": "alice", "age": 30}));
    }

    #[test]
    fn json_degrades_to_empty() {
        assert!(parse(b"", "application/json").is_empty());
        assert!(parse(b"{not json", "application/json").is_empty());
        assert!(parse(b"[1,2,3]", "application/json").is_empty());
        assert!(parse(b"42", "application/json").is_empty());
    }

    #[test]
    fn urlencoded_form() {
        let map = parse(b"name=alice+smith&city=K%C3%B6ln&name=bob", "application/x-www-form-urlencoded");
        assert_eq!(map.get("name"), Some(&json!("bob")));
        assert_eq!(map.get("city"), Some(&json!("Köln")));
    }

    #[test]
    fn multipart_text_fields() {
        let body = b"--XyZ\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\
\r\n\
hello world\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
file body\r\n\
--XyZ\r\n\
content-disposition: form-data; name=\"count\"\r\n\
\r\n\
3\r\n\
--XyZ--\r\n";
        let map = parse(body, "multipart/form-data; boundary=\"XyZ\"");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("title"), Some(&json!("hello world")));
        assert_eq!(map.get("count"), Some(&json!("3")));
    }

    #[test]
    fn multipart_without_boundary_is_empty() {
        assert!(parse(b"--x\r\n", "multipart/form-data").is_empty());
    }

    #[test]
    fn other_content_types_are_ignored() {
        assert!(parse(b"a=1", "text/plain").is_empty());
        assert!(parse(b"a=1", "").is_empty());
    }

    #[test]
    fn query_last_value_wins() {
        let map = query("page=2&sort=name&page=3");
        assert_eq!(map.get("page"), Some(&json!("3")));
        assert_eq!(map.get("sort"), Some(&json!("name")));
    }
}
