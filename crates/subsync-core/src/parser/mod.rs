// # JSON Server-List Parser
//
// Minimal `ShareLinkParser` for subscriptions that publish their servers as a
// JSON array of server objects, either raw or wrapped in standard base64
// (as many subscription endpoints do).
//
// ```json
// [
//   { "hostname": "hk1.example.com", "port": 443, "type": "trojan", "remark": "HK 1", "password": "..." }
// ]
// ```
//
// Share-link formats (ss://, vmess://, ...) belong to the embedding
// application's own parser.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::traits::{Server, ShareLinkParser};
use crate::{Error, Result};

/// Parser for JSON server lists
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonServerParser;

impl JsonServerParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    fn parse_json(text: &str) -> Result<Vec<Server>> {
        let servers: Vec<Server> = serde_json::from_str(text)
            .map_err(|e| Error::parse(format!("Invalid server list: {}", e)))?;

        if let Some(index) = servers.iter().position(|s| s.hostname.trim().is_empty()) {
            return Err(Error::parse(format!(
                "Server #{} has an empty hostname",
                index + 1
            )));
        }

        Ok(servers)
    }
}

impl ShareLinkParser for JsonServerParser {
    fn parse(&self, text: &str) -> Result<Vec<Server>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        if text.starts_with('[') {
            return Self::parse_json(text);
        }

        let compact: String = text.split_whitespace().collect();
        let decoded = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::parse(format!("Payload is neither JSON nor base64: {}", e)))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|e| Error::parse(format!("Decoded payload is not UTF-8: {}", e)))?;

        Self::parse_json(decoded.trim())
    }

    fn parser_name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        { "hostname": "hk1.example.com", "port": 443, "type": "trojan", "remark": "HK 1", "password": "secret" },
        { "hostname": "jp1.example.com", "port": 8388, "type": "ss", "remark": "JP 1", "group": "stale" }
    ]"#;

    #[test]
    fn parses_plain_json_and_keeps_opaque_fields() {
        let servers = JsonServerParser::new().parse(SAMPLE).unwrap();

        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].hostname, "hk1.example.com");
        assert_eq!(servers[0].kind, "trojan");
        assert_eq!(servers[0].extra.get("password"), Some(&serde_json::json!("secret")));
        assert_eq!(servers[1].port, 8388);
    }

    #[test]
    fn parses_base64_wrapped_json() {
        let encoded = STANDARD.encode(SAMPLE);
        // Line-wrapped payloads are common
        let wrapped = format!("{}\n{}", &encoded[..40], &encoded[40..]);

        let servers = JsonServerParser::new().parse(&wrapped).unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].remark, "JP 1");
    }

    #[test]
    fn empty_payload_is_an_empty_list() {
        assert!(JsonServerParser::new().parse("  \n").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = JsonServerParser::new().parse("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn blank_hostname_is_rejected() {
        let err = JsonServerParser::new()
            .parse(r#"[ { "hostname": " ", "port": 1 } ]"#)
            .unwrap_err();
        assert!(err.to_string().contains("#1"));
    }
}
