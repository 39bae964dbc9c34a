//! DNS-over-HTTPS JSON answers
//!
//! The resolver process prints one JSON document per lookup URL, gathered
//! in a JSON array. Each document has the Google DoH shape:
//!
//! ```json
//! {
//!   "Status": 0,
//!   "Question": [{ "name": "example.com.", "type": 1 }],
//!   "Answer": [{ "name": "example.com.", "type": 1, "TTL": 300, "data": "93.184.216.34" }]
//! }
//! ```
//!
//! Mappings are keyed by the `Question` name, not by the `name` of the
//! matched answer record. The two agree for plain A responses; for a CNAME
//! chain the A record carries the alias target, and keying on it would never
//! match the hostname that was looked up. The answer name (trailing dot
//! trimmed) is used only when a response has no question section.

use serde::Deserialize;
use std::collections::HashMap;
use subsync_core::{Error, Result};
use tracing::debug;

/// A record type
const RECORD_TYPE_A: u16 = 1;

#[derive(Debug, Deserialize)]
struct DnsResponse {
    #[serde(rename = "Question", default)]
    question: Option<Vec<DnsQuestion>>,

    #[serde(rename = "Answer", default)]
    answer: Option<Vec<DnsAnswer>>,
}

#[derive(Debug, Deserialize)]
struct DnsQuestion {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct DnsAnswer {
    #[serde(default)]
    name: String,

    #[serde(rename = "type", default)]
    record_type: Option<u16>,

    #[serde(default)]
    data: String,
}

impl DnsResponse {
    /// Hostname and address this response resolves, if any
    ///
    /// The question name is preferred so a CNAME chain still maps back to
    /// the hostname that was asked for.
    fn mapping(&self) -> Option<(String, String)> {
        let answer = self.answer.as_deref()?.iter().find(|a| {
            a.record_type.is_none_or(|t| t == RECORD_TYPE_A) && !a.data.trim().is_empty()
        })?;

        let asked = self
            .question
            .as_deref()
            .and_then(|q| q.first())
            .map(|q| q.name.as_str())
            .filter(|name| !name.trim().is_empty());

        let name = asked.unwrap_or(answer.name.as_str()).trim().trim_end_matches('.');
        if name.is_empty() {
            return None;
        }

        Some((name.to_string(), answer.data.trim().to_string()))
    }
}

/// Turn decoded resolver output into hostname → address mappings
///
/// The top level must be a JSON array. Entries that do not look like a DoH
/// response, or carry no usable A record, are skipped. For a hostname that
/// appears more than once, the first mapping wins.
pub fn parse_answers(json: &str) -> Result<HashMap<String, String>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| Error::resolver(format!("Resolver output is not a JSON array: {}", e)))?;

    let mut mappings = HashMap::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let response: DnsResponse = match serde_json::from_value(entry) {
            Ok(response) => response,
            Err(e) => {
                debug!("Skipping resolver entry #{}: {}", index, e);
                continue;
            }
        };

        if let Some((name, address)) = response.mapping() {
            mappings.entry(name).or_insert(address);
        }
    }

    Ok(mappings)
}
