//! Zoned documents and zone access

use crate::error::{Result, ZoneGapError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Named content region of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "h1")]
    H1,
    #[serde(rename = "subheadings")]
    Subheadings,
    #[serde(rename = "hrefs")]
    Hrefs,
    #[serde(rename = "first_500_chars")]
    First500Chars,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "url_as_text")]
    UrlAsText,
    #[serde(rename = "structures")]
    Structures,
}

impl Zone {
    /// Every zone, in default processing order.
    pub const ALL: [Zone; 8] = [
        Zone::Title,
        Zone::H1,
        Zone::Subheadings,
        Zone::Hrefs,
        Zone::First500Chars,
        Zone::Text,
        Zone::UrlAsText,
        Zone::Structures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Title => "title",
            Zone::H1 => "h1",
            Zone::Subheadings => "subheadings",
            Zone::Hrefs => "hrefs",
            Zone::First500Chars => "first_500_chars",
            Zone::Text => "text",
            Zone::UrlAsText => "url_as_text",
            Zone::Structures => "structures",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = ZoneGapError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Zone::ALL
            .iter()
            .copied()
            .find(|zone| zone.as_str() == wanted)
            .ok_or_else(|| {
                ZoneGapError::InvalidInput(format!(
                    "Unknown zone: {}. Supported: {}",
                    s,
                    Zone::ALL.iter().map(Zone::as_str).collect::<Vec<_>>().join(", ")
                ))
            })
    }
}

/// Parse a comma separated zone list, e.g. `title,h1,text`
pub fn parse_zone_list(input: &str) -> Result<Vec<Zone>> {
    let mut zones = Vec::new();
    for part in input.split(',').filter(|p| !p.trim().is_empty()) {
        let zone: Zone = part.parse()?;
        if !zones.contains(&zone) {
            zones.push(zone);
        }
    }
    Ok(zones)
}

/// Raw value of a zone as produced by the extraction layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneValue {
    Scalar(String),
    Sequence(Vec<String>),
    /// Anything else the extractor emitted. Stringified rather than rejected.
    Other(Box<Value>),
}

impl ZoneValue {
    /// Coerce to a single string. `None` means the zone counts as absent.
    pub fn coerce(&self) -> Option<String> {
        let text = match self {
            ZoneValue::Scalar(s) => s.clone(),
            ZoneValue::Sequence(items) => items.join(" "),
            ZoneValue::Other(value) => stringify_value(value)?.join(" "),
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Split into fragments: a scalar is a one-element list.
    pub fn fragments(&self) -> Vec<String> {
        let items = match self {
            ZoneValue::Scalar(s) => vec![s.clone()],
            ZoneValue::Sequence(items) => items.clone(),
            ZoneValue::Other(value) => stringify_value(value).unwrap_or_default(),
        };

        items
            .into_iter()
            .filter(|item| !item.trim().is_empty())
            .collect()
    }
}

fn stringify_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(vec![s.clone()]),
        Value::Bool(b) => Some(vec![b.to_string()]),
        Value::Number(n) => Some(vec![n.to_string()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(stringify_value)
                .flatten()
                .collect(),
        ),
        Value::Object(_) => Some(vec![value.to_string()]),
    }
}

impl From<&str> for ZoneValue {
    fn from(value: &str) -> Self {
        ZoneValue::Scalar(value.to_string())
    }
}

impl From<String> for ZoneValue {
    fn from(value: String) -> Self {
        ZoneValue::Scalar(value)
    }
}

impl From<Vec<String>> for ZoneValue {
    fn from(value: Vec<String>) -> Self {
        ZoneValue::Sequence(value)
    }
}

impl From<Vec<&str>> for ZoneValue {
    fn from(value: Vec<&str>) -> Self {
        ZoneValue::Sequence(value.into_iter().map(str::to_string).collect())
    }
}

/// A page split into zones by the extraction layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<ZoneValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h1: Option<ZoneValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheadings: Option<ZoneValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrefs: Option<ZoneValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_500_chars: Option<ZoneValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<ZoneValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_as_text: Option<ZoneValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structures: Option<ZoneValue>,
}

impl Document {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Builder-style zone setter
    pub fn with_zone(mut self, zone: Zone, value: impl Into<ZoneValue>) -> Self {
        *self.zone_slot(zone) = Some(value.into());
        self
    }

    pub fn zone(&self, zone: Zone) -> Option<&ZoneValue> {
        match zone {
            Zone::Title => self.title.as_ref(),
            Zone::H1 => self.h1.as_ref(),
            Zone::Subheadings => self.subheadings.as_ref(),
            Zone::Hrefs => self.hrefs.as_ref(),
            Zone::First500Chars => self.first_500_chars.as_ref(),
            Zone::Text => self.text.as_ref(),
            Zone::UrlAsText => self.url_as_text.as_ref(),
            Zone::Structures => self.structures.as_ref(),
        }
    }

    fn zone_slot(&mut self, zone: Zone) -> &mut Option<ZoneValue> {
        match zone {
            Zone::Title => &mut self.title,
            Zone::H1 => &mut self.h1,
            Zone::Subheadings => &mut self.subheadings,
            Zone::Hrefs => &mut self.hrefs,
            Zone::First500Chars => &mut self.first_500_chars,
            Zone::Text => &mut self.text,
            Zone::UrlAsText => &mut self.url_as_text,
            Zone::Structures => &mut self.structures,
        }
    }

    /// Coerced zone text, `None` when the zone is absent or blank
    pub fn zone_text(&self, zone: Zone) -> Option<String> {
        self.zone(zone).and_then(ZoneValue::coerce)
    }

    pub fn zone_fragments(&self, zone: Zone) -> Vec<String> {
        self.zone(zone).map(ZoneValue::fragments).unwrap_or_default()
    }

    pub fn has_zone(&self, zone: Zone) -> bool {
        self.zone_text(zone).is_some()
    }

    /// Whole-document text: coerced zones in the given order, absent ones skipped
    pub fn full_text(&self, zones: &[Zone]) -> String {
        zones
            .iter()
            .filter_map(|zone| self.zone_text(*zone))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Identifier used in gap records
    pub fn identifier(&self, position: usize) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("competitor-{}", position + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_names_round_trip() {
        for zone in Zone::ALL {
            assert_eq!(zone.as_str().parse::<Zone>().unwrap(), zone);
        }
        assert_eq!(Zone::First500Chars.to_string(), "first_500_chars");
        assert!("footer".parse::<Zone>().is_err());
    }

    #[test]
    fn test_parse_zone_list_dedups() {
        let zones = parse_zone_list("title, h1,title,,text").unwrap();
        assert_eq!(zones, vec![Zone::Title, Zone::H1, Zone::Text]);
    }

    #[test]
    fn test_zone_accessor_coercion() {
        let doc = Document::new("https://example.com")
            .with_zone(Zone::Title, "Running Shoes")
            .with_zone(Zone::Subheadings, vec!["Sizes", "Brands"])
            .with_zone(Zone::Hrefs, Vec::<String>::new());

        assert_eq!(doc.zone_text(Zone::Title).as_deref(), Some("Running Shoes"));
        assert_eq!(doc.zone_text(Zone::Subheadings).as_deref(), Some("Sizes Brands"));
        assert_eq!(doc.zone_text(Zone::Hrefs), None);
        assert_eq!(doc.zone_text(Zone::H1), None);
        assert_eq!(doc.zone_fragments(Zone::Title), vec!["Running Shoes".to_string()]);
        assert_eq!(doc.zone_fragments(Zone::Subheadings).len(), 2);
    }

    #[test]
    fn test_full_text_skips_absent_zones() {
        let doc = Document::default()
            .with_zone(Zone::Title, "A")
            .with_zone(Zone::Text, "C")
            .with_zone(Zone::H1, "   ");

        assert_eq!(doc.full_text(&Zone::ALL), "A C");
        assert_eq!(doc.full_text(&[Zone::Text, Zone::Title]), "C A");
    }

    #[test]
    fn test_malformed_values_are_stringified() {
        let doc: Document = serde_json::from_str(
            r#"{"title": 42, "h1": null, "structures": ["a", 1, ["b"]], "text": {"k": "v"}}"#,
        )
        .unwrap();

        assert_eq!(doc.zone_text(Zone::Title).as_deref(), Some("42"));
        assert_eq!(doc.zone_text(Zone::H1), None);
        assert_eq!(doc.zone_fragments(Zone::Structures), vec!["a", "1", "b"]);
        assert_eq!(doc.zone_text(Zone::Text).as_deref(), Some(r#"{"k":"v"}"#));
    }

    #[test]
    fn test_identifier_fallback() {
        assert_eq!(Document::default().identifier(1), "competitor-2");
        assert_eq!(Document::new("u").identifier(0), "u");
    }
}
