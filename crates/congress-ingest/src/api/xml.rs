//! XML body decoding
//!
//! Some records fail to serialize as JSON upstream but come back fine as
//! XML. This converts an XML document into the same tree shape the JSON
//! endpoints return:
//!
//! - the result is `{ <root-tag>: <root-value> }`
//! - an element without child elements becomes its trimmed text, or `null`
//! - an element with children becomes an object keyed by child tag
//! - repeated child tags collapse into an array in document order
//!
//! Attributes are ignored; the API does not use them for data.

use crate::error::{IngestError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

struct Frame {
    tag: String,
    children: Map<String, Value>,
    has_children: bool,
    text: String,
}

impl Frame {
    fn new(tag: String) -> Self {
        Self {
            tag,
            children: Map::new(),
            has_children: false,
            text: String::new(),
        }
    }

    fn add_child(&mut self, tag: String, value: Value) {
        self.has_children = true;
        match self.children.get_mut(&tag) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            },
            None => {
                self.children.insert(tag, value);
            },
        }
    }

    fn into_value(self) -> (String, Value) {
        let value = if self.has_children {
            Value::Object(self.children)
        } else {
            let text = self.text.trim();
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        };
        (self.tag, value)
    }
}

/// Parse an XML document into a JSON tree keyed by its root tag
pub fn parse_document(input: &str) -> Result<Value> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(IngestError::malformed("XML has more than one root element"));
                }
                let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(Frame::new(tag));
            },
            Ok(Event::Empty(empty)) => {
                let tag = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                attach(&mut stack, &mut root, tag, Value::Null)?;
            },
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| IngestError::malformed(format!("Invalid XML text: {}", e)))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {},
                    None => {
                        return Err(IngestError::malformed("XML has text outside the root element"))
                    },
                }
            },
            Ok(Event::CData(data)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            },
            Ok(Event::End(_)) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| IngestError::malformed("Unbalanced XML end tag"))?;
                let (tag, value) = frame.into_value();
                attach(&mut stack, &mut root, tag, value)?;
            },
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions, doctypes
            Ok(_) => {},
            Err(e) => {
                return Err(IngestError::malformed(format!(
                    "Failed to parse XML at position {}: {}",
                    reader.error_position(),
                    e
                )))
            },
        }
    }

    if !stack.is_empty() {
        return Err(IngestError::malformed("XML document ended inside an element"));
    }

    let (tag, value) = root.ok_or_else(|| IngestError::malformed("XML has no root element"))?;
    let mut document = Map::new();
    document.insert(tag, value);
    Ok(Value::Object(document))
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
    tag: String,
    value: Value,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.add_child(tag, value);
            Ok(())
        },
        None if root.is_none() => {
            *root = Some((tag, value));
            Ok(())
        },
        None => Err(IngestError::malformed("XML has more than one root element")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_document() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<api-root>
  <committeeMeeting>
    <eventId>115538</eventId>
    <title> Hearing on Appropriations </title>
    <location/>
    <committees>
      <item><name>Agriculture</name><systemCode>hsag00</systemCode></item>
      <item><name>Budget</name><systemCode>hsbu00</systemCode></item>
    </committees>
  </committeeMeeting>
</api-root>"#;

        let value = parse_document(xml).unwrap();
        assert_eq!(
            value,
            json!({
                "api-root": {
                    "committeeMeeting": {
                        "eventId": "115538",
                        "title": "Hearing on Appropriations",
                        "location": null,
                        "committees": {
                            "item": [
                                {"name": "Agriculture", "systemCode": "hsag00"},
                                {"name": "Budget", "systemCode": "hsbu00"}
                            ]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_escaped_text_and_cdata() {
        let value = parse_document("<r><a>Ways &amp; Means</a><b><![CDATA[x < y]]></b></r>").unwrap();
        assert_eq!(value, json!({"r": {"a": "Ways & Means", "b": "x < y"}}));
    }

    #[test]
    fn test_three_repeats_stay_in_order() {
        let value = parse_document("<r><i>1</i><i>2</i><i>3</i></r>").unwrap();
        assert_eq!(value, json!({"r": {"i": ["1", "2", "3"]}}));
    }

    #[test]
    fn test_rejects_non_xml() {
        assert!(parse_document("not a document").is_err());
        assert!(parse_document("").is_err());
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a/><b/>").is_err());
    }
}
