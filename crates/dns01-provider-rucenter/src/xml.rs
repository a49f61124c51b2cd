//! DNS-master XML wire format
//!
//! The API speaks small XML documents:
//!
//! ```xml
//! <!-- zone listing -->
//! <response><data>
//!   <zone service="EXAMPLE-SVC" name="example.com" has-primary="true"/>
//! </data></response>
//!
//! <!-- record listing -->
//! <response><data><zone ...>
//!   <rr id="210074"><name>_acme-challenge</name><type>TXT</type>
//!     <txt><string>token</string></txt></rr>
//! </zone></data></response>
//! ```
//!
//! Parsing builds a small element tree with `quick-xml` and then picks
//! elements out by name, wherever they sit in the document.

use dns01_core::{TxtRecord, Zone};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

/// Result type for codec operations; the error is a human-readable cause
pub type XmlResult<T> = Result<T, String>;

/// XML element with attributes, child elements and text content
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let attributes = start
            .attributes()
            .filter_map(|a| a.ok())
            .map(|a| {
                (
                    String::from_utf8_lossy(a.key.as_ref()).to_string(),
                    String::from_utf8_lossy(&a.value).to_string(),
                )
            })
            .collect();

        Self {
            name,
            attributes,
            ..Self::default()
        }
    }

    /// Element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text content of this element
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All elements with the given name below this one, in document order
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }
}

/// Parse a document into its root element
pub fn parse(body: &[u8]) -> XmlResult<XmlElement> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let finished = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(XmlElement::from_start(&e));
                None
            }
            Ok(Event::Empty(e)) => close(&mut stack, XmlElement::from_start(&e)),
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| format!("invalid text: {e}"))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
                None
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
                None
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or("unbalanced end tag")?;
                close(&mut stack, element)
            }
            Ok(Event::Eof) => return Err("document has no complete root element".to_string()),
            Err(e) => {
                return Err(format!(
                    "invalid XML at position {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            // Declarations, comments, processing instructions, doctype
            Ok(_) => None,
        };

        if let Some(root) = finished {
            return Ok(root);
        }
        buf.clear();
    }
}

/// Attach a finished element to its parent, or hand it back as the root
fn close(stack: &mut [XmlElement], element: XmlElement) -> Option<XmlElement> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            None
        }
        None => Some(element),
    }
}

/// Zones from a zone listing, keeping only those with `has-primary="true"`
pub fn parse_zones(body: &[u8]) -> XmlResult<Vec<Zone>> {
    let root = parse(body)?;

    Ok(root
        .descendants("zone")
        .into_iter()
        .filter(|z| z.attr("has-primary") == Some("true"))
        .filter_map(|z| Some(Zone::new(z.attr("service")?, z.attr("name")?)))
        .collect())
}

/// TXT records from a record listing
///
/// `rr` entries without an id, name, type or `txt/string` are skipped.
pub fn parse_records(body: &[u8]) -> XmlResult<Vec<TxtRecord>> {
    let root = parse(body)?;

    Ok(root
        .descendants("rr")
        .into_iter()
        .filter_map(|rr| {
            Some(TxtRecord {
                id: rr.attr("id")?.to_string(),
                name: rr.child("name")?.text().to_string(),
                record_type: rr.child("type")?.text().to_string(),
                value: rr.child("txt")?.child("string")?.text().to_string(),
            })
        })
        .collect())
}

/// Id of the first `rr` in a write response
pub fn parse_created_id(body: &[u8]) -> XmlResult<String> {
    let root = parse(body)?;

    root.descendants("rr")
        .into_iter()
        .find_map(|rr| rr.attr("id"))
        .map(str::to_string)
        .ok_or_else(|| "response has no record id".to_string())
}

/// Request body creating one TXT record
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <request><rr-list><rr>
///   <name>_acme-challenge.example.com.</name><type>TXT</type>
///   <txt><string>token</string></txt>
/// </rr></rr-list></request>
/// ```
pub fn txt_record_request(name: &str, value: &str) -> XmlResult<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    for tag in ["request", "rr-list", "rr"] {
        write(&mut writer, Event::Start(BytesStart::new(tag)))?;
    }
    write_text_element(&mut writer, "name", name)?;
    write_text_element(&mut writer, "type", "TXT")?;
    write(&mut writer, Event::Start(BytesStart::new("txt")))?;
    write_text_element(&mut writer, "string", value)?;
    write(&mut writer, Event::End(BytesEnd::new("txt")))?;
    for tag in ["rr", "rr-list", "request"] {
        write(&mut writer, Event::End(BytesEnd::new(tag)))?;
    }

    Ok(writer.into_inner().into_inner())
}

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> XmlResult<()> {
    write(writer, Event::Start(BytesStart::new(tag)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(tag)))
}

fn write(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> XmlResult<()> {
    writer
        .write_event(event)
        .map_err(|e| format!("failed to write XML: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_listing_keeps_primary_zones_in_order() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<response>
  <status>success</status>
  <data>
    <zone admin="123/NIC-D" enable="true" has-changes="false" has-primary="true" id="1" idn-name="example.com" name="example.com" payer="123/NIC-D" service="EXAMPLE-SVC"/>
    <zone has-primary="false" name="secondary.org" service="SEC-SVC"/>
    <zone has-primary="true" name="other.org" service="OTHER-SVC"></zone>
  </data>
</response>"#;

        let zones = parse_zones(body).unwrap();
        assert_eq!(
            zones,
            vec![
                Zone::new("EXAMPLE-SVC", "example.com"),
                Zone::new("OTHER-SVC", "other.org"),
            ]
        );
    }

    #[test]
    fn record_listing_skips_malformed_entries() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<response><status>success</status><data><zone service="EXAMPLE-SVC" name="example.com">
  <rr id="1"><name>@</name><type>A</type><a>192.0.2.1</a></rr>
  <rr id="2"><name>_acme-challenge</name><type>TXT</type><txt><string>abc123</string></txt></rr>
  <rr id="3"><type>TXT</type><txt><string>no-name</string></txt></rr>
  <rr id="4"><name>_acme-challenge.example.com.</name><type>TXT</type><txt><string>xyz&amp;789</string></txt></rr>
</zone></data></response>"#;

        let records = parse_records(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "2");
        assert_eq!(records[0].name, "_acme-challenge");
        assert_eq!(records[0].value, "abc123");
        assert_eq!(records[1].name, "_acme-challenge.example.com.");
        assert_eq!(records[1].value, "xyz&789");
    }

    #[test]
    fn created_id_is_read_from_rr() {
        let body = br#"<response><status>success</status><data><zone name="example.com" service="EXAMPLE-SVC"><rr id="210074"><name>_acme-challenge.example.com.</name><type>TXT</type><txt><string>abc123</string></txt></rr></zone></data></response>"#;
        assert_eq!(parse_created_id(body).unwrap(), "210074");

        let body = br#"<response><status>success</status><data/></response>"#;
        assert!(parse_created_id(body).is_err());
    }

    #[test]
    fn request_nests_rr_list() {
        let body = txt_record_request("_acme-challenge.example.com.", "a<b").unwrap();
        let text = String::from_utf8(body.clone()).unwrap();

        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(text.contains(
            "<request><rr-list><rr><name>_acme-challenge.example.com.</name><type>TXT</type>"
        ));
        assert!(text.contains("<txt><string>a&lt;b</string></txt>"));

        let root = parse(&body).unwrap();
        assert_eq!(root.name(), "request");
        let rr = root.child("rr-list").and_then(|l| l.child("rr")).unwrap();
        assert_eq!(rr.child("txt").and_then(|t| t.child("string")).unwrap().text(), "a<b");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse(b"not xml at all").is_err());
        assert!(parse_zones(b"<response><data>").is_err());
    }
}
