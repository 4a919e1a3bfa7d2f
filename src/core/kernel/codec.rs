use crate::core::errors::EsbError;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

/// Encoder trait for turning a field mapping into a request body
///
/// Implementations are pure: the same fields always produce the same body.
/// Field order is whatever order the mapping yields; nothing is sorted here.
pub trait BodyEncoder: Send + Sync {
    /// Encode `fields` under the encoder's root, prefixed by `header`
    ///
    /// # Arguments
    /// * `fields` - A JSON object (or `null` for an empty body)
    /// * `header` - Text written verbatim before the encoded payload
    fn encode(&self, fields: &Value, header: &str) -> Result<String, EsbError>;
}

/// XML body encoder
///
/// Objects become nested elements, list entries become `<item id="N">`,
/// numbers and numeric strings are written bare and every other scalar is
/// wrapped in CDATA.
#[derive(Debug, Clone)]
pub struct XmlEncoder {
    root: String,
    item: String,
}

impl Default for XmlEncoder {
    fn default() -> Self {
        Self {
            root: "request".to_string(),
            item: "item".to_string(),
        }
    }
}

impl XmlEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root element name
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    fn write_fields(&self, writer: &mut Writer<Vec<u8>>, value: &Value) -> Result<(), EsbError> {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if is_numeric(key) {
                        self.write_element(writer, &self.item, Some(key.as_str()), child)?;
                    } else {
                        self.write_element(writer, key, None, child)?;
                    }
                }
                Ok(())
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    let id = index.to_string();
                    self.write_element(writer, &self.item, Some(id.as_str()), child)?;
                }
                Ok(())
            }
            scalar => write_scalar(writer, scalar),
        }
    }

    fn write_element(
        &self,
        writer: &mut Writer<Vec<u8>>,
        name: &str,
        id: Option<&str>,
        value: &Value,
    ) -> Result<(), EsbError> {
        if !is_valid_name(name) {
            return Err(EsbError::SerializationError(format!(
                "Invalid XML element name: {:?}",
                name
            )));
        }

        let mut start = BytesStart::new(name);
        if let Some(id) = id {
            start.push_attribute(("id", id));
        }

        write_event(writer, Event::Start(start))?;
        self.write_fields(writer, value)?;
        write_event(writer, Event::End(BytesEnd::new(name)))
    }
}

impl BodyEncoder for XmlEncoder {
    fn encode(&self, fields: &Value, header: &str) -> Result<String, EsbError> {
        let mut writer = Writer::new(Vec::new());
        write_event(&mut writer, Event::Start(BytesStart::new(self.root.as_str())))?;
        match fields {
            Value::Object(_) => self.write_fields(&mut writer, fields)?,
            Value::Null => {}
            _ => {
                return Err(EsbError::SerializationError(
                    "Request fields must be an object".to_string(),
                ))
            }
        }
        write_event(&mut writer, Event::End(BytesEnd::new(self.root.as_str())))?;

        let xml = String::from_utf8(writer.into_inner())
            .map_err(|e| EsbError::SerializationError(format!("Invalid UTF-8 in body: {}", e)))?;

        Ok(format!("{}{}", header, xml))
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), EsbError> {
    writer
        .write_event(event)
        .map_err(|e| EsbError::SerializationError(format!("Failed to write XML: {}", e)))
}

fn write_scalar(writer: &mut Writer<Vec<u8>>, value: &Value) -> Result<(), EsbError> {
    match value {
        Value::Number(n) => write_event(writer, Event::Text(BytesText::new(&n.to_string()))),
        Value::String(s) if is_numeric(s) => write_event(writer, Event::Text(BytesText::new(s))),
        Value::String(s) => write_cdata(writer, s),
        Value::Bool(true) => write_cdata(writer, "1"),
        _ => write_cdata(writer, ""),
    }
}

/// Write `text` as CDATA, splitting around any `]]>` it contains
fn write_cdata(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), EsbError> {
    let chunks: Vec<&str> = text.split("]]>").collect();
    let last = chunks.len() - 1;

    for (index, chunk) in chunks.iter().enumerate() {
        let mut section = String::with_capacity(chunk.len() + 3);
        if index > 0 {
            section.push('>');
        }
        section.push_str(chunk);
        if index < last {
            section.push_str("]]");
        }
        write_event(writer, Event::CData(BytesCData::new(section)))?;
    }
    Ok(())
}

/// Decimal number check: optional sign, digits with an optional fraction,
/// optional exponent. Surrounding whitespace is allowed.
fn is_numeric(s: &str) -> bool {
    let trimmed = s.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(i) => (&unsigned[..i], Some(&unsigned[i + 1..])),
        None => (unsigned, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    if (int.is_empty() && frac.is_empty()) || !digits(int) || !digits(frac) {
        return false;
    }

    exponent.map_or(true, |e| {
        let e = e.strip_prefix(['+', '-']).unwrap_or(e);
        !e.is_empty() && digits(e)
    })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HEADER: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

    #[test]
    fn test_empty_fields_encode_to_empty_root() {
        let encoder = XmlEncoder::new();
        assert_eq!(
            encoder.encode(&json!({}), "").unwrap(),
            "<request></request>"
        );
        assert_eq!(
            encoder.encode(&Value::Null, HEADER).unwrap(),
            format!("{}<request></request>", HEADER)
        );
    }

    #[test]
    fn test_scalars() {
        let fields = json!({
            "orderCode": "SO-001",
            "quantity": 3,
            "weight": "1.25",
            "express": true,
            "remark": null,
        });

        let xml = XmlEncoder::new().encode(&fields, "").unwrap();
        assert_eq!(
            xml,
            "<request>\
             <orderCode><![CDATA[SO-001]]></orderCode>\
             <quantity>3</quantity>\
             <weight>1.25</weight>\
             <express><![CDATA[1]]></express>\
             <remark><![CDATA[]]></remark>\
             </request>"
        );
    }

    #[test]
    fn test_null_payload_has_no_content() {
        let xml = XmlEncoder::new().encode(&Value::Null, "").unwrap();
        assert_eq!(xml, "<request></request>");
        assert!(!xml.contains("CDATA"));
    }

    #[test]
    fn test_numeric_keys_become_items() {
        let fields = json!({"lines": {"0": "a", "-1": "b", "1.5": 7}});
        let xml = XmlEncoder::new().encode(&fields, "").unwrap();
        assert_eq!(
            xml,
            "<request><lines>\
             <item id=\"0\"><![CDATA[a]]></item>\
             <item id=\"-1\"><![CDATA[b]]></item>\
             <item id=\"1.5\">7</item>\
             </lines></request>"
        );
    }

    #[test]
    fn test_keeps_insertion_order() {
        let fields = json!({"zeta": "z", "alpha": "a"});
        let xml = XmlEncoder::new().encode(&fields, "").unwrap();
        assert!(xml.find("<zeta>").unwrap() < xml.find("<alpha>").unwrap());
    }

    #[test]
    fn test_nested_objects_and_lists() {
        let fields = json!({
            "deliveryOrder": {"warehouseCode": "WH1"},
            "orderLines": [{"itemCode": "A"}, {"itemCode": "B"}],
        });

        let xml = XmlEncoder::new().encode(&fields, "").unwrap();
        assert_eq!(
            xml,
            "<request>\
             <deliveryOrder><warehouseCode><![CDATA[WH1]]></warehouseCode></deliveryOrder>\
             <orderLines>\
             <item id=\"0\"><itemCode><![CDATA[A]]></itemCode></item>\
             <item id=\"1\"><itemCode><![CDATA[B]]></itemCode></item>\
             </orderLines>\
             </request>"
        );
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let xml = XmlEncoder::new()
            .encode(&json!({"note": "a]]>b"}), "")
            .unwrap();
        assert_eq!(
            xml,
            "<request><note><![CDATA[a]]]]><![CDATA[>b]]></note></request>"
        );
    }

    #[test]
    fn test_rejects_non_object_and_bad_names() {
        let encoder = XmlEncoder::new();
        assert!(matches!(
            encoder.encode(&json!(["a"]), ""),
            Err(EsbError::SerializationError(_))
        ));
        assert!(matches!(
            encoder.encode(&json!({"bad name": 1}), ""),
            Err(EsbError::SerializationError(_))
        ));
        assert!(matches!(
            encoder.encode(&json!({"": 1}), ""),
            Err(EsbError::SerializationError(_))
        ));
    }

    #[test]
    fn test_custom_root() {
        let xml = XmlEncoder::new()
            .with_root("response")
            .encode(&json!({"flag": "success"}), "")
            .unwrap();
        assert_eq!(xml, "<response><flag><![CDATA[success]]></flag></response>");
    }

    #[test]
    fn test_numeric_detection() {
        for s in ["0", "-12", "+3.5", "1.", ".5", "1e10", "2.5E-3", " 42 "] {
            assert!(is_numeric(s), "{} should be numeric", s);
        }
        for s in ["", ".", "abc", "1a", "0x1A", "1e", "inf", "NaN", "1.2.3"] {
            assert!(!is_numeric(s), "{} should not be numeric", s);
        }
    }
}
