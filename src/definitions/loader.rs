//! Include-graph walker turning schema documents into records

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, trace};

use super::{
    DefinitionError, DocumentSource, EnumSchema, FieldSchema, FieldType, MessageSchema, Result,
};

/// Highest id representable in the 24-bit wire field
const MAX_MESSAGE_ID: u32 = 0x00FF_FFFF;

/// Minimal element tree; schema documents are small enough to hold whole.
#[derive(Debug, Default)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Everything gathered from one include graph, in parse order.
#[derive(Debug, Default)]
pub(crate) struct Parsed {
    pub(crate) documents: Vec<String>,
    pub(crate) messages: Vec<MessageSchema>,
    pub(crate) enums: Vec<EnumSchema>,
    pub(crate) version: Option<u32>,
    pub(crate) dialect: Option<u32>,
}

/// Depth-first walker over a document and everything it includes.
pub(crate) struct Loader<'a> {
    source: &'a dyn DocumentSource,
    visited: HashSet<String>,
    parsed: Parsed,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(source: &'a dyn DocumentSource) -> Self {
        Self {
            source,
            visited: HashSet::new(),
            parsed: Parsed::default(),
        }
    }

    /// Parse `root` and its include graph.
    pub(crate) fn load(mut self, root: &str) -> Result<Parsed> {
        self.parse_document(root)?;
        Ok(self.parsed)
    }

    fn parse_document(&mut self, name: &str) -> Result<()> {
        if !self.visited.insert(name.to_owned()) {
            trace!(document = name, "already parsed, skipping include");
            return Ok(());
        }

        let text = self.source.read(name)?;
        let root = parse_tree(name, &text)?;
        if root.tag != "mavlink" {
            return Err(DefinitionError::UnexpectedRoot {
                document: name.to_owned(),
                found: root.tag,
            });
        }

        let (mut messages, mut enums) = (0_usize, 0_usize);
        self.parsed.documents.push(name.to_owned());

        for child in &root.children {
            match child.tag.as_str() {
                "version" => self.parsed.version = parse_number(name, "version", &child.text).ok(),
                "dialect" => self.parsed.dialect = parse_number(name, "dialect", &child.text).ok(),
                "include" => {
                    let target = child.text.trim();
                    if target.is_empty() {
                        return Err(DefinitionError::EmptyInclude {
                            document: name.to_owned(),
                        });
                    }
                    self.parse_document(target)?;
                }
                "enums" => {
                    for node in &child.children {
                        expect_tag(name, child, node, "enum")?;
                        let schema = parse_enum(name, node)?;
                        self.parsed.enums.push(schema);
                        enums += 1;
                    }
                }
                "messages" => {
                    for node in &child.children {
                        expect_tag(name, child, node, "message")?;
                        let schema = parse_message(name, node)?;
                        self.parsed.messages.push(schema);
                        messages += 1;
                    }
                }
                _ => return Err(unknown_tag(name, &root, child)),
            }
        }

        debug!(
            document = name,
            messages,
            enums,
            "parsed schema document"
        );
        Ok(())
    }
}

fn parse_enum(document: &str, node: &Element) -> Result<EnumSchema> {
    let mut schema = EnumSchema::new(required(document, node, "enum", "name")?);
    schema.bitmask = node.attribute("bitmask") == Some("true");

    for child in &node.children {
        match child.tag.as_str() {
            "description" | "wip" => {}
            "deprecated" | "superseded" => schema.deprecated = true,
            "entry" => {
                let label = required(document, child, "entry", "name")?;
                let raw = required(document, child, "entry", "value")?;
                let value = parse_number(document, "entry", raw)?;
                schema.entries.insert(value, label.to_owned());
            }
            _ => return Err(unknown_tag(document, node, child)),
        }
    }
    Ok(schema)
}

fn parse_message(document: &str, node: &Element) -> Result<MessageSchema> {
    let raw_id = required(document, node, "message", "id")?;
    let id = parse_number::<i64>(document, "message", raw_id)
        .ok()
        .and_then(|id| u32::try_from(id).ok())
        .filter(|id| *id <= MAX_MESSAGE_ID)
        .ok_or_else(|| DefinitionError::InvalidNumber {
            document: document.to_owned(),
            element: "message",
            value: raw_id.to_owned(),
        })?;
    let mut schema = MessageSchema::new(id, required(document, node, "message", "name")?);

    let mut extensions = false;
    for child in &node.children {
        match child.tag.as_str() {
            "description" | "wip" => {}
            "extensions" => extensions = true,
            "deprecated" | "superseded" => schema.deprecated = true,
            "field" => {
                let name = required(document, child, "field", "name")?;
                let token = required(document, child, "field", "type")?;
                let kind =
                    FieldType::parse(token).ok_or_else(|| DefinitionError::InvalidFieldType {
                        message: schema.name.clone(),
                        field: name.to_owned(),
                        token: token.to_owned(),
                    })?;
                schema.fields.push(FieldSchema {
                    name: name.to_owned(),
                    kind,
                    enum_name: child.attribute("enum").map(str::to_owned),
                    extension: extensions,
                    units: child.attribute("units").map(str::to_owned),
                });
            }
            _ => return Err(unknown_tag(document, node, child)),
        }
    }
    Ok(schema)
}

fn required<'e>(
    document: &str,
    node: &'e Element,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'e str> {
    node.attribute(attribute)
        .ok_or_else(|| DefinitionError::MissingAttribute {
            document: document.to_owned(),
            element,
            attribute,
        })
}

fn expect_tag(document: &str, parent: &Element, node: &Element, tag: &str) -> Result<()> {
    if node.tag == tag {
        Ok(())
    } else {
        Err(unknown_tag(document, parent, node))
    }
}

fn unknown_tag(document: &str, parent: &Element, node: &Element) -> DefinitionError {
    DefinitionError::UnknownTag {
        document: document.to_owned(),
        parent: parent.tag.clone(),
        tag: node.tag.clone(),
    }
}

/// Decimal, `0x` hex or `0b` binary, optionally negative.
fn parse_number<T>(document: &str, element: &'static str, raw: &str) -> Result<T>
where
    T: TryFrom<i64>,
{
    let text = raw.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let hex = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"));
    let bin = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"));
    let magnitude = if let Some(hex) = hex {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = bin {
        i64::from_str_radix(bin, 2).ok()
    } else {
        digits.parse::<i64>().ok()
    };

    magnitude
        .map(|value| if negative { -value } else { value })
        .and_then(|value| T::try_from(value).ok())
        .ok_or_else(|| DefinitionError::InvalidNumber {
            document: document.to_owned(),
            element,
            value: raw.to_owned(),
        })
}

fn parse_tree(document: &str, text: &str) -> Result<Element> {
    let xml_error = |source: quick_xml::Error| DefinitionError::Xml {
        document: document.to_owned(),
        source,
    };

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => stack.push(open(&start).map_err(xml_error)?),
            Event::Empty(start) => {
                let element = open(&start).map_err(xml_error)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = stack.pop() {
        return Err(DefinitionError::UnclosedTag {
            document: document.to_owned(),
            tag: unclosed.tag,
        });
    }

    root.ok_or_else(|| DefinitionError::UnexpectedRoot {
        document: document.to_owned(),
        found: String::new(),
    })
}

fn open(start: &BytesStart<'_>) -> std::result::Result<Element, quick_xml::Error> {
    let mut element = Element {
        tag: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Element::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::MemorySource;

    fn load(text: &str) -> Result<Parsed> {
        let source = MemorySource::new().with_document("root.xml", text);
        Loader::new(&source).load("root.xml")
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(parse_number::<i64>("d", "entry", "42").unwrap(), 42);
        assert_eq!(parse_number::<i64>("d", "entry", "0x10").unwrap(), 16);
        assert_eq!(parse_number::<i64>("d", "entry", "0b101").unwrap(), 5);
        assert_eq!(parse_number::<i64>("d", "entry", "-3").unwrap(), -3);
        assert!(parse_number::<i64>("d", "entry", "2**3").is_err());
        assert!(parse_number::<u32>("d", "version", "-1").is_err());
    }

    #[test]
    fn test_extension_marker_is_monotonic() {
        let parsed = load(
            r#"<mavlink><messages>
                <message id="7" name="SAMPLE">
                  <description>x</description>
                  <field type="uint8_t" name="a">first</field>
                  <extensions/>
                  <field type="uint16_t" name="b">second</field>
                  <field type="float" name="c" units="m">third</field>
                </message>
            </messages></mavlink>"#,
        )
        .unwrap();

        let message = &parsed.messages[0];
        let flags: Vec<bool> = message.fields.iter().map(|f| f.extension).collect();
        assert_eq!(flags, [false, true, true]);
        assert_eq!(message.fields[2].units.as_deref(), Some("m"));
    }

    #[test]
    fn test_unknown_tags_are_fatal() {
        let at_root = load("<mavlink><widgets/></mavlink>");
        assert!(matches!(
            at_root,
            Err(DefinitionError::UnknownTag { ref tag, ref parent, .. })
                if tag == "widgets" && parent == "mavlink"
        ));

        let in_enum = load(r#"<mavlink><enums><enum name="E"><bogus/></enum></enums></mavlink>"#);
        assert!(matches!(in_enum, Err(DefinitionError::UnknownTag { .. })));

        let in_messages = load("<mavlink><messages><enum name=\"E\"/></messages></mavlink>");
        assert!(matches!(in_messages, Err(DefinitionError::UnknownTag { .. })));
    }

    #[test]
    fn test_structural_failures() {
        assert!(matches!(
            load("<schema/>"),
            Err(DefinitionError::UnexpectedRoot { .. })
        ));
        assert!(matches!(
            load("<mavlink><include></include></mavlink>"),
            Err(DefinitionError::EmptyInclude { .. })
        ));
        assert!(matches!(
            load("<mavlink><include>missing.xml</include></mavlink>"),
            Err(DefinitionError::Io { ref document, .. }) if document == "missing.xml"
        ));
        assert!(matches!(
            load(r#"<mavlink><messages><message name="NO_ID"/></messages></mavlink>"#),
            Err(DefinitionError::MissingAttribute { attribute: "id", .. })
        ));
        assert!(matches!(
            load(
                r#"<mavlink><messages><message id="1" name="M">
                   <field type="bool" name="f"/></message></messages></mavlink>"#
            ),
            Err(DefinitionError::InvalidFieldType { .. })
        ));
        assert!(matches!(
            load("<mavlink><enums>"),
            Err(DefinitionError::UnclosedTag { .. } | DefinitionError::Xml { .. })
        ));
    }

    #[test]
    fn test_duplicate_entry_value_keeps_last_label() {
        let parsed = load(
            r#"<mavlink><enums><enum name="E">
                <entry value="1" name="FIRST"/>
                <entry value="1" name="SECOND"/>
            </enum></enums></mavlink>"#,
        )
        .unwrap();
        assert_eq!(parsed.enums[0].label(1), Some("SECOND"));
    }

    #[test]
    fn test_message_id_must_fit_24_bits() {
        let parsed =
            load(r#"<mavlink><messages><message id="16777216" name="BIG"/></messages></mavlink>"#);
        assert!(matches!(parsed, Err(DefinitionError::InvalidNumber { .. })));
    }
}
