use std::mem;

use quick_xml::{
    events::{attributes::AttrError, BytesStart, Event},
    Reader,
};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] AttrError),

    #[error("Unclosed tag <{0}> at end of document")]
    Unclosed(String),

    #[error("Unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    #[error("Document has no root element")]
    NoRoot,

    #[error("Document has more than one root element")]
    MultipleRoots,

    #[error("Text data outside of root element")]
    TextOutsideRoot,

    #[error("Elements nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Options for [`XmlToValue`].
///
/// Defaults match what XML body parsers in the xml2js family are usually configured with:
/// every child is collected into an array, tag names are lowercased and text is trimmed
/// and whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Always place child elements in arrays, even when they occur once.
    pub explicit_array: bool,

    /// Wrap the result in an object keyed by the root element's name.
    pub explicit_root: bool,

    /// Trim leading and trailing whitespace of text content.
    pub trim: bool,

    /// Collapse runs of whitespace in text content into single spaces, then trim.
    pub normalize: bool,

    /// Lowercase all element names.
    pub normalize_tags: bool,

    /// Drop attributes entirely.
    pub ignore_attrs: bool,

    /// Key attributes are stored under.
    pub attr_key: String,

    /// Key text content is stored under when an element also has attributes or children.
    pub char_key: String,

    /// Maximum element nesting depth, including the root.
    pub max_depth: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            explicit_array: true,
            explicit_root: true,
            trim: true,
            normalize: true,
            normalize_tags: true,
            ignore_attrs: false,
            attr_key: "$".to_owned(),
            char_key: "_".to_owned(),
            max_depth: 128,
        }
    }
}

/// Default [`XmlParser`](super::XmlParser), converting documents with `quick-xml`.
#[derive(Debug, Clone, Default)]
pub struct XmlToValue {
    options: ConvertOptions,
}

struct Node {
    name: String,
    obj: Map<String, Value>,
    text: String,
    cdata: bool,
}

impl XmlToValue {
    #[must_use]
    pub fn new(options: ConvertOptions) -> Self {
        XmlToValue { options }
    }

    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a complete document.
    pub fn convert(&self, text: &str) -> Result<Value, XmlError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Node> = Vec::new();
        let mut root: Option<Value> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if root.is_some() {
                        return Err(XmlError::MultipleRoots);
                    }

                    self.check_depth(&stack)?;
                    stack.push(self.open(&e)?);
                }
                Event::Empty(e) => {
                    if root.is_some() {
                        return Err(XmlError::MultipleRoots);
                    }

                    self.check_depth(&stack)?;
                    let node = self.open(&e)?;
                    self.close(node, &mut stack, &mut root);
                }
                Event::End(e) => match stack.pop() {
                    Some(node) => self.close(node, &mut stack, &mut root),
                    None => {
                        return Err(XmlError::UnexpectedEnd(String::from_utf8_lossy(e.name().as_ref()).into_owned()));
                    }
                },
                Event::Text(e) => {
                    let text = e.unescape()?;

                    match stack.last_mut() {
                        Some(node) => node.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => return Err(XmlError::TextOutsideRoot),
                    }
                }
                Event::CData(e) => {
                    let inner = e.into_inner();

                    match stack.last_mut() {
                        Some(node) => {
                            node.text.push_str(&String::from_utf8_lossy(&inner));
                            node.cdata = true;
                        }
                        None => return Err(XmlError::TextOutsideRoot),
                    }
                }
                Event::Eof => break,

                // comments, declarations, processing instructions and doctypes carry no data
                _ => {}
            }
        }

        if let Some(node) = stack.pop() {
            return Err(XmlError::Unclosed(node.name));
        }

        root.ok_or(XmlError::NoRoot)
    }

    fn check_depth(&self, stack: &[Node]) -> Result<(), XmlError> {
        if stack.len() >= self.options.max_depth {
            return Err(XmlError::TooDeep(self.options.max_depth));
        }

        Ok(())
    }

    fn open(&self, e: &BytesStart<'_>) -> Result<Node, XmlError> {
        let mut name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        if self.options.normalize_tags {
            name = name.to_lowercase();
        }

        let mut obj = Map::new();

        if !self.options.ignore_attrs {
            let mut attrs = Map::new();

            for attr in e.attributes() {
                let attr = attr?;
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr.unescape_value()?.into_owned();

                attrs.insert(key, Value::String(value));
            }

            if !attrs.is_empty() {
                obj.insert(self.options.attr_key.clone(), Value::Object(attrs));
            }
        }

        Ok(Node {
            name,
            obj,
            text: String::new(),
            cdata: false,
        })
    }

    fn close(&self, node: Node, stack: &mut [Node], root: &mut Option<Value>) {
        let Node {
            name,
            mut obj,
            mut text,
            cdata,
        } = node;

        let value = if text.trim().is_empty() && !cdata {
            if !obj.is_empty() {
                Value::Object(obj)
            } else if self.options.trim || self.options.normalize {
                Value::String(String::new())
            } else {
                Value::String(text)
            }
        } else {
            if self.options.trim {
                text = text.trim().to_owned();
            }

            if self.options.normalize {
                text = normalize_whitespace(&text);
            }

            if obj.is_empty() {
                Value::String(text)
            } else {
                obj.insert(self.options.char_key.clone(), Value::String(text));
                Value::Object(obj)
            }
        };

        match stack.last_mut() {
            Some(parent) => self.assign_or_push(&mut parent.obj, name, value),
            None if self.options.explicit_root => {
                let mut wrapper = Map::new();
                wrapper.insert(name, value);
                *root = Some(Value::Object(wrapper));
            }
            None => *root = Some(value),
        }
    }

    fn assign_or_push(&self, obj: &mut Map<String, Value>, key: String, value: Value) {
        match obj.get_mut(&key) {
            None if self.options.explicit_array => {
                obj.insert(key, Value::Array(vec![value]));
            }
            None => {
                obj.insert(key, value);
            }
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = mem::take(existing);
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
