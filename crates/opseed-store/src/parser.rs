//! Snapshot XML parser using quick-xml
//!
//! Streams the document once, flattening elements into [`DataTree`] leaves.
//! Namespaces and attributes are not interpreted; only element local names
//! and text content end up in the tree.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;
use crate::tree::DataTree;

/// An element still open while streaming.
struct Frame {
    name: String,
    path: String,
    text: String,
    has_children: bool,
    seen: HashMap<String, usize>,
}

impl Frame {
    fn new(name: String, path: String) -> Self {
        Self {
            name,
            path,
            text: String::new(),
            has_children: false,
            seen: HashMap::new(),
        }
    }
}

/// Parse snapshot content into a flattened tree.
pub fn parse_snapshot(xml: &str) -> Result<DataTree, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut tree = DataTree::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut top_seen: HashMap<String, usize> = HashMap::new();

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| ParseError::malformed(position, e.to_string()))?;
        match event {
            Event::Start(e) => {
                let frame = open_element(&e, &mut stack, &mut top_seen, position)?;
                stack.push(frame);
            }
            Event::Empty(e) => {
                let frame = open_element(&e, &mut stack, &mut top_seen, position)?;
                tree.insert(frame.path, "");
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    return Err(ParseError::malformed(position, "unexpected closing tag"));
                };
                close_element(frame, &mut tree, position)?;
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| ParseError::malformed(position, e.to_string()))?;
                push_text(&mut stack, &text, position)?;
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|e| ParseError::malformed(position, e.to_string()))?;
                push_text(&mut stack, text, position)?;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(frame) = stack.last() {
        return Err(ParseError::malformed(
            reader.buffer_position() as u64,
            format!("unexpected end of document, <{}> not closed", frame.name),
        ));
    }
    Ok(tree)
}

/// Read and parse one snapshot file.
pub fn parse_snapshot_file(path: &Path) -> Result<DataTree, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_snapshot(&content).map_err(|e| e.with_path(path))
}

/// Name the new element and register it with its parent.
fn open_element(
    e: &BytesStart<'_>,
    stack: &mut [Frame],
    top_seen: &mut HashMap<String, usize>,
    position: u64,
) -> Result<Frame, ParseError> {
    let name = std::str::from_utf8(e.local_name().as_ref())
        .map_err(|err| ParseError::malformed(position, format!("element name: {err}")))?
        .to_string();

    let (parent_path, seen) = match stack.last_mut() {
        Some(parent) => {
            parent.has_children = true;
            (parent.path.as_str(), &mut parent.seen)
        }
        None => ("", top_seen),
    };

    let count = seen.entry(name.clone()).or_insert(0);
    *count += 1;
    let path = if *count == 1 {
        format!("{parent_path}/{name}")
    } else {
        format!("{parent_path}/{name}[{count}]")
    };
    Ok(Frame::new(name, path))
}

fn close_element(frame: Frame, tree: &mut DataTree, position: u64) -> Result<(), ParseError> {
    if !frame.has_children {
        tree.insert(frame.path, frame.text);
    } else if !frame.text.is_empty() {
        return Err(ParseError::malformed(
            position,
            format!("mixed content in <{}>", frame.name),
        ));
    }
    Ok(())
}

fn push_text(stack: &mut [Frame], text: &str, position: u64) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(frame) => {
            frame.text.push_str(text);
            Ok(())
        }
        None => Err(ParseError::malformed(position, "text outside of any element")),
    }
}
