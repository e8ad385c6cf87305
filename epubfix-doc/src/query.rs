//! Read-only scans over XML documents.
//!
//! Package documents must not go through the permissive HTML parser (it
//! treats `meta` as a void element and reshuffles the tree), so the few
//! queries repairs need are event scans. All of them are tolerant: a scan
//! error ends the scan and whatever was found so far is returned.

use crate::markup::{ElementView, view_of};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

fn local_name_eq(qname: &[u8], tag: &str) -> bool {
    let local = match qname.iter().rposition(|b| *b == b':') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    };
    local.eq_ignore_ascii_case(tag.as_bytes())
}

fn attr_of(e: &BytesStart<'_>, attr: &str) -> Option<String> {
    for a in e.attributes().with_checks(false).flatten() {
        if a.key.as_ref() == attr.as_bytes() {
            let value = a
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned());
            return Some(value);
        }
    }
    None
}

/// Value of `attr` on the first `tag` element that carries it.
pub fn xml_first_attr(content: &str, tag: &str, attr: &str) -> Option<String> {
    let mut reader = Reader::from_str(content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if local_name_eq(e.name().as_ref(), tag) => {
                if let Some(value) = attr_of(&e, attr) {
                    return Some(value);
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Values of `attr` across every `tag` element, in document order.
pub fn xml_attr_values(content: &str, tag: &str, attr: &str) -> Vec<String> {
    let mut reader = Reader::from_str(content);
    let mut out = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if local_name_eq(e.name().as_ref(), tag) => {
                if let Some(value) = attr_of(&e, attr) {
                    out.push(value);
                }
            }
            Ok(Event::Eof) | Err(_) => return out,
            Ok(_) => {}
        }
    }
}

/// Concatenated text of the first `tag` element (subtree included),
/// whitespace-trimmed. `None` when the element is absent or empty.
pub fn xml_element_text(content: &str, tag: &str) -> Option<String> {
    let mut reader = Reader::from_str(content);
    let mut capturing: Option<(Vec<u8>, usize, String)> = None;
    loop {
        let ev = match reader.read_event() {
            Ok(Event::Eof) | Err(_) => return None,
            Ok(ev) => ev,
        };
        match ev {
            Event::Start(e) => {
                if let Some((name, depth, _)) = capturing.as_mut() {
                    if e.name().as_ref() == name.as_slice() {
                        *depth += 1;
                    }
                } else if local_name_eq(e.name().as_ref(), tag) {
                    capturing = Some((e.name().as_ref().to_vec(), 1, String::new()));
                }
            }
            Event::Empty(e) => {
                if capturing.is_none() && local_name_eq(e.name().as_ref(), tag) {
                    return None;
                }
            }
            Event::End(e) => {
                if let Some((name, depth, text)) = capturing.as_mut()
                    && e.name().as_ref() == name.as_slice()
                {
                    *depth -= 1;
                    if *depth == 0 {
                        let text = text.trim().to_string();
                        return (!text.is_empty()).then_some(text);
                    }
                }
            }
            Event::Text(t) => {
                if let Some((_, _, text)) = capturing.as_mut() {
                    match t.unescape() {
                        Ok(chunk) => text.push_str(&chunk),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Event::CData(c) => {
                if let Some((_, _, text)) = capturing.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(r) => {
                if let Some((_, _, text)) = capturing.as_mut() {
                    push_reference(text, &r);
                }
            }
            _ => {}
        }
    }
}

/// Resolve a general reference into its character, best effort.
fn push_reference(text: &mut String, raw: &[u8]) {
    if let Some(digits) = raw.strip_prefix(b"#") {
        let (digits, radix) = match digits.strip_prefix(b"x").or_else(|| digits.strip_prefix(b"X"))
        {
            Some(hex) => (hex, 16),
            None => (digits, 10),
        };
        if let Ok(code) = u32::from_str_radix(&String::from_utf8_lossy(digits), radix)
            && let Some(ch) = char::from_u32(code)
        {
            text.push(ch);
        }
        return;
    }
    match raw {
        b"amp" => text.push('&'),
        b"lt" => text.push('<'),
        b"gt" => text.push('>'),
        b"apos" => text.push('\''),
        b"quot" => text.push('"'),
        _ => {}
    }
}

/// Attribute snapshot and trimmed text of every `tag` element, document
/// order. Empty elements contribute an empty text.
pub fn xml_elements_with_text(content: &str, tag: &str) -> Vec<(ElementView, String)> {
    let mut reader = Reader::from_str(content);
    let mut out = Vec::new();
    let mut capturing: Option<(Vec<u8>, usize, ElementView, String)> = None;
    loop {
        let ev = match reader.read_event() {
            Ok(Event::Eof) | Err(_) => return out,
            Ok(ev) => ev,
        };
        match ev {
            Event::Start(e) => {
                if let Some((name, depth, _, _)) = capturing.as_mut() {
                    if e.name().as_ref() == name.as_slice() {
                        *depth += 1;
                    }
                } else if local_name_eq(e.name().as_ref(), tag) {
                    capturing = Some((
                        e.name().as_ref().to_vec(),
                        1,
                        view_of(&e, false),
                        String::new(),
                    ));
                }
            }
            Event::Empty(e) => {
                if capturing.is_none() && local_name_eq(e.name().as_ref(), tag) {
                    out.push((view_of(&e, true), String::new()));
                }
            }
            Event::End(e) => {
                let closed = match capturing.as_mut() {
                    Some((name, depth, _, _)) if e.name().as_ref() == name.as_slice() => {
                        *depth -= 1;
                        *depth == 0
                    }
                    _ => false,
                };
                if closed && let Some((_, _, view, text)) = capturing.take() {
                    out.push((view, text.trim().to_string()));
                }
            }
            Event::Text(t) => {
                if let Some((_, _, _, text)) = capturing.as_mut() {
                    match t.unescape() {
                        Ok(chunk) => text.push_str(&chunk),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Event::CData(c) => {
                if let Some((_, _, _, text)) = capturing.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(r) => {
                if let Some((_, _, _, text)) = capturing.as_mut() {
                    push_reference(text, &r);
                }
            }
            _ => {}
        }
    }
}

/// True when at least one `tag` element exists.
pub fn xml_has_element(content: &str, tag: &str) -> bool {
    let mut reader = Reader::from_str(content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if local_name_eq(e.name().as_ref(), tag) => {
                return true;
            }
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
    }
}
