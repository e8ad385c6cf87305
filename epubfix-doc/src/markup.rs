use crate::error::MarkupError;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// Escape text for inclusion in element content or an attribute value.
pub fn escape_text(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// True for media types that get the strict XML treatment (package
/// documents, XHTML content, NCX, SVG).
pub fn is_xml_media_type(media_type: &str) -> bool {
    let mt = media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase();
    mt.ends_with("+xml") || mt == "application/xml" || mt == "text/xml"
}

/// Re-parse a document to confirm it is still well-formed markup.
///
/// XML-family types must scan clean; other text types go through the
/// permissive HTML parser, which accepts anything.
pub fn check_well_formed(content: &str, media_type: &str) -> Result<(), MarkupError> {
    if is_xml_media_type(media_type) {
        let mut reader = Reader::from_str(content);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => return Ok(()),
                Ok(_) => {}
                Err(e) => {
                    return Err(MarkupError::Parse {
                        message: e.to_string(),
                    });
                }
            }
        }
    }
    let _ = scraper::Html::parse_document(content);
    Ok(())
}

/// Snapshot of one element as seen by an edit predicate.
#[derive(Debug, Clone)]
pub struct ElementView {
    /// Full tag name, original case, prefix included.
    pub name: String,
    /// Attribute (name, unescaped value) pairs in document order.
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl ElementView {
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// True when `name` holds `token` in its space-separated value list.
    pub fn attr_contains_token(&self, name: &str, token: &str) -> bool {
        self.attr(name)
            .map(|v| v.split_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
            .unwrap_or(false)
    }
}

/// An editable text document.
///
/// Mutations are event-level rewrites: the XML declaration, DOCTYPE,
/// comments, attribute spacing, and self-closing tags of untouched elements
/// all come back byte-identical. Only elements an operation actually changes
/// are re-serialized.
///
/// A parsed form is meant to live for one repair: acquire, mutate, hand the
/// source back to the store.
#[derive(Debug, Clone)]
pub struct MarkupDoc {
    source: String,
    strict: bool,
}

impl MarkupDoc {
    /// Parse `content`. XML-family media types must be well-formed; other
    /// text types are edited permissively (a scan failure turns every
    /// mutation into a no-op instead of an error).
    pub fn parse(content: &str, media_type: &str) -> Result<Self, MarkupError> {
        let strict = is_xml_media_type(media_type);
        if strict {
            check_well_formed(content, media_type)?;
        }
        Ok(Self {
            source: content.to_string(),
            strict,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    /// Visit every element (optionally restricted to `tag`, matched against
    /// the local name, case-insensitive). When `decide` returns attribute
    /// updates, they are set/overwritten on that element. Returns the number
    /// of elements changed.
    pub fn edit_elements<F>(&mut self, tag: Option<&str>, mut decide: F) -> Result<usize, MarkupError>
    where
        F: FnMut(&ElementView) -> Option<Vec<(String, String)>>,
    {
        let mut reader = self.reader();
        let mut writer = Writer::new(Vec::new());
        let mut changed = 0usize;

        loop {
            let ev = match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(ev) => ev,
                Err(e) => return self.scan_failed(e),
            };
            match ev {
                Event::Start(e) => {
                    let updates = self.element_updates(&e, tag, false, &mut decide);
                    match updates {
                        Some(updates) if !updates.is_empty() => {
                            write(&mut writer, Event::Start(with_updates(&e, &updates)))?;
                            changed += 1;
                        }
                        _ => write(&mut writer, Event::Start(e))?,
                    }
                }
                Event::Empty(e) => {
                    let updates = self.element_updates(&e, tag, true, &mut decide);
                    match updates {
                        Some(updates) if !updates.is_empty() => {
                            write(&mut writer, Event::Empty(with_updates(&e, &updates)))?;
                            changed += 1;
                        }
                        _ => write(&mut writer, Event::Empty(e))?,
                    }
                }
                other => write(&mut writer, other)?,
            }
        }

        self.commit(writer, changed)
    }

    /// Remove every attribute for which `drop_attr` returns true. Returns
    /// the number of attributes removed.
    pub fn strip_attrs<F>(&mut self, mut drop_attr: F) -> Result<usize, MarkupError>
    where
        F: FnMut(&ElementView, &str) -> bool,
    {
        let mut reader = self.reader();
        let mut writer = Writer::new(Vec::new());
        let mut changed = 0usize;

        loop {
            let ev = match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(ev) => ev,
                Err(e) => return self.scan_failed(e),
            };
            match ev {
                Event::Start(e) => {
                    let drops = attrs_to_drop(&e, false, &mut drop_attr);
                    if drops.is_empty() {
                        write(&mut writer, Event::Start(e))?;
                    } else {
                        changed += drops.len();
                        write(&mut writer, Event::Start(without_attrs(&e, &drops)))?;
                    }
                }
                Event::Empty(e) => {
                    let drops = attrs_to_drop(&e, true, &mut drop_attr);
                    if drops.is_empty() {
                        write(&mut writer, Event::Empty(e))?;
                    } else {
                        changed += drops.len();
                        write(&mut writer, Event::Empty(without_attrs(&e, &drops)))?;
                    }
                }
                other => write(&mut writer, other)?,
            }
        }

        self.commit(writer, changed)
    }

    /// Remove every `tag` element (subtree included) for which `remove`
    /// returns true. Returns the number of elements removed.
    pub fn remove_elements_where<F>(&mut self, tag: &str, mut remove: F) -> Result<usize, MarkupError>
    where
        F: FnMut(&ElementView) -> bool,
    {
        let mut reader = self.reader();
        let mut writer = Writer::new(Vec::new());
        let mut changed = 0usize;
        // (start tag bytes, open depth) while a subtree is being dropped
        let mut skipping: Option<(Vec<u8>, usize)> = None;

        loop {
            let ev = match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(ev) => ev,
                Err(e) => return self.scan_failed(e),
            };

            if let Some((name, depth)) = skipping.as_mut() {
                match &ev {
                    Event::Start(e) if e.name().as_ref() == name.as_slice() => *depth += 1,
                    Event::End(e) if e.name().as_ref() == name.as_slice() => {
                        *depth -= 1;
                        if *depth == 0 {
                            skipping = None;
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match ev {
                Event::Empty(e) if name_eq(e.name().as_ref(), tag) && remove(&view_of(&e, true)) => {
                    changed += 1;
                }
                Event::Start(e) if name_eq(e.name().as_ref(), tag) && remove(&view_of(&e, false)) => {
                    skipping = Some((e.name().as_ref().to_vec(), 1));
                    changed += 1;
                }
                other => write(&mut writer, other)?,
            }
        }

        self.commit(writer, changed)
    }

    /// Insert a raw markup fragment as the last child of the first `tag`
    /// element. Returns false when no such element exists.
    pub fn insert_into(&mut self, tag: &str, fragment: &str) -> Result<bool, MarkupError> {
        let mut reader = self.reader();
        let mut writer = Writer::new(Vec::new());
        let mut inserted = false;

        loop {
            let ev = match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(ev) => ev,
                Err(e) => return self.scan_failed(e).map(|n| n > 0),
            };
            match ev {
                Event::End(e) if !inserted && name_eq(e.name().as_ref(), tag) => {
                    writer.get_mut().extend_from_slice(fragment.as_bytes());
                    write(&mut writer, Event::End(e))?;
                    inserted = true;
                }
                Event::Empty(e) if !inserted && name_eq(e.name().as_ref(), tag) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    write(&mut writer, Event::Start(e))?;
                    writer.get_mut().extend_from_slice(fragment.as_bytes());
                    write(&mut writer, Event::End(BytesEnd::new(name)))?;
                    inserted = true;
                }
                other => write(&mut writer, other)?,
            }
        }

        self.commit(writer, usize::from(inserted))?;
        Ok(inserted)
    }

    /// Rename `h1`..`h6` elements so the n-th heading in document order gets
    /// level `levels[n]`. Headings beyond the slice keep their level.
    /// Returns the number of headings renamed.
    pub fn renumber_headings(&mut self, levels: &[u8]) -> Result<usize, MarkupError> {
        let mut reader = self.reader();
        let mut writer = Writer::new(Vec::new());
        let mut changed = 0usize;
        let mut idx = 0usize;
        // (original tag bytes, replacement name) for open renamed headings
        let mut open: Vec<(Vec<u8>, String)> = Vec::new();

        loop {
            let ev = match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(ev) => ev,
                Err(e) => return self.scan_failed(e),
            };
            match ev {
                Event::Start(e) if heading_level(e.name().as_ref()).is_some() => {
                    let level = heading_level(e.name().as_ref()).unwrap_or(1);
                    let target = levels.get(idx).copied();
                    idx += 1;
                    match target {
                        Some(t) if t != level => {
                            let new_name = format!("h{t}");
                            open.push((e.name().as_ref().to_vec(), new_name.clone()));
                            write(&mut writer, Event::Start(renamed(&e, new_name)))?;
                            changed += 1;
                        }
                        _ => write(&mut writer, Event::Start(e))?,
                    }
                }
                Event::Empty(e) if heading_level(e.name().as_ref()).is_some() => {
                    let level = heading_level(e.name().as_ref()).unwrap_or(1);
                    let target = levels.get(idx).copied();
                    idx += 1;
                    match target {
                        Some(t) if t != level => {
                            write(&mut writer, Event::Empty(renamed(&e, format!("h{t}"))))?;
                            changed += 1;
                        }
                        _ => write(&mut writer, Event::Empty(e))?,
                    }
                }
                Event::End(e) if heading_level(e.name().as_ref()).is_some() => {
                    let renamed_end = match open.last() {
                        Some((orig, _)) if orig.as_slice() == e.name().as_ref() => {
                            open.pop().map(|(_, new_name)| new_name)
                        }
                        _ => None,
                    };
                    match renamed_end {
                        Some(new_name) => write(&mut writer, Event::End(BytesEnd::new(new_name)))?,
                        None => write(&mut writer, Event::End(e))?,
                    }
                }
                other => write(&mut writer, other)?,
            }
        }

        self.commit(writer, changed)
    }

    fn reader(&self) -> Reader<&[u8]> {
        let mut reader = Reader::from_str(&self.source);
        if !self.strict {
            reader.config_mut().check_end_names = false;
        }
        reader
    }

    fn element_updates<F>(
        &self,
        e: &BytesStart<'_>,
        tag: Option<&str>,
        self_closing: bool,
        decide: &mut F,
    ) -> Option<Vec<(String, String)>>
    where
        F: FnMut(&ElementView) -> Option<Vec<(String, String)>>,
    {
        if let Some(tag) = tag
            && !name_eq(e.name().as_ref(), tag)
        {
            return None;
        }
        decide(&view_of(e, self_closing))
    }

    fn scan_failed(&self, err: quick_xml::Error) -> Result<usize, MarkupError> {
        if self.strict {
            Err(MarkupError::Parse {
                message: err.to_string(),
            })
        } else {
            // Tolerant path: the document stays as it was.
            Ok(0)
        }
    }

    fn commit(&mut self, writer: Writer<Vec<u8>>, changed: usize) -> Result<usize, MarkupError> {
        if changed > 0 {
            self.source = String::from_utf8(writer.into_inner()).map_err(|e| MarkupError::Write {
                message: e.to_string(),
            })?;
        }
        Ok(changed)
    }
}

fn write(writer: &mut Writer<Vec<u8>>, ev: Event<'_>) -> Result<(), MarkupError> {
    writer.write_event(ev).map_err(|e| MarkupError::Write {
        message: e.to_string(),
    })
}

fn local_name_of(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|b| *b == b':') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    }
}

fn name_eq(qname: &[u8], tag: &str) -> bool {
    local_name_of(qname).eq_ignore_ascii_case(tag.as_bytes())
}

fn heading_level(qname: &[u8]) -> Option<u8> {
    let local = local_name_of(qname);
    match local {
        [h, digit @ b'1'..=b'6'] if h.eq_ignore_ascii_case(&b'h') => Some(*digit - b'0'),
        _ => None,
    }
}

pub(crate) fn view_of(e: &BytesStart<'_>, self_closing: bool) -> ElementView {
    let mut attrs = Vec::new();
    for attr in e.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push((key, value));
    }
    ElementView {
        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attrs,
        self_closing,
    }
}

/// Rebuild an element with `updates` applied. Untouched attributes keep
/// their raw (still escaped) value bytes.
fn with_updates<'a>(e: &'a BytesStart<'_>, updates: &'a [(String, String)]) -> BytesStart<'a> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out: BytesStart<'a> = BytesStart::new(name);
    let mut written: Vec<&str> = Vec::new();

    for attr in e.attributes().with_checks(false).flatten() {
        match updates.iter().find(|(k, _)| k.as_bytes() == attr.key.as_ref()) {
            Some((k, v)) => {
                out.push_attribute((k.as_str(), v.as_str()));
                written.push(k.as_str());
            }
            None => out.push_attribute(attr),
        }
    }
    for (k, v) in updates {
        if !written.contains(&k.as_str()) {
            out.push_attribute((k.as_str(), v.as_str()));
        }
    }
    out
}

fn attrs_to_drop<F>(e: &BytesStart<'_>, self_closing: bool, drop_attr: &mut F) -> Vec<String>
where
    F: FnMut(&ElementView, &str) -> bool,
{
    let view = view_of(e, self_closing);
    view.attrs
        .iter()
        .filter(|(k, _)| drop_attr(&view, k))
        .map(|(k, _)| k.clone())
        .collect()
}

fn without_attrs<'a>(e: &'a BytesStart<'_>, drop: &[String]) -> BytesStart<'a> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out: BytesStart<'a> = BytesStart::new(name);
    for attr in e.attributes().with_checks(false).flatten() {
        if !drop.iter().any(|d| d.as_bytes() == attr.key.as_ref()) {
            out.push_attribute(attr);
        }
    }
    out
}

fn renamed<'a>(e: &'a BytesStart<'_>, new_name: String) -> BytesStart<'a> {
    let mut out: BytesStart<'a> = BytesStart::new(new_name);
    for attr in e.attributes().with_checks(false).flatten() {
        out.push_attribute(attr);
    }
    out
}
