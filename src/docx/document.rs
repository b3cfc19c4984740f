use std::io::Cursor;
use std::ops::Range;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::core::error::DocumentResult;

/// Inclusive event-index range of one XML element (start tag through its
/// matching end tag; `start == end` for empty-element tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Run properties applied to text written into cells. The daily-report
/// templates expect Times New Roman for Latin text, SimSun for East Asian
/// text, at 10.5pt.
#[derive(Debug, Clone, Default)]
pub struct RunStyle {
    pub ascii_font: Option<String>,
    pub east_asia_font: Option<String>,
    pub size_half_points: Option<u32>,
}

impl RunStyle {
    pub fn table_cell() -> Self {
        RunStyle {
            ascii_font: Some("Times New Roman".to_string()),
            east_asia_font: Some("宋体".to_string()),
            size_half_points: Some(21),
        }
    }

    fn events(&self) -> Vec<Event<'static>> {
        if self.ascii_font.is_none()
            && self.east_asia_font.is_none()
            && self.size_half_points.is_none()
        {
            return Vec::new();
        }

        let mut events = vec![Event::Start(BytesStart::new("w:rPr"))];

        if self.ascii_font.is_some() || self.east_asia_font.is_some() {
            let mut fonts = BytesStart::new("w:rFonts");
            if let Some(font) = &self.ascii_font {
                fonts.push_attribute(("w:ascii", font.as_str()));
                fonts.push_attribute(("w:hAnsi", font.as_str()));
            }
            if let Some(font) = &self.east_asia_font {
                fonts.push_attribute(("w:eastAsia", font.as_str()));
            }
            events.push(Event::Empty(fonts.into_owned()));
        }

        if let Some(size) = self.size_half_points {
            let value = size.to_string();
            let mut sz = BytesStart::new("w:sz");
            sz.push_attribute(("w:val", value.as_str()));
            events.push(Event::Empty(sz.into_owned()));
            let mut sz_cs = BytesStart::new("w:szCs");
            sz_cs.push_attribute(("w:val", value.as_str()));
            events.push(Event::Empty(sz_cs.into_owned()));
        }

        events.push(Event::End(BytesEnd::new("w:rPr")));
        events
    }
}

/// Buffered event editor over `word/document.xml`. The whole part is parsed
/// into an owned event vector, edited in place, and serialized back; events
/// that are not touched round-trip byte-for-byte.
pub struct DocumentXml {
    events: Vec<Event<'static>>,
}

impl DocumentXml {
    pub fn parse(xml: &str) -> DocumentResult<Self> {
        let mut reader = Reader::from_str(xml);
        let mut events = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                event => events.push(event.into_owned()),
            }
        }

        Ok(DocumentXml { events })
    }

    pub fn to_xml(&self) -> DocumentResult<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        for event in &self.events {
            writer.write_event(event.clone())?;
        }
        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }

    /// Top-level tables in body order; tables nested inside cells are not
    /// reported, matching how the reports address tables by index.
    pub fn tables(&self) -> Vec<Span> {
        self.spans_within(0..self.events.len(), b"w:tbl", None)
    }

    pub fn table_rows(&self, table: Span) -> Vec<Span> {
        self.spans_within(table.start + 1..table.end, b"w:tr", Some(b"w:tbl"))
    }

    pub fn row_cells(&self, row: Span) -> Vec<Span> {
        self.spans_within(row.start + 1..row.end, b"w:tc", Some(b"w:tbl"))
    }

    /// Body paragraphs, excluding any inside tables.
    pub fn paragraphs(&self) -> Vec<Span> {
        self.spans_within(0..self.events.len(), b"w:p", Some(b"w:tbl"))
    }

    pub fn paragraphs_within(&self, span: Span) -> Vec<Span> {
        if span.start >= span.end {
            return Vec::new();
        }
        self.spans_within(span.start + 1..span.end, b"w:p", Some(b"w:tbl"))
    }

    /// Concatenated text of every `w:t` run inside the span.
    pub fn text_within(&self, span: Span) -> String {
        let mut out = String::new();
        let mut in_text = 0usize;

        for event in &self.events[span.start..=span.end] {
            match event {
                Event::Start(e) if e.name().as_ref() == b"w:t" => in_text += 1,
                Event::End(e) if e.name().as_ref() == b"w:t" => {
                    in_text = in_text.saturating_sub(1)
                }
                Event::Text(t) if in_text > 0 => {
                    if let Ok(text) = t.unescape() {
                        out.push_str(&text);
                    }
                }
                _ => {}
            }
        }

        out
    }

    /// Replaces everything inside a cell with a single styled paragraph,
    /// keeping `w:tcPr` so the cell geometry survives.
    pub fn replace_cell_content(&mut self, cell: Span, text: &str, style: &RunStyle) {
        if cell.start >= cell.end {
            return;
        }

        let mut keep_end = cell.start;
        let first = cell.start + 1;
        match self.events.get(first) {
            Some(Event::Start(e)) if e.name().as_ref() == b"w:tcPr" => {
                keep_end = self.matching_end(first, b"w:tcPr");
            }
            Some(Event::Empty(e)) if e.name().as_ref() == b"w:tcPr" => {
                keep_end = first;
            }
            _ => {}
        }

        let replacement = paragraph_events(text, Some(style));
        self.events.splice(keep_end + 1..cell.end, replacement);
    }

    /// Sets (or patches) the first-line indentation of a paragraph, in
    /// twentieths of a point.
    pub fn set_first_line_indent(&mut self, paragraph: Span, twips: u32) {
        if paragraph.start >= paragraph.end {
            return;
        }

        let first = paragraph.start + 1;
        match self.events.get(first) {
            Some(Event::Start(e)) if e.name().as_ref() == b"w:pPr" => {
                let ppr_end = self.matching_end(first, b"w:pPr");
                for i in first + 1..ppr_end {
                    let is_ind = match &self.events[i] {
                        Event::Start(e) | Event::Empty(e) => e.name().as_ref() == b"w:ind",
                        _ => false,
                    };
                    if is_ind {
                        self.patch_first_line_attr(i, twips);
                        return;
                    }
                }
                self.events.insert(first + 1, indent_event(twips));
            }
            Some(Event::Empty(e)) if e.name().as_ref() == b"w:pPr" => {
                self.events.splice(
                    first..=first,
                    vec![
                        Event::Start(BytesStart::new("w:pPr")),
                        indent_event(twips),
                        Event::End(BytesEnd::new("w:pPr")),
                    ],
                );
            }
            _ => {
                // No paragraph properties yet; w:pPr must be the first child.
                self.events.splice(
                    first..first,
                    vec![
                        Event::Start(BytesStart::new("w:pPr")),
                        indent_event(twips),
                        Event::End(BytesEnd::new("w:pPr")),
                    ],
                );
            }
        }
    }

    /// First-line indents every paragraph whose text, cleaned of `*` and
    /// whitespace, starts with one of the keywords. Covers body paragraphs
    /// and the cells of the first table, like the report layout expects.
    pub fn apply_smart_indent(&mut self, keywords: &[String], twips: u32) {
        let matches = |doc: &DocumentXml, span: Span| -> bool {
            let clean: String = doc
                .text_within(span)
                .chars()
                .filter(|c| *c != '*' && !c.is_whitespace())
                .collect();
            keywords.iter().any(|k| clean.starts_with(k.as_str()))
        };

        let mut targets: Vec<Span> = Vec::new();
        for paragraph in self.paragraphs() {
            if matches(self, paragraph) {
                targets.push(paragraph);
            }
        }
        if let Some(&table) = self.tables().first() {
            for row in self.table_rows(table) {
                for cell in self.row_cells(row) {
                    for paragraph in self.paragraphs_within(cell) {
                        if matches(self, paragraph) {
                            targets.push(paragraph);
                        }
                    }
                }
            }
        }

        // Mutations shift later indices; apply back to front.
        targets.sort_by_key(|span| span.start);
        for span in targets.into_iter().rev() {
            self.set_first_line_indent(span, twips);
        }
    }

    /// Appends a paragraph at the end of the body, before the section
    /// properties.
    pub fn append_paragraph(&mut self, text: &str) {
        let at = self.body_insert_index();
        let events = paragraph_events(text, None);
        self.events.splice(at..at, events);
    }

    fn body_insert_index(&self) -> usize {
        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut body_end = self.events.len();

        for (i, event) in self.events.iter().enumerate() {
            match event {
                Event::Start(e) => {
                    if e.name().as_ref() == b"w:sectPr"
                        && stack.last().map(|n| n.as_slice()) == Some(b"w:body")
                    {
                        return i;
                    }
                    stack.push(e.name().as_ref().to_vec());
                }
                Event::Empty(e) => {
                    if e.name().as_ref() == b"w:sectPr"
                        && stack.last().map(|n| n.as_slice()) == Some(b"w:body")
                    {
                        return i;
                    }
                }
                Event::End(e) => {
                    if e.name().as_ref() == b"w:body" && body_end == self.events.len() {
                        body_end = i;
                    }
                    stack.pop();
                }
                _ => {}
            }
        }

        body_end
    }

    /// Index of the end tag matching the start tag at `start`.
    fn matching_end(&self, start: usize, name: &[u8]) -> usize {
        let mut depth = 1usize;
        let mut i = start;
        while depth > 0 && i + 1 < self.events.len() {
            i += 1;
            match &self.events[i] {
                Event::Start(e) if e.name().as_ref() == name => depth += 1,
                Event::End(e) if e.name().as_ref() == name => depth -= 1,
                _ => {}
            }
        }
        i
    }

    fn patch_first_line_attr(&mut self, index: usize, twips: u32) {
        let old = match &self.events[index] {
            Event::Start(e) | Event::Empty(e) => e.clone().into_owned(),
            _ => return,
        };
        let was_empty = matches!(self.events[index], Event::Empty(_));

        let value = twips.to_string();
        let mut patched = BytesStart::new("w:ind");
        for attr in old.attributes().flatten() {
            if attr.key.as_ref() != b"w:firstLine" {
                patched.push_attribute(attr);
            }
        }
        patched.push_attribute(("w:firstLine", value.as_str()));
        let patched = patched.into_owned();

        self.events[index] = if was_empty {
            Event::Empty(patched)
        } else {
            Event::Start(patched)
        };
    }

    /// Elements named `name` directly reachable in the range, outermost only.
    /// A `barrier` element (e.g. a nested `w:tbl`) hides everything inside it.
    fn spans_within(&self, range: Range<usize>, name: &[u8], barrier: Option<&[u8]>) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut depth = 0usize;
        let mut barrier_depth = 0usize;
        let mut current = 0usize;

        for i in range {
            match &self.events[i] {
                Event::Start(e) => {
                    let tag = e.name();
                    let tag = tag.as_ref();
                    if let Some(b) = barrier {
                        if tag == b {
                            barrier_depth += 1;
                            continue;
                        }
                    }
                    if barrier_depth == 0 && tag == name {
                        if depth == 0 {
                            current = i;
                        }
                        depth += 1;
                    }
                }
                Event::End(e) => {
                    let tag = e.name();
                    let tag = tag.as_ref();
                    if let Some(b) = barrier {
                        if tag == b {
                            barrier_depth = barrier_depth.saturating_sub(1);
                            continue;
                        }
                    }
                    if barrier_depth == 0 && tag == name && depth > 0 {
                        depth -= 1;
                        if depth == 0 {
                            spans.push(Span { start: current, end: i });
                        }
                    }
                }
                Event::Empty(e) => {
                    if barrier_depth == 0 && depth == 0 && e.name().as_ref() == name {
                        spans.push(Span { start: i, end: i });
                    }
                }
                _ => {}
            }
        }

        spans
    }
}

/// One paragraph holding a single run; newlines become `w:br` breaks.
fn paragraph_events(text: &str, style: Option<&RunStyle>) -> Vec<Event<'static>> {
    let mut events = vec![
        Event::Start(BytesStart::new("w:p")),
        Event::Start(BytesStart::new("w:r")),
    ];

    if let Some(style) = style {
        events.extend(style.events());
    }

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            events.push(Event::Empty(BytesStart::new("w:br")));
        }
        let mut t = BytesStart::new("w:t");
        t.push_attribute(("xml:space", "preserve"));
        events.push(Event::Start(t.into_owned()));
        events.push(Event::Text(BytesText::new(line).into_owned()));
        events.push(Event::End(BytesEnd::new("w:t")));
    }

    events.push(Event::End(BytesEnd::new("w:r")));
    events.push(Event::End(BytesEnd::new("w:p")));
    events
}

fn indent_event(twips: u32) -> Event<'static> {
    let value = twips.to_string();
    let mut ind = BytesStart::new("w:ind");
    ind.push_attribute(("w:firstLine", value.as_str()));
    Event::Empty(ind.into_owned())
}
