//! Layout analysis for PDF pages.
//!
//! Interprets a page's content stream (and the form XObjects it draws) and
//! groups what it shows into blocks, lines and spans:
//!
//! - each text object (`BT`..`ET`) becomes a text block, each image draw an
//!   image block;
//! - a new line starts whenever the baseline moves;
//! - a span is one show operation, so a font change always starts a span.
//!
//! Positions are tracked through the graphics state (`q`/`Q`/`cm`), the text
//! state (`Tf`, `TL`, `Tc`, `Tw`, `Tz`, `Ts`) and the text matrix.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::fonts::FontMetrics;
use super::objects::{
    get_dict, get_number, get_resolved, inherited_attribute, name_string, resolve, resolve_dict,
    stream_content,
};
use crate::error::{Error, Result};
use crate::model::TextSpan;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

/// Baselines closer than this (user-space units) belong to one line.
const BASELINE_TOLERANCE: f32 = 0.5;

/// A glyph run with its bounding box in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedSpan {
    /// Decoded text, untrimmed
    pub text: String,
    /// Left edge of the bounding box
    pub x: f32,
    /// Top edge of the bounding box
    pub top: f32,
    /// Baseline of the run's origin
    pub baseline: f32,
    /// Width of the bounding box
    pub width: f32,
}

/// A text line: spans sharing one baseline, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Spans in stream order
    pub spans: Vec<PositionedSpan>,
    /// Baseline of the first span
    pub baseline: f32,
}

impl TextLine {
    fn new(span: PositionedSpan) -> Self {
        Self {
            baseline: span.baseline,
            spans: vec![span],
        }
    }
}

/// Type of layout block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// A text object
    Text,
    /// An image draw (XObject or inline)
    Image,
}

/// A layout block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Block type
    pub block_type: BlockType,
    /// Lines, empty for image blocks
    pub lines: Vec<TextLine>,
    /// Image XObject, for image blocks drawn through `Do` on an indirect object
    pub image: Option<ObjectId>,
}

impl TextBlock {
    fn text_block() -> Self {
        Self {
            block_type: BlockType::Text,
            lines: Vec::new(),
            image: None,
        }
    }

    fn image_block(image: Option<ObjectId>) -> Self {
        Self {
            block_type: BlockType::Image,
            lines: Vec::new(),
            image,
        }
    }

    fn push_span(&mut self, span: PositionedSpan) {
        match self.lines.last_mut() {
            Some(line) if (line.baseline - span.baseline).abs() <= BASELINE_TOLERANCE => {
                line.spans.push(span)
            }
            _ => self.lines.push(TextLine::new(span)),
        }
    }
}

/// Flatten blocks into page text spans.
///
/// Keeps block, line and span order; drops spans whose trimmed text is
/// empty. Coordinates are made relative to the MediaBox origin: `x` is the
/// run's left edge, `y` the top of the run measured from the page bottom.
pub fn spans_from_blocks(blocks: &[TextBlock], media_box: [f32; 4]) -> Vec<TextSpan> {
    blocks
        .iter()
        .filter(|b| b.block_type == BlockType::Text)
        .flat_map(|b| b.lines.iter())
        .flat_map(|l| l.spans.iter())
        .filter_map(|span| {
            let text = span.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TextSpan::new(
                text,
                f64::from(span.x) - f64::from(media_box[0]),
                f64::from(span.top) - f64::from(media_box[1]),
            ))
        })
        .collect()
}

/// Affine matrix `[a b c d e f]` in the row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let n: Vec<f32> = operands[..6].iter().filter_map(get_number).collect();
        match n[..] {
            [a, b, c, d, e, f] => Some(Matrix { a, b, c, d, e, f }),
            _ => None,
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

}

/// Text state parameters, saved and restored with the graphics state.
#[derive(Debug, Clone)]
struct TextState<'a> {
    font: Option<Rc<FontMetrics<'a>>>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState<'_> {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState<'a> {
    ctm: Matrix,
    text: TextState<'a>,
}

/// Layout analyzer for extracting positioned text from PDF pages.
pub struct LayoutAnalyzer<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> LayoutAnalyzer<'a> {
    /// Create a new layout analyzer.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Extract layout blocks from a page, in content-stream order.
    pub fn extract_page_blocks(&self, page_id: ObjectId) -> Result<Vec<TextBlock>> {
        let content = self.get_page_content(page_id)?;
        let resources = inherited_attribute(self.doc, page_id, b"Resources")
            .and_then(|r| resolve_dict(self.doc, r));

        let mut interpreter = Interpreter::new(self.doc);
        interpreter.run(&content, resources, 0)?;
        Ok(interpreter.finish())
    }

    /// Get the page's content streams, decoded and concatenated.
    ///
    /// A page without `/Contents` is blank and yields no bytes.
    fn get_page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        match resolve(self.doc, contents) {
            Some(Object::Stream(s)) => Ok(stream_content(s)),
            Some(Object::Array(arr)) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Some(Object::Stream(s)) = resolve(self.doc, obj) {
                        content.extend_from_slice(&stream_content(s));
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            Some(Object::Null) | None => Ok(Vec::new()),
            Some(_) => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }
}

/// Content-stream interpreter for one page.
struct Interpreter<'a> {
    doc: &'a LopdfDocument,
    state: GraphicsState<'a>,
    stack: Vec<GraphicsState<'a>>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_cache: HashMap<ObjectId, Rc<FontMetrics<'a>>>,
    /// Forms currently being executed, to break `Do` cycles
    active_forms: Vec<ObjectId>,
    current: Option<TextBlock>,
    blocks: Vec<TextBlock>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a LopdfDocument) -> Self {
        Self {
            doc,
            state: GraphicsState {
                ctm: Matrix::IDENTITY,
                text: TextState::default(),
            },
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_cache: HashMap::new(),
            active_forms: Vec::new(),
            current: None,
            blocks: Vec::new(),
        }
    }

    fn finish(mut self) -> Vec<TextBlock> {
        self.end_text_object();
        self.blocks
    }

    fn run(&mut self, content: &[u8], resources: Option<&'a Dictionary>, depth: usize) -> Result<()> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => self.stack.push(self.state.clone()),
                "Q" => {
                    if let Some(saved) = self.stack.pop() {
                        self.state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        self.state.ctm = m.multiply(&self.state.ctm);
                    }
                }
                "BT" => {
                    self.end_text_object();
                    self.current = Some(TextBlock::text_block());
                    self.text_matrix = Matrix::IDENTITY;
                    self.line_matrix = Matrix::IDENTITY;
                }
                "ET" => self.end_text_object(),
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(name) = &operands[0] {
                            self.state.text.font = Some(self.load_font(resources, name));
                        }
                        self.state.text.font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => set_number(operands, 0, &mut self.state.text.leading),
                "Tc" => set_number(operands, 0, &mut self.state.text.char_spacing),
                "Tw" => set_number(operands, 0, &mut self.state.text.word_spacing),
                "Ts" => set_number(operands, 0, &mut self.state.text.rise),
                "Tz" => {
                    if let Some(scale) = operands.first().and_then(get_number) {
                        self.state.text.h_scale = scale / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            self.state.text.leading = -ty;
                        }
                        self.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        self.text_matrix = m;
                        self.line_matrix = m;
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(s @ Object::String(..)) = operands.first() {
                        self.show(std::slice::from_ref(s));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show(items);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(s @ Object::String(..)) = operands.first() {
                        self.show(std::slice::from_ref(s));
                    }
                }
                "\"" => {
                    set_number(operands, 0, &mut self.state.text.word_spacing);
                    set_number(operands, 1, &mut self.state.text.char_spacing);
                    self.next_line();
                    if let Some(s @ Object::String(..)) = operands.get(2) {
                        self.show(std::slice::from_ref(s));
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.draw_xobject(resources, name, depth);
                    }
                }
                "BI" => self.blocks.push(TextBlock::image_block(None)),
                _ => {}
            }
        }

        Ok(())
    }

    fn end_text_object(&mut self) {
        if let Some(block) = self.current.take() {
            if !block.lines.is_empty() {
                self.blocks.push(block);
            }
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn load_font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Rc<FontMetrics<'a>> {
        let doc = self.doc;
        let entry = resources
            .and_then(|r| get_dict(doc, r, b"Font"))
            .and_then(|fonts| fonts.get(name).ok());

        let Some(entry) = entry else {
            log::debug!(
                "Font resource /{} not found, using default metrics",
                String::from_utf8_lossy(name)
            );
            return Rc::new(FontMetrics::default());
        };

        if let Object::Reference(id) = entry {
            if let Some(cached) = self.font_cache.get(id) {
                return Rc::clone(cached);
            }
            let metrics = Rc::new(
                resolve_dict(doc, entry)
                    .map(|d| FontMetrics::from_dict(doc, d))
                    .unwrap_or_default(),
            );
            self.font_cache.insert(*id, Rc::clone(&metrics));
            return metrics;
        }

        Rc::new(
            resolve_dict(doc, entry)
                .map(|d| FontMetrics::from_dict(doc, d))
                .unwrap_or_default(),
        )
    }

    /// Show a run of strings and positioning adjustments (`Tj`, `TJ`, `'`, `"`).
    fn show(&mut self, items: &[Object]) {
        if self.current.is_none() {
            return;
        }

        let text_state = &self.state.text;
        let font = text_state
            .font
            .clone()
            .unwrap_or_else(|| Rc::new(FontMetrics::default()));
        let size = text_state.font_size;

        // Numbers indicate kerning/spacing adjustments in 1/1000 text space units.
        // Large negative values (like -200 to -300) often indicate word spaces.
        let space_threshold = 200.0;

        let mut text = String::new();
        let mut advance = 0.0f32;
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    text.push_str(&font.decode(self.doc, bytes));
                    advance += font.advance(
                        bytes,
                        size,
                        text_state.char_spacing,
                        text_state.word_spacing,
                        text_state.h_scale,
                    );
                }
                Object::Integer(_) | Object::Real(_) => {
                    let n = get_number(item).unwrap_or(0.0);
                    advance -= n / 1000.0 * size * text_state.h_scale;

                    let adjustment = -n;
                    if adjustment > space_threshold
                        && !text.is_empty()
                        && !text.ends_with(' ')
                        && !text.ends_with('\u{00A0}')
                    {
                        if let Some(c) = text.chars().last() {
                            if !is_spaceless_script_char(c) {
                                text.push(' ');
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let rise = text_state.rise;
        let trm = self.text_matrix.multiply(&self.state.ctm);
        let top = rise + font.ascent * size;
        let bottom = rise + font.descent * size;
        let corners = [
            trm.apply(0.0, top),
            trm.apply(advance, top),
            trm.apply(0.0, bottom),
            trm.apply(advance, bottom),
        ];
        let left = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let right = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let upper = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);
        let (_, baseline) = trm.apply(0.0, rise);

        let span = PositionedSpan {
            text,
            x: left,
            top: upper,
            baseline,
            width: right - left,
        };

        self.text_matrix = Matrix::translation(advance, 0.0).multiply(&self.text_matrix);
        if let Some(block) = self.current.as_mut() {
            block.push_span(span);
        }
    }

    fn draw_xobject(&mut self, resources: Option<&'a Dictionary>, name: &[u8], depth: usize) {
        let doc = self.doc;
        let Some(entry) = resources
            .and_then(|r| get_dict(doc, r, b"XObject"))
            .and_then(|x| x.get(name).ok())
        else {
            return;
        };
        let id = match entry {
            Object::Reference(id) => Some(*id),
            _ => None,
        };
        let Some(Object::Stream(stream)) = resolve(doc, entry) else {
            return;
        };

        match get_resolved(doc, &stream.dict, b"Subtype")
            .and_then(name_string)
            .as_deref()
        {
            Some("Image") => {
                self.end_text_object();
                self.blocks.push(TextBlock::image_block(id));
            }
            Some("Form") => {
                if depth >= MAX_FORM_DEPTH {
                    log::debug!("Form XObject nesting too deep, skipping");
                    return;
                }
                if let Some(id) = id {
                    if self.active_forms.contains(&id) {
                        return;
                    }
                    self.active_forms.push(id);
                }

                let content = stream_content(stream);
                let form_resources = get_dict(doc, &stream.dict, b"Resources").or(resources);
                let form_matrix = get_resolved(doc, &stream.dict, b"Matrix")
                    .and_then(|m| match m {
                        Object::Array(items) => Matrix::from_operands(items),
                        _ => None,
                    })
                    .unwrap_or(Matrix::IDENTITY);

                let saved = self.state.clone();
                let saved_stack = self.stack.len();
                self.state.ctm = form_matrix.multiply(&self.state.ctm);
                if let Err(e) = self.run(&content, form_resources, depth + 1) {
                    log::debug!("Skipping undecodable form XObject: {}", e);
                }
                self.stack.truncate(saved_stack);
                self.state = saved;

                if id.is_some() {
                    self.active_forms.pop();
                }
            }
            _ => {}
        }
    }
}

fn set_number(operands: &[Object], index: usize, slot: &mut f32) {
    if let Some(value) = operands.get(index).and_then(get_number) {
        *slot = value;
    }
}

/// Check if a character belongs to a script written without word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs (Chinese characters, used in Chinese/Japanese)
    (0x4E00..=0x9FFF).contains(&code)
    // CJK Unified Ideographs Extension A
    || (0x3400..=0x4DBF).contains(&code)
    // CJK Unified Ideographs Extension B-F
    || (0x20000..=0x2A6DF).contains(&code)
    || (0x2A700..=0x2B73F).contains(&code)
    || (0x2B740..=0x2B81F).contains(&code)
    || (0x2B820..=0x2CEAF).contains(&code)
    || (0x2CEB0..=0x2EBEF).contains(&code)
    // Hiragana (Japanese)
    || (0x3040..=0x309F).contains(&code)
    // Katakana (Japanese)
    || (0x30A0..=0x30FF).contains(&code)
    // NOTE: Hangul (Korean) is NOT included - Korean uses word spaces like English
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
