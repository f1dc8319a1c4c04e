//! Font metrics needed to place glyph runs.

use std::collections::HashMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use super::objects::{
    get_array, get_dict, get_number, get_resolved, name_string, resolve, resolve_dict,
};
use crate::model::decode_pdf_string;

/// Ascent used when a font carries no usable descriptor (fraction of an em).
pub const DEFAULT_ASCENT: f32 = 0.8;

/// Descent used when a font carries no usable descriptor (fraction of an em).
pub const DEFAULT_DESCENT: f32 = -0.2;

/// Glyph width used when a code has no width entry (fraction of an em).
pub const DEFAULT_GLYPH_WIDTH: f32 = 0.5;

/// Metrics and decoding handle for one font resource.
#[derive(Debug, Clone)]
pub struct FontMetrics<'a> {
    /// Font dictionary, kept for text decoding
    dict: Option<&'a Dictionary>,
    /// Composite (Type0) font with two-byte codes
    pub two_byte: bool,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
    /// Glyph-space to text-space factor (1/1000 except for Type3)
    width_scale: f32,
    /// Ascent as a fraction of the font size
    pub ascent: f32,
    /// Descent as a fraction of the font size (negative)
    pub descent: f32,
}

impl Default for FontMetrics<'_> {
    fn default() -> Self {
        Self {
            dict: None,
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: DEFAULT_GLYPH_WIDTH * 1000.0,
            width_scale: 0.001,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
        }
    }
}

impl<'a> FontMetrics<'a> {
    /// Read metrics from a font dictionary.
    pub fn from_dict(doc: &'a LopdfDocument, dict: &'a Dictionary) -> Self {
        let mut metrics = FontMetrics {
            dict: Some(dict),
            ..Default::default()
        };

        let subtype = get_resolved(doc, dict, b"Subtype").and_then(name_string);
        let descriptor_owner = match subtype.as_deref() {
            Some("Type0") => {
                metrics.two_byte = true;
                let descendant = get_array(doc, dict, b"DescendantFonts")
                    .and_then(|fonts| fonts.first())
                    .and_then(|f| resolve_dict(doc, f));
                if let Some(cid_font) = descendant {
                    metrics.read_cid_widths(doc, cid_font);
                }
                descendant
            }
            Some("Type3") => {
                if let Some(scale) = get_array(doc, dict, b"FontMatrix")
                    .and_then(|m| m.first())
                    .and_then(|v| resolve(doc, v))
                    .and_then(get_number)
                    .filter(|scale| *scale > 0.0)
                {
                    metrics.width_scale = scale;
                    metrics.default_width = DEFAULT_GLYPH_WIDTH / scale;
                }
                metrics.read_simple_widths(doc, dict);
                Some(dict)
            }
            _ => {
                metrics.read_simple_widths(doc, dict);
                Some(dict)
            }
        };

        if let Some(descriptor) = descriptor_owner.and_then(|d| get_dict(doc, d, b"FontDescriptor")) {
            let ascent = get_resolved(doc, descriptor, b"Ascent").and_then(get_number);
            let descent = get_resolved(doc, descriptor, b"Descent").and_then(get_number);
            if let Some(ascent) = ascent.map(|a| a / 1000.0).filter(|a| *a > 0.0 && *a <= 1.5) {
                metrics.ascent = ascent;
            }
            if let Some(descent) = descent.map(|d| d / 1000.0).filter(|d| *d < 0.0 && *d >= -1.0) {
                metrics.descent = descent;
            }
        }

        metrics
    }

    fn read_simple_widths(&mut self, doc: &LopdfDocument, dict: &Dictionary) {
        self.first_char = get_resolved(doc, dict, b"FirstChar")
            .and_then(get_number)
            .map(|n| n.max(0.0) as u32)
            .unwrap_or(0);
        if let Some(widths) = get_array(doc, dict, b"Widths") {
            self.widths = widths
                .iter()
                .map(|w| resolve(doc, w).and_then(get_number).unwrap_or(0.0))
                .collect();
        }
    }

    /// Parse `/W` (`c [w1 w2 ...]` and `cfirst clast w` forms) and `/DW`.
    fn read_cid_widths(&mut self, doc: &LopdfDocument, cid_font: &Dictionary) {
        if let Some(dw) = get_resolved(doc, cid_font, b"DW").and_then(get_number) {
            self.default_width = dw;
        } else {
            self.default_width = 1000.0;
        }

        let Some(entries) = get_array(doc, cid_font, b"W") else {
            return;
        };
        let mut i = 0;
        while i < entries.len() {
            let Some(first) = resolve(doc, &entries[i]).and_then(get_number) else {
                break;
            };
            let first = first as u32;
            match entries.get(i + 1).and_then(|o| resolve(doc, o)) {
                Some(Object::Array(list)) => {
                    for (offset, w) in list.iter().enumerate() {
                        let Some(code) = u32::try_from(offset)
                            .ok()
                            .and_then(|offset| first.checked_add(offset))
                        else {
                            break;
                        };
                        if let Some(w) = resolve(doc, w).and_then(get_number) {
                            self.cid_widths.insert(code, w);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let last = get_number(last).map(|n| n as u32).unwrap_or(first);
                    let width = entries
                        .get(i + 2)
                        .and_then(|o| resolve(doc, o))
                        .and_then(get_number)
                        .unwrap_or(self.default_width);
                    for code in first..=last.min(first.saturating_add(0xFFFF)) {
                        self.cid_widths.insert(code, width);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    /// Glyph width in glyph-space units for a character code.
    pub fn glyph_width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|idx| self.widths.get(idx as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }

    /// Split a string operand into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    /// Horizontal advance of a string in unscaled text space.
    ///
    /// `char_spacing` and `word_spacing` are `Tc` and `Tw`; `h_scale` is
    /// `Tz / 100`. Word spacing applies to single-byte code 32 only.
    pub fn advance(
        &self,
        bytes: &[u8],
        font_size: f32,
        char_spacing: f32,
        word_spacing: f32,
        h_scale: f32,
    ) -> f32 {
        self.codes(bytes)
            .into_iter()
            .map(|code| {
                let mut tx = self.glyph_width(code) * self.width_scale * font_size + char_spacing;
                if !self.two_byte && code == 32 {
                    tx += word_spacing;
                }
                tx * h_scale
            })
            .sum()
    }

    /// Decode a string operand to Unicode using the font's encoding.
    pub fn decode(&self, doc: &LopdfDocument, bytes: &[u8]) -> String {
        if let Some(dict) = self.dict {
            if let Ok(encoding) = dict.get_font_encoding(doc) {
                if let Ok(text) = LopdfDocument::decode_text(&encoding, bytes) {
                    return text;
                }
            }
        }
        decode_pdf_string(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_standard_font_falls_back_to_defaults() {
        let doc = LopdfDocument::with_version("1.7");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        };
        let metrics = FontMetrics::from_dict(&doc, &dict);
        assert_eq!(metrics.ascent, DEFAULT_ASCENT);
        assert_eq!(metrics.glyph_width(65), 500.0);
        assert_eq!(metrics.advance(b"AB", 10.0, 0.0, 0.0, 1.0), 10.0);
    }

    #[test]
    fn test_simple_widths_and_descriptor() {
        let mut doc = LopdfDocument::with_version("1.7");
        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "Ascent" => 900,
            "Descent" => -250,
        });
        let dict = dictionary! {
            "Subtype" => "TrueType",
            "BaseFont" => "Arial",
            "FirstChar" => 32,
            "Widths" => vec![Object::Integer(250), Object::Integer(333)],
            "FontDescriptor" => descriptor,
        };
        let metrics = FontMetrics::from_dict(&doc, &dict);
        assert_eq!(metrics.glyph_width(32), 250.0);
        assert_eq!(metrics.glyph_width(33), 333.0);
        assert!((metrics.ascent - 0.9).abs() < 1e-6);
        assert!((metrics.descent + 0.25).abs() < 1e-6);

        // Word spacing applies to the space only
        let adv = metrics.advance(b" !", 10.0, 0.0, 2.0, 1.0);
        assert!((adv - (2.5 + 2.0 + 3.33)).abs() < 1e-4);
    }

    #[test]
    fn test_type0_cid_widths() {
        let mut doc = LopdfDocument::with_version("1.7");
        let cid_font = doc.add_object(dictionary! {
            "Subtype" => "CIDFontType2",
            "DW" => 1000,
            "W" => vec![
                Object::Integer(1),
                Object::Array(vec![Object::Integer(600), Object::Integer(700)]),
                Object::Integer(10),
                Object::Integer(12),
                Object::Integer(400),
            ],
        });
        let dict = dictionary! {
            "Subtype" => "Type0",
            "BaseFont" => "NotoSans",
            "DescendantFonts" => vec![Object::Reference(cid_font)],
        };
        let metrics = FontMetrics::from_dict(&doc, &dict);
        assert!(metrics.two_byte);
        assert_eq!(metrics.codes(&[0x00, 0x01, 0x00, 0x0B]), vec![1, 11]);
        assert_eq!(metrics.glyph_width(2), 700.0);
        assert_eq!(metrics.glyph_width(11), 400.0);
        assert_eq!(metrics.glyph_width(99), 1000.0);
    }

    #[test]
    fn test_cid_widths_stop_at_code_space_end() {
        let mut doc = LopdfDocument::with_version("1.7");
        let cid_font = doc.add_object(dictionary! {
            "Subtype" => "CIDFontType2",
            "W" => vec![
                Object::Real(4294967295.0),
                Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
            ],
        });
        let dict = dictionary! {
            "Subtype" => "Type0",
            "BaseFont" => "Crafted",
            "DescendantFonts" => vec![Object::Reference(cid_font)],
        };
        let metrics = FontMetrics::from_dict(&doc, &dict);
        assert_eq!(metrics.glyph_width(u32::MAX), 500.0);
        assert_eq!(metrics.glyph_width(7), 1000.0);
    }
}
