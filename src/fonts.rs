//! Standard-14 Helvetica metrics and WinAnsi encoding. Page text and form
//! widgets are set in the base Helvetica faces, which every viewer carries,
//! so nothing gets embedded.

use pdf_writer::{Name, Pdf, Ref};

use crate::model::FontFace;

/// Helvetica advance widths at 1000 units/em for ASCII 32..=126.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

/// Width used for WinAnsi characters outside ASCII.
const FALLBACK_WIDTH: u16 = 556;

pub(crate) const ALL_FACES: [FontFace; 4] =
    [FontFace::Regular, FontFace::Bold, FontFace::Italic, FontFace::BoldItalic];

pub(crate) fn base_font(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => "Helvetica",
        FontFace::Bold => "Helvetica-Bold",
        FontFace::Italic => "Helvetica-Oblique",
        FontFace::BoldItalic => "Helvetica-BoldOblique",
    }
}

/// Resource name of the face in page resource dictionaries.
pub(crate) fn resource_name(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => "F1",
        FontFace::Bold => "F2",
        FontFace::Italic => "F3",
        FontFace::BoldItalic => "F4",
    }
}

fn is_bold(face: FontFace) -> bool {
    matches!(face, FontFace::Bold | FontFace::BoldItalic)
}

/// Advance of `c` in points. Characters WinAnsi cannot encode are dropped
/// at render time and take no room.
pub fn char_width(c: char, face: FontFace, font_size: f32) -> f32 {
    let Some(byte) = winansi_byte(c) else {
        return 0.0;
    };
    let table = if is_bold(face) { &HELVETICA_BOLD_ASCII } else { &HELVETICA_ASCII };
    let units = match byte {
        32..=126 => table[usize::from(byte - 32)],
        0..=31 => 0,
        _ => FALLBACK_WIDTH,
    };
    f32::from(units) / 1000.0 * font_size
}

pub fn text_width(text: &str, face: FontFace, font_size: f32) -> f32 {
    text.chars().map(|c| char_width(c, face, font_size)).sum()
}

/// Windows-1252 byte for `c`, if it has one.
fn winansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x0000..=0x007F => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8), // Latin-1 supplement maps directly
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // bullet
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(winansi_byte).collect()
}

/// Write the four Helvetica faces; returns their refs in [`ALL_FACES`] order.
pub(crate) fn write_fonts(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> [Ref; 4] {
    ALL_FACES.map(|face| {
        let font_ref = alloc();
        pdf.type1_font(font_ref)
            .base_font(Name(base_font(face).as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        font_ref
    })
}

/// ZapfDingbats, used by checkbox and radio appearances.
pub(crate) fn write_dingbats(pdf: &mut Pdf, font_ref: Ref) {
    pdf.type1_font(font_ref).base_font(Name(b"ZapfDingbats"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert!((char_width(' ', FontFace::Regular, 10.0) - 2.78).abs() < 1e-4);
        assert!(text_width("mmm", FontFace::Bold, 12.0) > text_width("iii", FontFace::Bold, 12.0));
        assert_eq!(char_width('\u{200B}', FontFace::Regular, 12.0), 0.0);
    }

    #[test]
    fn winansi() {
        assert_eq!(to_winansi_bytes("a\u{20AC}\u{4E2D}"), vec![b'a', 0x80]);
    }
}
