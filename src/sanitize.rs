//! Removal of the invisible format characters word processors inject when a
//! long placeholder wraps mid-word.

/// Soft hyphen, zero-width space/non-joiner/joiner, LRM/RLM, word joiner, BOM.
const INVISIBLE: [char; 8] = [
    '\u{00AD}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}', '\u{2060}', '\u{FEFF}',
];

pub fn is_invisible(c: char) -> bool {
    INVISIBLE.contains(&c)
}

/// Drop every invisible format character; everything else, whitespace
/// included, is kept as is.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !is_invisible(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_whitespace_and_drops_format_chars() {
        let input = "text\u{00AD}box:\u{200B}first name\u{FEFF}\n";
        assert_eq!(sanitize(input), "textbox:first name\n");
        assert_eq!(sanitize(&sanitize(input)), sanitize(input));
    }
}
