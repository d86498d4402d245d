//! Font-family hygiene for design-tool exports.

/// Clean a font-family name before it reaches the text renderer.
///
/// Exports occasionally embed tabs, carriage returns or other control
/// characters inside the family name. Every whitespace or control character
/// becomes a single space, runs collapse, and the ends are trimmed.
pub fn normalize_font_family(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() || ch.is_control() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_embedded_tab() {
        assert_eq!(normalize_font_family("Futura\tPT"), "Futura PT");
    }

    #[test]
    fn collapses_and_trims() {
        assert_eq!(
            normalize_font_family("  \u{b}Bodoni \r\n\t 72  Book\u{0} "),
            "Bodoni 72 Book"
        );
    }

    #[test]
    fn clean_names_pass_through() {
        assert_eq!(normalize_font_family("Helvetica Neue"), "Helvetica Neue");
        assert_eq!(normalize_font_family(""), "");
        assert_eq!(normalize_font_family("\t\n"), "");
    }
}
