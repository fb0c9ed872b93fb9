use thiserror::Error;

/// Storage-class macro the generated declarations are rewritten to.
pub const DEFAULT_SEGMENT_MACRO: &str = "SI_SEGMENT_VARIABLE";

/// Element type of the rewritten array declaration.
pub const DEFAULT_ELEMENT_TYPE: &str = "const uint8_t";

/// Memory segment the array is placed in (code/flash).
pub const DEFAULT_SEGMENT: &str = "SI_SEG_CODE";

/// Declaration shape emitted by the XBM converter: `static char <ident>[] = {`.
const DECL_KEYWORD: &str = "static char ";
const DECL_TAIL: &str = "[] = {";

/// Failures in the converter-produced artifact text.
///
/// Any of these means the artifact is malformed and the file must not be
/// rewritten; the caller reports the offending path and moves on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArtifactError {
    /// The text contains no `{ ... }` array literal.
    #[error("no array literal found (missing `{{` or `}}`)")]
    MissingBraces,
    /// A located `0x` literal is truncated or not two hex digits.
    #[error("invalid hex literal `{0}`")]
    InvalidHexLiteral(String),
}

/// Reverses the bit order of a byte: bit 0 becomes bit 7, bit 1 becomes
/// bit 6, and so on. Needed because the XBM format and the display
/// hardware disagree on pixel-bit scan order.
pub const fn reverse_bits(b: u8) -> u8 {
    // Swap nibbles, then 2-bit pairs, then adjacent bits.
    let b = (b >> 4) | (b << 4);
    let b = ((b & 0xCC) >> 2) | ((b & 0x33) << 2);
    ((b & 0xAA) >> 1) | ((b & 0x55) << 1)
}

/// Bit-reverses the single `0xNN` literal inside a text fragment.
///
/// The fragment is one comma-separated array element, so it carries at most
/// one literal. A fragment with no `0x` at all (e.g. pure whitespace) is
/// returned unchanged. The literal is reformatted as two uppercase hex
/// digits; surrounding text is preserved byte-for-byte.
pub fn reverse_hex_literal(fragment: &str) -> Result<String, ArtifactError> {
    let pos = match fragment.find("0x") {
        Some(pos) => pos,
        None => return Ok(fragment.to_string()),
    };

    let literal = fragment
        .get(pos..pos + 4)
        .ok_or_else(|| ArtifactError::InvalidHexLiteral(fragment[pos..].to_string()))?;
    let value = u8::from_str_radix(&literal[2..], 16)
        .map_err(|_| ArtifactError::InvalidHexLiteral(literal.to_string()))?;

    Ok(format!(
        "{}0x{:02X}{}",
        &fragment[..pos],
        reverse_bits(value),
        &fragment[pos + 4..]
    ))
}

/// Bit-reverses every element of the artifact's array literal.
///
/// The literal is everything between the first `{` and the last `}` of the
/// text; the format is guaranteed single-level by the upstream converter, so
/// brace matching is positional and never nesting-aware. Elements are split
/// on `,`; a trailing pure-whitespace element (artifact of a trailing comma)
/// is dropped. Everything outside the braces, and the spacing inside each
/// element, is preserved as-is.
pub fn transform_array(text: &str) -> Result<String, ArtifactError> {
    let open = text.find('{').ok_or(ArtifactError::MissingBraces)?;
    let close = text.rfind('}').ok_or(ArtifactError::MissingBraces)?;
    if close < open {
        return Err(ArtifactError::MissingBraces);
    }

    let mut elements: Vec<&str> = text[open + 1..close].split(',').collect();
    if let Some(last) = elements.last() {
        if last.trim().is_empty() {
            elements.pop();
        }
    }

    let rebuilt = elements
        .iter()
        .map(|element| reverse_hex_literal(element))
        .collect::<Result<Vec<_>, _>>()?
        .join(",");

    Ok(format!("{}{}{}", &text[..=open], rebuilt, &text[close..]))
}

/// Target form of the array declaration.
///
/// Rewrites the converter's `static char <ident>[] = {` into
/// `<macro_name>(<ident>[], <element_type>, <segment>) = {`, directing the
/// linker to place the constant in the named memory segment.
#[derive(Debug, Clone)]
pub struct SegmentDecl {
    pub macro_name: String,
    pub element_type: String,
    pub segment: String,
}

impl Default for SegmentDecl {
    fn default() -> Self {
        Self {
            macro_name: DEFAULT_SEGMENT_MACRO.to_string(),
            element_type: DEFAULT_ELEMENT_TYPE.to_string(),
            segment: DEFAULT_SEGMENT.to_string(),
        }
    }
}

impl SegmentDecl {
    /// Rewrites the first matching declaration, preserving the identifier.
    ///
    /// No match is not an error: the text is returned unchanged. A text
    /// already in the target form no longer matches, so a second pass is a
    /// no-op rather than a double wrap.
    pub fn rewrite(&self, text: &str) -> String {
        let (start, identifier) = match find_declaration(text) {
            Some(found) => found,
            None => return text.to_string(),
        };
        let end = start + DECL_KEYWORD.len() + identifier.len() + DECL_TAIL.len();

        format!(
            "{}{}({}[], {}, {}) = {{{}",
            &text[..start],
            self.macro_name,
            identifier,
            self.element_type,
            self.segment,
            &text[end..]
        )
    }
}

/// Finds the first complete `static char <ident>[] = {` occurrence and
/// returns its start offset and the identifier.
fn find_declaration(text: &str) -> Option<(usize, &str)> {
    let mut from = 0;
    while let Some(found) = text[from..].find(DECL_KEYWORD) {
        let start = from + found;
        let rest = &text[start + DECL_KEYWORD.len()..];

        let ident_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if ident_len > 0 && rest[ident_len..].starts_with(DECL_TAIL) {
            return Some((start, &rest[..ident_len]));
        }

        from = start + DECL_KEYWORD.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversal_is_an_involution() {
        for b in 0..=255u8 {
            assert_eq!(reverse_bits(reverse_bits(b)), b);
        }
    }

    #[test]
    fn reversal_matches_bit_indexed_reference() {
        for b in 0..=255u8 {
            let mut expected = 0u8;
            for i in 0..8 {
                if b & (1 << i) != 0 {
                    expected |= 1 << (7 - i);
                }
            }
            assert_eq!(reverse_bits(b), expected);
        }
    }

    #[test]
    fn palindromic_byte_is_unchanged() {
        assert_eq!(reverse_hex_literal("0xA5").unwrap(), "0xA5");
    }

    #[test]
    fn low_bit_moves_to_high_bit() {
        assert_eq!(reverse_hex_literal(" 0x01").unwrap(), " 0x80");
    }

    #[test]
    fn lowercase_literal_is_reformatted_uppercase() {
        assert_eq!(reverse_hex_literal(" 0x1e ").unwrap(), " 0x78 ");
    }

    #[test]
    fn fragment_without_literal_passes_through() {
        assert_eq!(reverse_hex_literal(" \n").unwrap(), " \n");
    }

    #[test]
    fn truncated_literal_is_rejected() {
        assert!(matches!(
            reverse_hex_literal("{ 0x1"),
            Err(ArtifactError::InvalidHexLiteral(_))
        ));
    }

    #[test]
    fn non_hex_digits_are_rejected() {
        assert!(matches!(
            reverse_hex_literal("0xZZ"),
            Err(ArtifactError::InvalidHexLiteral(_))
        ));
    }

    #[test]
    fn trailing_comma_artifact_is_dropped() {
        assert_eq!(
            transform_array("{0x00, 0x01, 0x80, }").unwrap(),
            "{0x00, 0x80, 0x01}"
        );
    }

    #[test]
    fn reassembly_preserves_surrounding_text() {
        let input = "#define img_width 16\nstatic char img_bits[] = {\n  0x01, 0x02,\n  0x03 };\n";
        assert_eq!(
            transform_array(input).unwrap(),
            "#define img_width 16\nstatic char img_bits[] = {\n  0x80, 0x40,\n  0xC0 };\n"
        );
    }

    #[test]
    fn empty_array_is_preserved() {
        assert_eq!(transform_array("{ }").unwrap(), "{}");
    }

    #[test]
    fn missing_braces_is_malformed() {
        assert_eq!(
            transform_array("static char img[] = 0x01;"),
            Err(ArtifactError::MissingBraces)
        );
    }

    #[test]
    fn double_application_restores_element_values() {
        let original = "{ 0x12, 0x34 }";
        let once = transform_array(original).unwrap();
        assert_ne!(once, original);
        assert_eq!(transform_array(&once).unwrap(), original);
    }

    #[test]
    fn declaration_is_rewritten_with_identifier_preserved() {
        let decl = SegmentDecl::default();
        assert_eq!(
            decl.rewrite("static char img[] = { 0x80, 0x40 };"),
            "SI_SEGMENT_VARIABLE(img[], const uint8_t, SI_SEG_CODE) = { 0x80, 0x40 };"
        );
    }

    #[test]
    fn unmatched_declaration_passes_through() {
        let decl = SegmentDecl::default();
        let text = "const char img[] = { 0x00 };";
        assert_eq!(decl.rewrite(text), text);
    }

    #[test]
    fn incomplete_candidates_are_skipped() {
        let decl = SegmentDecl::default();
        let text = "static char c; static char img[] = { 0x00 };";
        assert_eq!(
            decl.rewrite(text),
            "static char c; SI_SEGMENT_VARIABLE(img[], const uint8_t, SI_SEG_CODE) = { 0x00 };"
        );
    }

    #[test]
    fn rewrite_is_not_reapplied() {
        let decl = SegmentDecl::default();
        let once = decl.rewrite("static char img[] = { 0x01 };");
        assert_eq!(decl.rewrite(&once), once);
    }

    #[test]
    fn full_artifact_transform() {
        let input = "static char img[] = { 0x01, 0x02 };";
        let decl = SegmentDecl::default();
        let rewritten = decl.rewrite(&transform_array(input).unwrap());
        assert_eq!(
            rewritten,
            "SI_SEGMENT_VARIABLE(img[], const uint8_t, SI_SEG_CODE) = { 0x80, 0x40 };"
        );
    }
}
