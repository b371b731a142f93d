//! Lexical scrubber: blanks out comments and quoted-literal content.
//!
//! The output has the same byte length as the input and every `\n` stays at
//! its original offset, so line numbers computed on scrubbed text are valid
//! for the original source. Quote delimiters are kept; everything between
//! them and every comment character becomes a blank.

const FILLER: char = ' ';

/// Scanner states. Transitions happen only out of `Code` and back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrubState {
    Code,
    DoubleQuoted,
    SingleQuoted,
    RawQuoted,
    LineComment,
    BlockComment,
}

/// Returns `src` with comments and literal content neutralized.
pub fn scrub(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut state = ScrubState::Code;
    let mut chars = src.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            ScrubState::Code => match ch {
                '"' => {
                    state = ScrubState::DoubleQuoted;
                    out.push(ch);
                }
                '\'' => {
                    state = ScrubState::SingleQuoted;
                    out.push(ch);
                }
                '`' => {
                    state = ScrubState::RawQuoted;
                    out.push(ch);
                }
                '/' if matches!(chars.peek(), Some('/') | Some('*')) => {
                    state = match chars.next() {
                        Some('/') => ScrubState::LineComment,
                        _ => ScrubState::BlockComment,
                    };
                    out.push(FILLER);
                    out.push(FILLER);
                }
                _ => out.push(ch),
            },
            ScrubState::LineComment => {
                if ch == '\n' {
                    state = ScrubState::Code;
                }
                blank(&mut out, ch);
            }
            ScrubState::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push(FILLER);
                    out.push(FILLER);
                    state = ScrubState::Code;
                } else {
                    blank(&mut out, ch);
                }
            }
            ScrubState::DoubleQuoted | ScrubState::SingleQuoted => {
                let close = if state == ScrubState::DoubleQuoted { '"' } else { '\'' };
                if ch == '\\' {
                    blank(&mut out, ch);
                    // The escaped character never terminates the literal.
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                } else if ch == close {
                    out.push(ch);
                    state = ScrubState::Code;
                } else {
                    blank(&mut out, ch);
                }
            }
            ScrubState::RawQuoted => {
                if ch == '`' {
                    out.push(ch);
                    state = ScrubState::Code;
                } else {
                    blank(&mut out, ch);
                }
            }
        }
    }

    out
}

/// Pushes filler covering `ch`'s UTF-8 width; newlines pass through.
fn blank(out: &mut String, ch: char) {
    if ch == '\n' {
        out.push('\n');
    } else {
        out.extend(std::iter::repeat(FILLER).take(ch.len_utf8()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn newline_offsets(s: &str) -> Vec<usize> {
        s.match_indices('\n').map(|(i, _)| i).collect()
    }

    #[test]
    fn line_comment_is_blanked_up_to_newline() {
        let src = "x := 1 // type Hidden struct{}\ny := 2\n";
        let out = scrub(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains("Hidden"));
        assert!(out.starts_with("x := 1 "));
        assert!(out.ends_with("\ny := 2\n"));
    }

    #[test]
    fn block_comment_keeps_embedded_newlines() {
        let src = "a /* one\nfunc Foo() {\n*/ b\n";
        let out = scrub(src);
        assert_eq!(newline_offsets(&out), newline_offsets(src));
        assert!(!out.contains("Foo"));
        assert!(out.ends_with(" b\n"));
    }

    #[test]
    fn escaped_quote_does_not_end_the_literal() {
        let src = r#"s := "a\"b" + T"#;
        let out = scrub(src);
        assert_eq!(out, r#"s := "    " + T"#);
    }

    #[test]
    fn single_quoted_escape_is_neutralized() {
        let src = r"c := '\'' // x";
        let out = scrub(src);
        assert_eq!(out, "c := '  '     ");
    }

    #[test]
    fn raw_literal_applies_no_escaping() {
        let src = "r := `a\\` + b\nfunc Foo() {}\n";
        let out = scrub(src);
        // The backslash does not escape the closing backtick.
        assert!(out.starts_with("r := `  ` + b\n"));
        assert!(out.contains("func Foo() {}"));
    }

    #[test]
    fn multi_line_raw_literal_hides_declarations() {
        let src = "const Tmpl = `\nfunc Fake() {}\n`\n";
        let out = scrub(src);
        assert!(!out.contains("Fake"));
        assert_eq!(out.lines().count(), src.lines().count());
    }

    #[test]
    fn comment_markers_inside_strings_are_not_comments() {
        let src = "u := \"http://x\"\nvar Y = 1\n";
        let out = scrub(src);
        assert!(out.ends_with("\nvar Y = 1\n"));
    }

    #[test]
    fn multibyte_content_keeps_byte_offsets() {
        let src = "// héllo\ntype Ä int\n\"ü\"\n";
        let out = scrub(src);
        assert_eq!(out.len(), src.len());
        assert_eq!(newline_offsets(&out), newline_offsets(src));
    }

    #[test]
    fn unterminated_regions_run_to_end_of_input() {
        assert_eq!(scrub("a /* b"), "a     ");
        assert_eq!(scrub("\"abc"), "\"   ");
    }

    proptest! {
        #[test]
        fn preserves_length_and_newline_positions(src in "[a-z/*\"'`\\\\ \n\té]{0,200}") {
            let out = scrub(&src);
            prop_assert_eq!(out.len(), src.len());
            prop_assert_eq!(newline_offsets(&out), newline_offsets(&src));
            prop_assert_eq!(out.lines().count(), src.lines().count());
        }
    }
}
