//! HTML to plain text extraction.
//!
//! Markup goes through the html5ever tokenizer, which recovers from
//! malformed input the way browsers do, so extraction always produces some
//! text. Character and entity references are decoded during tokenization;
//! script and style content is dropped; everything else concatenates in
//! document order with no tag-implied spacing added.

use std::cell::{Cell, RefCell};

use html5ever::local_name;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts, states,
};

/// Convert one content document's markup into cleaned plain text.
pub fn extract_text(html: &str) -> String {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let tokenizer = Tokenizer::new(TextSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    clean_text(&tokenizer.sink.take_text())
}

/// Normalize extracted text.
///
/// Lines consisting only of spaces and tabs become empty lines, then runs
/// of newlines collapse so at most one blank line separates paragraphs.
/// Clearing blank lines before collapsing makes the whole pass idempotent:
/// `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(text: &str) -> String {
    let cleared: Vec<&str> = text
        .split('\n')
        .map(|line| if is_blank(line) { "" } else { line })
        .collect();
    collapse_newlines(&cleared.join("\n"))
}

/// A nonempty line made of horizontal whitespace only.
fn is_blank(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == ' ' || c == '\t')
}

/// Replace every run of three or more newlines with exactly two.
fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for c in text.chars() {
        if c == '\n' {
            run += 1;
            if run <= 2 {
                out.push(c);
            }
        } else {
            run = 0;
            out.push(c);
        }
    }
    out
}

/// Accumulates character tokens, skipping script and style content.
///
/// html5ever sinks take `&self`, so state lives behind interior mutability
/// (same arrangement as any tree sink built on this tokenizer).
#[derive(Default)]
struct TextSink {
    text: RefCell<String>,
    skipping: Cell<bool>,
}

impl TextSink {
    fn take_text(&self) -> String {
        self.text.take()
    }

    fn handle_tag(&self, tag: Tag) -> TokenSinkResult<()> {
        let raw_kind = if tag.name == local_name!("script") {
            Some(states::RawKind::ScriptData)
        } else if tag.name == local_name!("style") {
            Some(states::RawKind::Rawtext)
        } else {
            None
        };

        match tag.kind {
            TagKind::StartTag => {
                if let Some(kind) = raw_kind {
                    self.skipping.set(true);
                    // Switch the tokenizer into the matching raw state so the
                    // element's content arrives as opaque character runs
                    // instead of being parsed as markup.
                    return TokenSinkResult::RawData(kind);
                }
            }
            TagKind::EndTag => {
                if raw_kind.is_some() {
                    self.skipping.set(false);
                }
            }
        }
        TokenSinkResult::Continue
    }
}

impl TokenSink for TextSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => self.handle_tag(tag),
            Token::CharacterTokens(chars) => {
                if !self.skipping.get() {
                    self.text.borrow_mut().push_str(&chars);
                }
                TokenSinkResult::Continue
            }
            _ => TokenSinkResult::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_basic() {
        let html = "<html><body><p>Hello</p>\n<p>World</p></body></html>";
        assert_eq!(extract_text(html), "Hello\nWorld");
    }

    #[test]
    fn test_extract_decodes_entities() {
        assert_eq!(extract_text("<p>Fish &amp; Chips</p>"), "Fish & Chips");
        assert_eq!(extract_text("a&#160;b"), "a\u{a0}b");
        assert_eq!(extract_text("1 &lt; 2"), "1 < 2");
    }

    #[test]
    fn test_extract_drops_script_and_style() {
        let html = "<head><style>p { color: red }</style></head>\
                    <body>visible<script>var x = '<p>not text</p>';</script></body>";
        assert_eq!(extract_text(html), "visible");
    }

    #[test]
    fn test_extract_tolerates_malformed_markup() {
        assert_eq!(extract_text("<p>Hello <b>wor"), "Hello wor");
        assert_eq!(extract_text("</b>stray close"), "stray close");
        assert_eq!(extract_text("<"), "<");
    }

    #[test]
    fn test_extract_no_added_spacing() {
        // Adjacent inline elements contribute no whitespace of their own.
        assert_eq!(extract_text("<b>a</b><i>b</i>"), "ab");
    }

    #[test]
    fn test_clean_collapses_newline_runs() {
        assert_eq!(clean_text("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_text("a\n\nb"), "a\n\nb");
        assert_eq!(clean_text("a\nb"), "a\nb");
    }

    #[test]
    fn test_clean_blanks_whitespace_only_lines() {
        assert_eq!(clean_text("a\n \t \nb"), "a\n\nb");
        // Leading/trailing whitespace of non-blank lines is untouched.
        assert_eq!(clean_text("  a  \nb"), "  a  \nb");
    }

    #[test]
    fn test_clean_blank_lines_then_collapse() {
        // Blanked lines join adjacent newlines into one run, which must
        // still collapse down to a single blank line.
        assert_eq!(clean_text("a\n \n \n \nb"), "a\n\nb");
    }

    #[test]
    fn test_clean_idempotent() {
        for input in [
            "a\n\n\n\nb",
            "a\n \n\t\nb\n\n\n",
            "\n\n\nlead",
            "  x  \n\n \n y",
            "",
            "\t\n\t\n\t",
        ] {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "input: {input:?}");
        }
    }
}
