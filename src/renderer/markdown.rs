use crate::renderer::SyntaxCache;
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};
use syntect::easy::HighlightLines;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};
use textwrap::{wrap, Options};

const CODE_INDENT: &str = "    ";

/// Turns a model reply into wrapped, highlighted terminal text.
pub struct MarkdownRenderer {
    width: usize,
}

impl MarkdownRenderer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(20),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn render(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len() * 2);
        let mut paragraph = String::with_capacity(256);
        let mut code_language: Option<String> = None;
        let mut list_depth = 0usize;

        for event in Parser::new(text) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    self.flush_paragraph(&mut output, &mut paragraph);
                    code_language = Some(match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => lang.to_string(),
                        _ => "txt".to_string(),
                    });
                    output.push('\n');
                }
                Event::End(Tag::CodeBlock(_)) => {
                    code_language = None;
                    output.push('\n');
                }
                Event::Start(Tag::List(_)) => {
                    self.flush_paragraph(&mut output, &mut paragraph);
                    list_depth += 1;
                }
                Event::End(Tag::List(_)) => {
                    list_depth = list_depth.saturating_sub(1);
                    if list_depth == 0 {
                        output.push('\n');
                    }
                }
                Event::Start(Tag::Item) => {
                    self.flush_paragraph(&mut output, &mut paragraph);
                    paragraph.push_str("• ");
                }
                Event::End(Tag::Item) => self.flush_paragraph(&mut output, &mut paragraph),
                Event::End(Tag::Paragraph) => {
                    self.flush_paragraph(&mut output, &mut paragraph);
                    if list_depth == 0 {
                        output.push('\n');
                    }
                }
                Event::End(Tag::Heading(..)) => {
                    paragraph.push_str("\x1B[22m");
                    self.flush_paragraph(&mut output, &mut paragraph);
                    output.push('\n');
                }
                Event::Start(Tag::Emphasis) => paragraph.push_str("\x1B[3m"),
                Event::End(Tag::Emphasis) => paragraph.push_str("\x1B[23m"),
                Event::Start(Tag::Strong) | Event::Start(Tag::Heading(..)) => {
                    paragraph.push_str("\x1B[1m")
                }
                Event::End(Tag::Strong) => paragraph.push_str("\x1B[22m"),
                Event::Code(code) => {
                    paragraph.push('`');
                    paragraph.push_str(&code);
                    paragraph.push('`');
                }
                Event::Text(text) => match &code_language {
                    Some(language) => Self::highlight(&mut output, &text, language),
                    None => paragraph.push_str(&text),
                },
                Event::SoftBreak => paragraph.push(' '),
                Event::HardBreak => self.flush_paragraph(&mut output, &mut paragraph),
                _ => {}
            }
        }

        self.flush_paragraph(&mut output, &mut paragraph);
        output.trim_end().to_string()
    }

    fn highlight(output: &mut String, code: &str, language: &str) {
        let cache = SyntaxCache::global();
        let mut highlighter = HighlightLines::new(cache.get_syntax(language), cache.get_theme());

        for line in LinesWithEndings::from(code) {
            output.push_str(CODE_INDENT);
            match highlighter.highlight_line(line, &cache.syntax_set) {
                Ok(ranges) => output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false)),
                Err(_) => output.push_str(line),
            }
        }
        output.push_str("\x1B[0m");
    }

    fn flush_paragraph(&self, output: &mut String, current: &mut String) {
        if current.is_empty() {
            return;
        }

        // Bullets hang their wrapped lines under the text, not the marker.
        let options = if current.starts_with('•') {
            Options::new(self.width)
                .initial_indent("  ")
                .subsequent_indent("    ")
        } else {
            Options::new(self.width)
                .initial_indent("  ")
                .subsequent_indent("  ")
        };

        for line in wrap(current, &options) {
            output.push_str(&line);
            output.push('\n');
        }
        current.clear();
    }
}
