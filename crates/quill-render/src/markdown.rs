//! Markdown to HTML conversion.

use pulldown_cmark::{Options, Parser, html};

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Convert markdown to HTML. Raw HTML, including comments, passes through.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, parser_options());
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_paragraph_and_emphasis() {
        assert_eq!(markdown_to_html("Hello *world*"), "<p>Hello <em>world</em></p>\n");
    }

    #[test]
    fn test_break_marker_survives() {
        let html = markdown_to_html("Intro\n\n<!--BREAK-->\n\nMore");

        assert_eq!(html, "<p>Intro</p>\n<!--BREAK-->\n<p>More</p>\n");
    }

    #[test]
    fn test_tables() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");

        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(markdown_to_html(""), "");
    }
}
