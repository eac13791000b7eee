//! Inline color markup: `[red]Alert[/red] level [accent]3[/accent]`.
//!
//! Tags are matched with a stack. Well-formed spans may nest (the innermost
//! color wins) or sit next to each other. Anything that does not form a
//! matching pair stays in the text literally:
//!
//! - a tag whose name is not a color (`[note]`),
//! - a closing tag that does not close the innermost open span,
//! - an opening tag that is never closed.

use crate::color::ColorToken;

/// A run of text drawn in one color. `None` means the element's own color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub color: Option<String>,
}

impl Span {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            color: None,
        }
    }
}

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    Open { name: String, raw: &'a str },
    Close { name: String, raw: &'a str },
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = input;
    while let Some(start) = rest.find('[') {
        let Some(len) = rest[start..].find(']') else {
            break;
        };
        let raw = &rest[start..start + len + 1];
        let inner = raw[1..raw.len() - 1].trim().to_ascii_lowercase();

        if start > 0 {
            tokens.push(Token::Text(&rest[..start]));
        }
        if let Some(name) = inner.strip_prefix('/') {
            tokens.push(Token::Close {
                name: name.trim().to_string(),
                raw,
            });
        } else if !inner.is_empty() && ColorToken::parse(&inner).is_ok() {
            tokens.push(Token::Open { name: inner, raw });
        } else {
            tokens.push(Token::Text(raw));
        }
        rest = &rest[start + len + 1..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest));
    }
    tokens
}

/// Split marked-up text into colored spans.
pub fn parse(input: &str) -> Vec<Span> {
    let tokens = tokenize(input);

    // Pair tags
    let mut matched = vec![false; tokens.len()];
    let mut open: Vec<(usize, &str)> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open { name, .. } => open.push((i, name.as_str())),
            Token::Close { name, .. } => {
                if open.last().is_some_and(|(_, top)| *top == name.as_str()) {
                    if let Some((j, _)) = open.pop() {
                        matched[i] = true;
                        matched[j] = true;
                    }
                }
            }
            Token::Text(_) => {}
        }
    }

    let mut spans: Vec<Span> = Vec::new();
    let mut colors: Vec<&str> = Vec::new();
    let mut push = |text: &str, color: Option<&str>| {
        if text.is_empty() {
            return;
        }
        match spans.last_mut() {
            Some(last) if last.color.as_deref() == color => last.text.push_str(text),
            _ => spans.push(Span {
                text: text.to_string(),
                color: color.map(str::to_string),
            }),
        }
    };

    for (i, token) in tokens.iter().enumerate() {
        let current = colors.last().copied();
        match token {
            Token::Text(text) => push(text, current),
            Token::Open { name, .. } if matched[i] => colors.push(name.as_str()),
            Token::Close { .. } if matched[i] => {
                colors.pop();
            }
            Token::Open { raw, .. } | Token::Close { raw, .. } => push(raw, current),
        }
    }
    spans
}

/// Concatenated text of all spans.
pub fn visible_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// The spans covering the byte range `[start, end)` of the visible text.
pub fn slice_spans(spans: &[Span], start: usize, end: usize) -> Vec<Span> {
    let mut out = Vec::new();
    let mut offset = 0;
    for span in spans {
        let (s, e) = (offset, offset + span.text.len());
        offset = e;
        let (a, b) = (start.max(s), end.min(e));
        if a < b {
            out.push(Span {
                text: span.text[a - s..b - s].to_string(),
                color: span.color.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn colored(text: &str, color: &str) -> Span {
        Span {
            text: text.to_string(),
            color: Some(color.to_string()),
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("hello"), vec![Span::plain("hello")]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_adjacent_spans() {
        assert_eq!(
            parse("[red]A[/red][black]B[/black] C"),
            vec![colored("A", "red"), colored("B", "black"), Span::plain(" C")]
        );
    }

    #[test]
    fn test_nested_spans() {
        assert_eq!(
            parse("[red]a[yellow]b[/yellow]c[/red]"),
            vec![colored("a", "red"), colored("b", "yellow"), colored("c", "red")]
        );
    }

    #[test]
    fn test_malformed_markup_is_literal() {
        assert_eq!(parse("[red]open"), vec![Span::plain("[red]open")]);
        assert_eq!(parse("close[/red]"), vec![Span::plain("close[/red]")]);
        assert_eq!(parse("[note]x[/note]"), vec![Span::plain("[note]x[/note]")]);
        assert_eq!(parse("a [b"), vec![Span::plain("a [b")]);
        // Crossed tags: only the inner pair is out of order
        assert_eq!(
            parse("[red]a[black]b[/red]c[/black]"),
            vec![
                Span::plain("[red]a"),
                colored("b[/red]c", "black"),
            ]
        );
    }

    #[test]
    fn test_case_insensitive_tags() {
        assert_eq!(parse("[RED]x[/Red]"), vec![colored("x", "red")]);
    }

    #[test]
    fn test_slice_spans() {
        let spans = parse("ab[red]cd[/red]ef");
        assert_eq!(visible_text(&spans), "abcdef");
        assert_eq!(
            slice_spans(&spans, 1, 5),
            vec![Span::plain("b"), colored("cd", "red"), Span::plain("e")]
        );
    }
}
