//! Stylesheet scoping
//!
//! Rewrites top-level selectors so a book's rules only match inside the
//! host container. Property values are never parsed.

/// Kind of a stylesheet token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Text run directly followed by `{`
    Selector,
    OpenBrace,
    CloseBrace,
    /// Any other text run (declarations, trailing text)
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Split a stylesheet into brace tokens and the text runs between them
///
/// Empty text runs are kept so every `{` is preceded by a selector token.
pub fn tokenize(css: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;

    for (pos, ch) in css.char_indices() {
        let kind = match ch {
            '{' => TokenKind::OpenBrace,
            '}' => TokenKind::CloseBrace,
            _ => continue,
        };
        let text_kind = if kind == TokenKind::OpenBrace {
            TokenKind::Selector
        } else {
            TokenKind::Other
        };
        tokens.push(Token {
            kind: text_kind,
            text: &css[start..pos],
        });
        tokens.push(Token {
            kind,
            text: &css[pos..pos + 1],
        });
        start = pos + 1;
    }

    tokens.push(Token {
        kind: TokenKind::Other,
        text: &css[start..],
    });
    tokens
}

/// Scope every top-level rule of `css` under `scope_selector`
///
/// `body` and `html` selectors become the scope selector itself. Blocks
/// opened by at-rules (`@media`, `@keyframes`, ...) keep their inner
/// selectors untouched. Unbalanced braces produce best-effort output.
pub fn scope(css: &str, scope_selector: &str) -> String {
    let mut output = String::with_capacity(css.len() + css.len() / 4);
    let mut depth: i64 = 0;

    for token in tokenize(css) {
        match token.kind {
            TokenKind::Selector if depth == 0 && !token.text.trim().starts_with('@') => {
                output.push_str(&scope_selector_group(token.text, scope_selector));
            }
            TokenKind::OpenBrace => {
                depth += 1;
                output.push_str(token.text);
            }
            TokenKind::CloseBrace => {
                depth -= 1;
                output.push_str(token.text);
            }
            _ => output.push_str(token.text),
        }
    }

    output
}

/// Rewrite one comma-separated selector group
pub fn scope_selector_group(group: &str, scope_selector: &str) -> String {
    group
        .split(',')
        .map(|selector| {
            let selector = selector.trim();
            if selector.eq_ignore_ascii_case("body") || selector.eq_ignore_ascii_case("html") {
                scope_selector.to_string()
            } else {
                format!("{} {}", scope_selector, selector)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
