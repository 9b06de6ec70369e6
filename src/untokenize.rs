use crate::token::{Token, TokenKind};

/// Rebuild source text from tokens that carry no positions
///
/// Names and numbers are followed by a space, adjacent strings are
/// separated by one, and every line starts with the text of the innermost
/// open `INDENT`. The result tokenizes back to the same token kinds and
/// texts, though spacing may differ from the original source.
pub fn untokenize<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    let mut out = String::new();
    let mut indents: Vec<&str> = Vec::new();
    let mut start_line = false;
    let mut prev_string = false;

    for token in tokens {
        let is_string = token.kind == TokenKind::String;
        if is_string && prev_string {
            out.push(' ');
        }
        prev_string = is_string;

        match token.kind {
            TokenKind::Indent => {
                indents.push(&token.text);
                continue;
            }
            TokenKind::Dedent => {
                indents.pop();
                continue;
            }
            TokenKind::Newline | TokenKind::Nl => start_line = true,
            _ if start_line => {
                if let Some(indent) = indents.last() {
                    out.push_str(indent);
                }
                start_line = false;
            }
            _ => {}
        }

        out.push_str(&token.text);
        if matches!(token.kind, TokenKind::Name | TokenKind::Number) {
            out.push(' ');
        }
    }
    out
}
