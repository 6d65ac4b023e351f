use logos::Logos;

/// Token types for HTML fragments
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    // <!DOCTYPE ...> and friends
    #[regex(r"<![a-zA-Z][^>]*>")]
    Declaration,

    #[regex(r"<\?[^>]*>")]
    ProcessingInstruction,

    #[regex(r#"<[a-zA-Z][a-zA-Z0-9-]*([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    OpenTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[^>]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokenize an HTML fragment. Input the lexer cannot match (a stray `<`)
/// comes back as text so no content is lost.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let lexer = Token::lexer(source);
    lexer
        .spanned()
        .filter_map(|(result, span)| match result {
            Ok(Token::Comment | Token::Declaration | Token::ProcessingInstruction) => None,
            Ok(token) => Some((token, span)),
            Err(()) => Some((Token::Text(&source[span.clone()]), span)),
        })
        .collect()
}

/// A parsed start tag.
#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Split `<name a="1" b='2' c=3 d>` into its name and attributes.
/// Attribute names are lowercased and values are entity-decoded.
pub fn parse_start_tag(raw: &str) -> StartTag {
    let inner = raw.trim_start_matches('<').trim_end_matches('>');
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();

    let mut attributes = Vec::new();
    let mut rest = inner[name_end..].chars().peekable();

    loop {
        while rest.next_if(|c| c.is_whitespace() || *c == '/').is_some() {}

        let mut key = String::new();
        while let Some(c) = rest.next_if(|c| !c.is_whitespace() && *c != '=' && *c != '/') {
            key.push(c);
        }
        if key.is_empty() {
            break;
        }

        while rest.next_if(|c| c.is_whitespace()).is_some() {}

        let value = if rest.next_if_eq(&'=').is_some() {
            while rest.next_if(|c| c.is_whitespace()).is_some() {}
            match rest.peek().copied() {
                Some(quote @ ('"' | '\'')) => {
                    rest.next();
                    let mut value = String::new();
                    for c in rest.by_ref() {
                        if c == quote {
                            break;
                        }
                        value.push(c);
                    }
                    value
                }
                _ => {
                    let mut value = String::new();
                    while let Some(c) = rest.next_if(|c| !c.is_whitespace()) {
                        value.push(c);
                    }
                    value
                }
            }
        } else {
            String::new()
        };

        attributes.push((key.to_ascii_lowercase(), decode_entities(&value)));
    }

    StartTag {
        name,
        attributes,
        self_closing,
    }
}

/// Name of a `</name>` tag, lowercased.
pub fn close_tag_name(raw: &str) -> String {
    raw.trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}

/// Decode the character references the serializer emits, plus the common
/// named ones. Unknown references are kept verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail.find(';').filter(|end| *end <= 10).and_then(|end| {
            let name = &tail[1..end];
            let ch = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, end))
        });

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_tags_and_text() {
        let tokens = tokenize("<p class=\"a\">Hi <b>there</b></p>");
        let kinds: Vec<_> = tokens.iter().map(|(token, _)| token.clone()).collect();

        assert_eq!(
            kinds,
            vec![
                Token::OpenTag("<p class=\"a\">"),
                Token::Text("Hi "),
                Token::OpenTag("<b>"),
                Token::Text("there"),
                Token::CloseTag("</b>"),
                Token::CloseTag("</p>"),
            ]
        );
    }

    #[test]
    fn test_comments_and_doctype_are_skipped() {
        let tokens = tokenize("<!DOCTYPE html><!-- note --><p>x</p>");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].0, Token::OpenTag("<p>"));
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let tokens = tokenize("a < b");
        let text: String = tokens
            .iter()
            .map(|(token, _)| match token {
                Token::Text(t) => *t,
                _ => "",
            })
            .collect();
        assert_eq!(text, "a < b");
    }

    #[test]
    fn test_parse_start_tag_attributes() {
        let tag = parse_start_tag("<A HREF=\"/x?a=1&amp;b=2\" target='_self' data-x=3 hidden>");
        assert_eq!(tag.name, "a");
        assert_eq!(tag.attr("href"), Some("/x?a=1&b=2"));
        assert_eq!(tag.attr("target"), Some("_self"));
        assert_eq!(tag.attr("data-x"), Some("3"));
        assert_eq!(tag.attr("hidden"), Some(""));
        assert!(!tag.self_closing);
    }

    #[test]
    fn test_parse_self_closing_tag() {
        let tag = parse_start_tag("<img src=\"/a.png\" alt=\"\" />");
        assert_eq!(tag.name, "img");
        assert_eq!(tag.attr("src"), Some("/a.png"));
        assert!(tag.self_closing);

        let tag = parse_start_tag("<br/>");
        assert_eq!(tag.name, "br");
        assert!(tag.self_closing);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#39;d&#39; &#x41;"), "a & b <c> 'd' A");
        assert_eq!(decode_entities("AT&T &bogus;"), "AT&T &bogus;");
    }
}
