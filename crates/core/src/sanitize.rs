//! Normalizes comment bodies that arrive with HTML entities and inline markup.
//!
//! Entities are decoded first so escaped markup (`&lt;b&gt;`) is converted the
//! same way as literal markup. A small set of structural tags becomes
//! markdown-like text, anchors become `text (url)`, everything else that looks
//! like a tag is dropped. The whole transformation is repeated until the text
//! stops changing, which makes [`sanitize`] idempotent.

const MAX_ENTITY_LEN: usize = 32;

pub fn sanitize(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n");
    // A pass that changes the text lowers its length plus its `<` count.
    for _ in 0..=text.len() * 2 {
        let next = tidy(&convert_tags(&decode_html_entities(&text)));
        if next == text {
            break;
        }
        text = next;
    }
    text
}

/// Sanitizes and flattens to a single line, for titles and headers.
pub fn sanitize_inline(raw: &str) -> String {
    normalize_whitespace(&sanitize(raw))
}

/// Entity decoding only, for bodies that are already markdown. Angle brackets
/// produced by decoding are kept as text.
pub fn decode_entities(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n");
    for _ in 0..=text.len() {
        let next = decode_html_entities(&text);
        if next == text {
            break;
        }
        text = next;
    }
    text.trim().to_string()
}

fn decode_html_entities(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            output.push(ch);
            continue;
        }

        let mut entity = String::new();
        let mut valid = false;
        while let Some(&next) = chars.peek() {
            if next == ';' {
                chars.next();
                valid = true;
                break;
            }
            if next.is_whitespace() || next == '&' || next == '<' || entity.len() > MAX_ENTITY_LEN {
                break;
            }
            chars.next();
            entity.push(next);
        }

        if !valid {
            output.push('&');
            output.push_str(&entity);
            continue;
        }

        match entity.to_ascii_lowercase().as_str() {
            "lt" => output.push('<'),
            "gt" => output.push('>'),
            "amp" => output.push('&'),
            "quot" | "#34" | "#x22" => output.push('"'),
            "apos" | "#39" | "#x27" => output.push('\''),
            "#47" | "#x2f" => output.push('/'),
            "nbsp" => output.push(' '),
            _ => {
                output.push('&');
                output.push_str(&entity);
                output.push(';');
            }
        }
    }
    output
}

struct Tag<'a> {
    name: String,
    closing: bool,
    attrs: &'a str,
    len: usize,
}

struct Anchor {
    href: String,
    text: String,
}

#[derive(Default)]
struct TagWriter {
    output: String,
    anchor: Option<Anchor>,
    in_pre: bool,
}

impl TagWriter {
    fn push_text(&mut self, text: &str) {
        match self.anchor.as_mut() {
            Some(anchor) => anchor.text.push_str(text),
            None => self.output.push_str(text),
        }
    }

    fn apply(&mut self, tag: &Tag<'_>) {
        match (tag.name.as_str(), tag.closing) {
            ("p", _) => self.push_text("\n\n"),
            ("br", _) => self.push_text("\n"),
            ("i" | "em", _) => self.push_text("*"),
            ("b" | "strong", _) => self.push_text("**"),
            ("code", _) if self.in_pre => {}
            ("code", _) => self.push_text("`"),
            ("pre", false) => {
                self.in_pre = true;
                self.push_text("\n```\n");
            }
            ("pre", true) => {
                self.in_pre = false;
                self.push_text("\n```\n");
            }
            ("a", false) => {
                self.close_anchor();
                self.anchor = Some(Anchor {
                    href: extract_href(tag.attrs),
                    text: String::new(),
                });
            }
            ("a", true) => self.close_anchor(),
            _ => {}
        }
    }

    fn close_anchor(&mut self) {
        let Some(anchor) = self.anchor.take() else {
            return;
        };
        let text = anchor.text.trim();
        let href = anchor.href.trim();
        if href.is_empty() || text == href {
            self.output.push_str(text);
        } else if text.is_empty() {
            self.output.push_str(href);
        } else {
            self.output.push_str(text);
            self.output.push_str(" (");
            self.output.push_str(href);
            self.output.push(')');
        }
    }

    fn finish(mut self) -> String {
        if let Some(anchor) = self.anchor.take() {
            self.output.push_str(&anchor.text);
        }
        self.output
    }
}

fn convert_tags(input: &str) -> String {
    let mut writer = TagWriter::default();
    let mut rest = input;
    while let Some(pos) = rest.find('<') {
        writer.push_text(&rest[..pos]);
        let candidate = &rest[pos..];
        match parse_tag(candidate) {
            Some(tag) => {
                writer.apply(&tag);
                rest = &candidate[tag.len..];
            }
            None => {
                writer.push_text("<");
                rest = &candidate[1..];
            }
        }
    }
    writer.push_text(rest);
    writer.finish()
}

/// Parses a tag at the start of `input`, which begins with `<`. A tag needs a
/// letter right after `<` or `</` and a closing `>` before the next `<`.
fn parse_tag(input: &str) -> Option<Tag<'_>> {
    let body = &input[1..];
    let (closing, body) = match body.strip_prefix('/') {
        Some(stripped) => (true, stripped),
        None => (false, body),
    };
    if !body.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
        return None;
    }
    let end = body.find(['<', '>'])?;
    if !body[end..].starts_with('>') {
        return None;
    }
    let inner = &body[..end];
    let name_len = inner
        .find(|ch: char| !ch.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let name = inner[..name_len].to_ascii_lowercase();
    let attrs = &inner[name_len..];
    let len = input.len() - body.len() + end + 1;
    Some(Tag {
        name,
        closing,
        attrs,
        len,
    })
}

fn extract_href(attrs: &str) -> String {
    let lower = attrs.to_ascii_lowercase();
    let Some(pos) = lower.find("href") else {
        return String::new();
    };
    let after = attrs[pos + 4..].trim_start();
    let Some(value) = after.strip_prefix('=') else {
        return String::new();
    };
    let value = value.trim_start();
    for quote in ['"', '\''] {
        if let Some(quoted) = value.strip_prefix(quote) {
            return quoted.split(quote).next().unwrap_or("").to_string();
        }
    }
    value
        .split(char::is_whitespace)
        .next()
        .unwrap_or("")
        .to_string()
}

fn tidy(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut blank_run = 0;
    for line in input.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        output.push_str(line);
        output.push('\n');
    }
    output.trim().to_string()
}

fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fixed_entity_set() {
        assert_eq!(
            sanitize("it&#x27;s &amp; &quot;fine&quot; &#x2F; ok"),
            "it's & \"fine\" / ok"
        );
        assert_eq!(sanitize("AT&amp;T &copy; 2024"), "AT&T &copy; 2024");
    }

    #[test]
    fn converts_escaped_markup() {
        assert_eq!(sanitize("&lt;b&gt;hi&lt;/b&gt;"), "**hi**");
        assert_eq!(sanitize("<i>soft</i> and <code>x()</code>"), "*soft* and `x()`");
    }

    #[test]
    fn rewrites_anchors() {
        let raw = r#"see <a href="https:&#x2F;&#x2F;example.com&#x2F;a" rel="nofollow">the docs</a>"#;
        assert_eq!(sanitize(raw), "see the docs (https://example.com/a)");
        let bare = r#"<a href="https://x.dev">https://x.dev</a>"#;
        assert_eq!(sanitize(bare), "https://x.dev");
    }

    #[test]
    fn paragraphs_and_code_blocks() {
        let raw = "first<p>second<pre><code>let x = 1;</code></pre>";
        assert_eq!(sanitize(raw), "first\n\nsecond\n```\nlet x = 1;\n```");
    }

    #[test]
    fn strips_unknown_tags_and_keeps_literal_brackets() {
        assert_eq!(sanitize("<span class=\"x\">a</span> < b"), "a < b");
        assert_eq!(sanitize("1 <2 and 3> 2"), "1 <2 and 3> 2");
        assert_eq!(sanitize("<div>unclosed"), "unclosed");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "&lt;b&gt;hi&lt;/b&gt;",
            "&amp;lt;i&amp;gt;double&amp;lt;/i&amp;gt;",
            "<<span></span>b>x",
            "a<p><p><p>b",
            "<a href='u'>t</a> &amp;amp; <pre>  code  </pre>",
            "plain text with * stars and `ticks`",
            "tail &",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input}");
        }
    }

    #[test]
    fn decode_only_keeps_markdown_and_brackets() {
        assert_eq!(decode_entities("  a &amp;gt; b &lt;T&gt; **x**  "), "a > b <T> **x**");
    }

    #[test]
    fn deeply_escaped_entities_reach_a_fixpoint() {
        let raw = format!("&{}lt;b&gt;x&lt;/b&gt;", "amp;".repeat(12));
        let once = sanitize(&raw);
        assert_eq!(once, "**x**");
        assert_eq!(sanitize(&once), once);

        let raw = format!("a &{}gt; b", "amp;".repeat(12));
        assert_eq!(decode_entities(&raw), "a > b");
    }

    #[test]
    fn inline_collapses_whitespace() {
        assert_eq!(sanitize_inline("Ask HN:<p>  what   now?"), "Ask HN: what now?");
    }
}
