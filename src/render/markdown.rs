//! Limited-grammar markdown to HTML conversion: headers, bold, italic,
//! inline code, unordered lists and paragraph breaks. Deliberately not
//! CommonMark; nested or overlapping constructs are best-effort only.

pub fn to_html(markdown: &str) -> String {
    let escaped = escape_html(markdown);
    let mut out = String::with_capacity(escaped.len());
    let mut paragraph: Vec<&str> = Vec::new();
    let mut list_items: Vec<&str> = Vec::new();

    for line in escaped.lines() {
        let trimmed = line.trim_end();
        if let Some(rest) = trimmed.strip_prefix("### ") {
            flush_list(&mut out, &mut list_items);
            flush_paragraph(&mut out, &mut paragraph);
            push_tag(&mut out, "h3", rest);
        } else if let Some(rest) = trimmed.strip_prefix("## ") {
            flush_list(&mut out, &mut list_items);
            flush_paragraph(&mut out, &mut paragraph);
            push_tag(&mut out, "h2", rest);
        } else if let Some(rest) = trimmed.strip_prefix("# ") {
            flush_list(&mut out, &mut list_items);
            flush_paragraph(&mut out, &mut paragraph);
            push_tag(&mut out, "h1", rest);
        } else if let Some(rest) = trimmed.strip_prefix("- ") {
            flush_paragraph(&mut out, &mut paragraph);
            list_items.push(rest);
        } else if trimmed.is_empty() {
            flush_list(&mut out, &mut list_items);
            flush_paragraph(&mut out, &mut paragraph);
        } else {
            flush_list(&mut out, &mut list_items);
            paragraph.push(trimmed);
        }
    }
    flush_list(&mut out, &mut list_items);
    flush_paragraph(&mut out, &mut paragraph);
    out
}

fn flush_paragraph(out: &mut String, paragraph: &mut Vec<&str>) {
    if paragraph.is_empty() {
        return;
    }
    let text = paragraph.join(" ");
    push_tag(out, "p", &text);
    paragraph.clear();
}

fn flush_list(out: &mut String, items: &mut Vec<&str>) {
    if items.is_empty() {
        return;
    }
    out.push_str("<ul>\n");
    for item in items.iter() {
        push_tag(out, "li", item);
    }
    out.push_str("</ul>\n");
    items.clear();
}

fn push_tag(out: &mut String, tag: &str, inner: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&apply_inline(inner));
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}

fn apply_inline(text: &str) -> String {
    let code = replace_pairs(text, "`", "<code>", "</code>");
    let bold = replace_pairs(&code, "**", "<strong>", "</strong>");
    replace_pairs(&bold, "*", "<em>", "</em>")
}

// Greedy delimiter pairing; an unpaired trailing delimiter stays literal.
fn replace_pairs(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(start) = rest.find(delim) else {
            out.push_str(rest);
            return out;
        };
        let after = &rest[start + delim.len()..];
        let Some(end) = after.find(delim) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..start]);
        out.push_str(open);
        out.push_str(&after[..end]);
        out.push_str(close);
        rest = &after[end + delim.len()..];
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers() {
        assert_eq!(to_html("# Title"), "<h1>Title</h1>\n");
        assert_eq!(to_html("## Section"), "<h2>Section</h2>\n");
        assert_eq!(to_html("### Sub"), "<h3>Sub</h3>\n");
    }

    #[test]
    fn test_paragraph_break_on_double_newline() {
        assert_eq!(
            to_html("first block\n\nsecond block"),
            "<p>first block</p>\n<p>second block</p>\n"
        );
    }

    #[test]
    fn test_adjacent_lines_join_into_one_paragraph() {
        assert_eq!(to_html("line one\nline two"), "<p>line one line two</p>\n");
    }

    #[test]
    fn test_inline_styles() {
        assert_eq!(
            to_html("**bold** and *italic* and `code`"),
            "<p><strong>bold</strong> and <em>italic</em> and <code>code</code></p>\n"
        );
    }

    #[test]
    fn test_unpaired_delimiter_stays_literal() {
        assert_eq!(to_html("a * lone star"), "<p>a * lone star</p>\n");
    }

    #[test]
    fn test_list_items_group_into_one_list() {
        assert_eq!(
            to_html("- one\n- two\n\nafter"),
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n<p>after</p>\n"
        );
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(
            to_html("a <script> & \"quote\""),
            "<p>a &lt;script&gt; &amp; &quot;quote&quot;</p>\n"
        );
    }
}
