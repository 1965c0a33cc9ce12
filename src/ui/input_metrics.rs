use unicode_width::UnicodeWidthChar;

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

pub fn truncate_to_display_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > max_width && used > 0 {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

pub fn clamp_to_char_boundary_left(input: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(input.len());
    while cursor > 0 && !input.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width_counts_wide_chars() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("株価"), 4);
    }

    #[test]
    fn test_truncate_respects_display_width() {
        assert_eq!(truncate_to_display_width("abcdef", 3), "abc");
        assert_eq!(truncate_to_display_width("株価", 3), "株");
    }

    #[test]
    fn test_clamp_lands_on_char_boundary() {
        let text = "a株b";
        assert_eq!(clamp_to_char_boundary_left(text, 2), 1);
        assert_eq!(clamp_to_char_boundary_left(text, 99), text.len());
    }
}
