/// Counts logical lines the same way for tree display and bundle totals.
///
/// `\r\n` and lone `\r` are treated as `\n`. Empty text has zero lines,
/// otherwise the count is one more than the number of line breaks, so a
/// trailing newline opens a final (empty) line.
pub fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let bytes = text.as_bytes();
    let mut breaks = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => breaks += 1,
            b'\r' => {
                breaks += 1;
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    breaks + 1
}

#[cfg(test)]
mod tests {
    use super::count_lines;

    #[test]
    fn empty_text_has_no_lines() {
        assert_eq!(count_lines(""), 0);
    }

    #[test]
    fn trailing_newline_counts_as_a_line() {
        assert_eq!(count_lines("a\nb\n"), 3);
        assert_eq!(count_lines("single"), 1);
        assert_eq!(count_lines("\n"), 2);
    }

    #[test]
    fn line_endings_are_normalized() {
        assert_eq!(count_lines("a\r\nb"), 2);
        assert_eq!(count_lines("a\rb\rc"), 3);
        assert_eq!(count_lines("a\r\n\r\nb"), 3);
        assert_eq!(count_lines("a\n\rb"), 3);
    }
}
