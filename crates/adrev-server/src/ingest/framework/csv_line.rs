//! Line splitting for vendor CSV exports
//!
//! Vendor exports quote numbers that carry thousands separators (`"1,234"`).
//! Before a line is split on commas, every comma inside a quoted substring is
//! dropped along with the quote characters, so `a,"1,234",b` becomes
//! `a,1234,b` and the value keeps its column position.

/// Remove quotes, and commas that sit between quotes
pub fn normalize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => quoted = !quoted,
            ',' if quoted => {},
            _ => out.push(ch),
        }
    }

    out
}

/// Normalize then split on top-level commas, trimming each field
pub fn split_line(line: &str) -> Vec<String> {
    normalize_line(line)
        .split(',')
        .map(|field| field.trim().to_string())
        .collect()
}

/// Split file content into its header and the remaining non-blank lines
///
/// A leading UTF-8 byte order mark is dropped. Line numbers are 1-based.
pub fn header_and_rows(content: &str) -> Option<(&str, impl Iterator<Item = (usize, &str)>)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().enumerate();
    let (_, header) = lines.next()?;
    let rows = lines
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line));
    Some((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_thousands_separator() {
        assert_eq!(normalize_line(r#"Adrev,"1,234",5"#), "Adrev,1234,5");
        assert_eq!(
            split_line(r#"Adrev,"1,234",5"#),
            vec!["Adrev".to_string(), "1234".to_string(), "5".to_string()]
        );
    }

    #[test]
    fn test_multiple_quoted_fields_keep_positions() {
        let fields = split_line(r#"a,"12,345,678",b,"9,999.50",c"#);
        assert_eq!(fields, vec!["a", "12345678", "b", "9999.50", "c"]);
    }

    #[test]
    fn test_quoted_text_loses_its_commas() {
        assert_eq!(split_line(r#""Smith, Jones",x"#), vec!["Smith Jones", "x"]);
    }

    #[test]
    fn test_empty_fields_preserved() {
        assert_eq!(split_line("a,,c,"), vec!["a", "", "c", ""]);
    }

    #[test]
    fn test_header_and_rows_skips_blank_lines() {
        let content = "\u{feff}Organization,Plays\r\nAdrev,1\r\n\r\nAdrev,2\n";
        let (header, rows) = header_and_rows(content).unwrap();
        assert_eq!(header, "Organization,Plays");
        let rows: Vec<_> = rows.collect();
        assert_eq!(rows, vec![(2, "Adrev,1"), (4, "Adrev,2")]);
    }

    #[test]
    fn test_header_and_rows_empty_content() {
        assert!(header_and_rows("").is_none());
    }
}
