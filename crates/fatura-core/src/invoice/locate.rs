//! Label-anchored text search.
//!
//! Invoice renderers print a value either inline after its caption or on the
//! physical line below it. All lookups bind to the first occurrence of the
//! label in the document; later occurrences are never considered.

use regex::Regex;

/// Remainder of the line on which `label` first appears, trimmed.
pub fn value_on_line<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let start = text.find(label)? + label.len();
    Some(line_at(text, start))
}

/// The whole line following the line on which `label` first appears, trimmed.
///
/// Returns `None` when the label is absent or sits on the last line.
pub fn value_below<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let start = text.find(label)?;
    let next_line = start + text[start..].find('\n')? + 1;
    Some(line_at(text, next_line))
}

/// Text preceding the first occurrence of `label` on its line, trimmed.
///
/// Returns `None` when the label is absent or nothing precedes it.
pub fn value_above<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let pattern = Regex::new(&format!(r"(?m)^(.*?)[ \t]*{}", regex::escape(label))).ok()?;
    let prefix = pattern.captures(text)?.get(1)?.as_str().trim();
    (!prefix.is_empty()).then_some(prefix)
}

fn line_at(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    let end = rest.find('\n').unwrap_or(rest.len());
    rest[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Referente a Vencimento Total\nMAR/2024 10/04/2024 285,43\nCPF 123.456.789-00\nTOTAL 285,43 R$";

    #[test]
    fn test_value_on_line() {
        assert_eq!(value_on_line(TEXT, "CPF"), Some("123.456.789-00"));
        assert_eq!(value_on_line(TEXT, "R$"), Some(""));
        assert_eq!(value_on_line(TEXT, "CNPJ"), None);
    }

    #[test]
    fn test_value_on_line_last_line() {
        assert_eq!(value_on_line(TEXT, "TOTAL"), Some("285,43 R$"));
    }

    #[test]
    fn test_value_below() {
        assert_eq!(
            value_below(TEXT, "Referente a"),
            Some("MAR/2024 10/04/2024 285,43")
        );
        assert_eq!(value_below(TEXT, "Vencimento"), Some("MAR/2024 10/04/2024 285,43"));
        assert_eq!(value_below(TEXT, "TOTAL"), None);
        assert_eq!(value_below(TEXT, "Multa"), None);
    }

    #[test]
    fn test_value_below_handles_crlf() {
        let text = "Atual\r\n01/03 15/03 14 31/03\r\n";
        assert_eq!(value_below(text, "Atual"), Some("01/03 15/03 14 31/03"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "Multa\nprimeira\nMulta\nsegunda";
        assert_eq!(value_below(text, "Multa"), Some("primeira"));
        assert_eq!(value_on_line("Total 1\nTotal 2", "Total"), Some("1"));
    }

    #[test]
    fn test_value_above() {
        assert_eq!(value_above(TEXT, "285,43 R$"), Some("TOTAL"));
        assert_eq!(value_above(TEXT, "Vencimento"), Some("Referente a"));
        assert_eq!(value_above(TEXT, "CPF"), None);
        assert_eq!(value_above(TEXT, "(R$)"), None);
    }

    #[test]
    fn test_value_above_stays_on_label_line() {
        let text = "Vencimento 10/04/2024\nCPF 123.456.789-00";
        assert_eq!(value_above(text, "CPF"), None);
        assert_eq!(value_above("Vencimento\n\t CPF", "CPF"), None);
        assert_eq!(value_above("NOME\nJOSE \tCPF", "CPF"), Some("JOSE"));
    }
}
