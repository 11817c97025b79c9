//! Numeric field parsing for Brazilian-formatted invoices.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Amount and value read from an energy billing line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnergyValues {
    /// Energy amount in kWh.
    pub amount: Option<Decimal>,
    /// Monetary value of the line.
    pub value: Option<Decimal>,
}

/// Parse a number written with a decimal comma (e.g. "1.234,56" or "0,95").
///
/// When a comma is present, dots are thousands separators. Plain integers and
/// dot-decimal numbers are accepted as-is.
pub fn parse_decimal_comma(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let normalized = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    };

    Decimal::from_str(&normalized).ok()
}

/// Read the kWh amount and value from the tokens of an energy line.
///
/// Column positions differ between the primary, SCEE and compensated lines, so
/// they are supplied by the caller. Each value is absent when its token is
/// missing or not numeric.
pub fn parse_energy_line(line: &str, amount_index: usize, value_index: usize) -> EnergyValues {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let column = |index: usize| tokens.get(index).and_then(|t| parse_decimal_comma(t));

    EnergyValues {
        amount: column(amount_index),
        value: column(value_index),
    }
}

/// Parse a monetary amount, ignoring the currency marker and whitespace.
pub fn parse_monetary(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    parse_decimal_comma(&cleaned)
}

/// The last whitespace-separated token that is a number.
pub fn last_numeric_token(s: &str) -> Option<Decimal> {
    s.split_whitespace().filter_map(parse_decimal_comma).last()
}

/// Format an amount in Brazilian style (1.234,56).
pub fn format_brl_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let Some((integer_part, decimal_part)) = s.split_once('.') else {
        return s;
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    if amount.is_sign_negative() && !amount.is_zero() {
        formatted.push('-');
    }

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{},{}", formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_decimal_comma("45,67"), Some(dec("45.67")));
        assert_eq!(parse_decimal_comma("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_decimal_comma("-125,00"), Some(dec("-125.00")));
        assert_eq!(parse_decimal_comma("123"), Some(dec("123")));
        assert_eq!(parse_decimal_comma("kWh"), None);
        assert_eq!(parse_decimal_comma("02/2024"), None);
        assert_eq!(parse_decimal_comma(""), None);
    }

    #[test]
    fn test_parse_energy_line_ignores_label() {
        for line in ["Energia 123 kWh 45,67 R$", "Consumo 123 kWh 45,67 R$", "x 123 kWh 45,67"] {
            let values = parse_energy_line(line, 1, 3);
            assert_eq!(values.amount, Some(dec("123")));
            assert_eq!(values.value, Some(dec("45.67")));
        }
    }

    #[test]
    fn test_parse_energy_line_custom_columns() {
        let values = parse_energy_line("kWh 0,60 250 150,00", 2, 3);
        assert_eq!(values.amount, Some(dec("250")));
        assert_eq!(values.value, Some(dec("150.00")));
    }

    #[test]
    fn test_parse_energy_line_out_of_range() {
        assert_eq!(parse_energy_line("kWh 100", 1, 3).value, None);
        assert_eq!(parse_energy_line("kWh 100", 1, 3).amount, Some(dec("100")));
        assert_eq!(parse_energy_line("", 1, 3), EnergyValues::default());
    }

    #[test]
    fn test_parse_monetary() {
        assert_eq!(parse_monetary("R$ 45,67"), Some(dec("45.67")));
        assert_eq!(parse_monetary(" 12,30 "), Some(dec("12.30")));
        assert_eq!(parse_monetary("R$ 1 234,56"), Some(dec("1234.56")));
        assert_eq!(parse_monetary(""), None);
        assert_eq!(parse_monetary("R$"), None);
    }

    #[test]
    fn test_last_numeric_token() {
        assert_eq!(last_numeric_token("por atraso 02/2024 5,32"), Some(dec("5.32")));
        assert_eq!(last_numeric_token("1,00 juros 2,50 R$"), Some(dec("2.50")));
        assert_eq!(last_numeric_token("sem valor"), None);
    }

    #[test]
    fn test_format_brl_amount() {
        assert_eq!(format_brl_amount(dec("1234.56")), "1.234,56");
        assert_eq!(format_brl_amount(dec("12345678.9")), "12.345.678,90");
        assert_eq!(format_brl_amount(dec("-125")), "-125,00");
        assert_eq!(format_brl_amount(dec("0.5")), "0,50");
    }
}
