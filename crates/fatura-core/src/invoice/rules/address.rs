//! Service address and account holder name extraction.
//!
//! The address block follows one known invoice layout:
//!
//! ```text
//! JOSE DA SILVA                 <- holder name
//! RUA DAS FLORES 123 APTO 4     <- street line, starts with a keyword
//! CENTRO                        <- district
//! 38400-000 UBERLANDIA, MG      <- zip and city, state after the comma
//! ```
//!
//! Deviations from this layout produce wrong values rather than errors.

use tracing::debug;

use crate::models::invoice::RawAddress;

/// Prefixes of a street address line.
pub const DEFAULT_ADDRESS_KEYWORDS: [&str; 7] =
    ["RUA", "AV ", "PC ", "TRAVESSA", "ALAMEDA", "LARGO", "PRAÇA"];

/// Locates the address block by its street keyword.
#[derive(Debug, Clone)]
pub struct AddressParser {
    keywords: Vec<String>,
}

impl AddressParser {
    /// Create a parser with the default keyword set.
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_ADDRESS_KEYWORDS)
    }

    /// Create a parser with custom street keywords.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    fn is_address_line(&self, line: &str) -> bool {
        self.keywords.iter().any(|k| line.starts_with(k.as_str()))
    }

    fn address_line_index(&self, lines: &[&str]) -> Option<usize> {
        lines.iter().position(|l| self.is_address_line(l.trim()))
    }

    /// First line starting with a street keyword, trimmed.
    pub fn locate_address_line<'a>(&self, text: &'a str) -> Option<&'a str> {
        let lines: Vec<&str> = text.split('\n').collect();
        self.address_line_index(&lines).map(|i| lines[i].trim())
    }

    /// The line immediately above the address line, trimmed.
    pub fn name_above_address<'a>(&self, text: &'a str) -> Option<&'a str> {
        let lines: Vec<&str> = text.split('\n').collect();
        let index = self.address_line_index(&lines)?;
        index.checked_sub(1).map(|i| lines[i].trim())
    }

    /// Decompose the whole address block.
    pub fn parse(&self, text: &str) -> Option<RawAddress> {
        let lines: Vec<&str> = text.split('\n').collect();
        let index = self.address_line_index(&lines)?;
        let line_after = |offset: usize| lines.get(index + offset).map(|l| l.trim()).unwrap_or("");

        let (street, number, complement) = split_street_line(lines[index].trim());
        let district = line_after(1).to_string();
        let (zip_code, city, state) = split_zip_city_state(line_after(2));

        debug!(%street, %number, %district, %city, %state, "parsed address block");

        Some(RawAddress {
            street,
            number,
            complement,
            district,
            city,
            state,
            zip_code,
        })
    }
}

impl Default for AddressParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a street line into street, house number and complement.
///
/// The first all-digit token is the house number; tokens before it form the
/// street and tokens after it the complement. Without a number the whole line
/// is the street.
pub fn split_street_line(line: &str) -> (String, String, Option<String>) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(position) = tokens.iter().position(|t| is_house_number(t)) else {
        return (tokens.join(" "), String::new(), None);
    };

    let street = tokens[..position].join(" ");
    let complement = tokens[position + 1..].join(" ");
    let complement = (!complement.is_empty()).then_some(complement);

    (street, tokens[position].to_string(), complement)
}

/// Split `ZIP CITY, STATE` into its parts.
pub fn split_zip_city_state(line: &str) -> (String, String, String) {
    let (zip_city, state_part) = line.split_once(',').unwrap_or((line, ""));

    let mut tokens = zip_city.split_whitespace();
    let zip_code = tokens.next().unwrap_or("").to_string();
    let city = tokens.collect::<Vec<_>>().join(" ");
    let state = state_part.split_whitespace().last().unwrap_or("").to_string();

    (zip_code, city, state)
}

fn is_house_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}
