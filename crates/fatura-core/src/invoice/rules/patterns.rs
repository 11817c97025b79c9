//! Common regex patterns for invoice field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Previous reading, current reading, days between readings: "01/03 15/03 14"
    pub static ref READING_DATES: Regex = Regex::new(
        r"(\d{2}/\d{2})\s*(\d{2}/\d{2})\s*(\d{1,2})"
    ).unwrap();

    // Day and month without a year: "31/03"
    pub static ref DAY_MONTH: Regex = Regex::new(
        r"^(\d{1,2})/(\d{1,2})$"
    ).unwrap();

    // Run of letters in any script
    pub static ref LETTERS: Regex = Regex::new(
        r"\p{L}+"
    ).unwrap();
}
