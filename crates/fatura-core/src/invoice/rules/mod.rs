//! Rule-based field parsers for electricity invoices.

pub mod address;
pub mod dates;
pub mod numbers;
pub mod patterns;
pub mod text;

pub use address::{split_street_line, split_zip_city_state, AddressParser};
pub use dates::{
    month_abbreviation, month_number, parse_day_month, parse_full_date, parse_reading_dates,
    parse_reading_dates_in_year, ReadingDates,
};
pub use numbers::{
    format_brl_amount, last_numeric_token, parse_decimal_comma, parse_energy_line,
    parse_monetary, EnergyValues,
};
pub use text::{first_word, separate_words};
