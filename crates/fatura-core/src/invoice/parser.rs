//! Label-anchored invoice parser.

use std::time::Instant;

use chrono::{Datelike, Local};
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::{EnergyColumns, ExtractionConfig};
use crate::models::invoice::{InvoiceBuilder, InvoiceRecord};

use super::locate::{value_below, value_on_line};
use super::rules::{
    first_word, last_numeric_token, parse_decimal_comma, parse_energy_line, parse_full_date,
    parse_monetary, parse_reading_dates_in_year, separate_words, AddressParser, EnergyValues,
};
use super::{InvoiceExtractor, Result};

/// Result of invoice extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted invoice data.
    pub invoice: InvoiceRecord,
    /// Layout problems noticed while extracting.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for invoice parsing.
pub trait InvoiceParser {
    /// Parse invoice from text, reporting why a document was rejected.
    fn parse(&self, text: &str) -> Result<ExtractionResult>;
}

/// Extracts invoice fields by searching for the captions printed on the bill.
#[derive(Debug, Clone)]
pub struct InvoiceFieldExtractor {
    config: ExtractionConfig,
    address: AddressParser,
    /// Year used for the year-less reading dates; the current year when unset.
    reading_year: Option<i32>,
}

impl InvoiceFieldExtractor {
    /// Create an extractor with the default labels.
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    /// Create an extractor with custom labels.
    pub fn with_config(config: ExtractionConfig) -> Self {
        let address = AddressParser::with_keywords(config.address_keywords.clone());
        Self {
            config,
            address,
            reading_year: None,
        }
    }

    /// Resolve reading dates in a fixed year instead of the current one.
    pub fn with_reading_year(mut self, year: i32) -> Self {
        self.reading_year = Some(year);
        self
    }

    fn extract_numbers(&self, text: &str, invoice: &mut InvoiceBuilder) {
        let line = value_below(text, &self.config.installation_label).unwrap_or("");
        let mut tokens = line.split_whitespace();

        invoice.installation_number = tokens.next().map(str::to_string);
        invoice.client.client_number = tokens.next().unwrap_or("").to_string();
    }

    fn extract_header(&self, text: &str, invoice: &mut InvoiceBuilder, warnings: &mut Vec<String>) {
        let header = value_below(text, &self.config.reference_label).unwrap_or("");
        let parts: Vec<&str> = header.split_whitespace().collect();

        let [reference, due_date, total] = parts.as_slice() else {
            warn!(tokens = ?parts, "unexpected reference header format");
            warnings.push(format!(
                "Expected 3 tokens in reference header, found {}: {:?}",
                parts.len(),
                header
            ));
            return;
        };

        let mut reference = reference.split('/');
        invoice.reference_month = reference.next().map(str::to_string);
        invoice.reference_year = reference.next().map(str::to_string);
        invoice.expiration_date = parse_full_date(due_date);
        invoice.total_value = parse_decimal_comma(total);
    }

    fn extract_class(&self, text: &str) -> String {
        let first_line = value_below(text, &self.config.class_label).unwrap_or("");
        let second_line = if first_line.is_empty() {
            ""
        } else {
            value_below(text, first_line).unwrap_or("")
        };

        format!(
            "{} {}",
            first_word(&separate_words(first_line)),
            first_word(&separate_words(second_line))
        )
        .trim()
        .to_string()
    }

    fn energy_line(&self, text: &str, label: &str, columns: EnergyColumns) -> EnergyValues {
        value_on_line(text, label)
            .map(|line| parse_energy_line(line, columns.amount, columns.value))
            .unwrap_or_default()
    }

    fn extract_energy(&self, text: &str, invoice: &mut InvoiceBuilder, warnings: &mut Vec<String>) {
        let primary = self.energy_line(text, &self.config.energy_label, self.config.energy_columns);
        if primary == EnergyValues::default() {
            warn!(label = %self.config.energy_label, "primary energy line not found");
            warnings.push("Could not extract primary energy line".to_string());
        }
        let scee = self.energy_line(text, &self.config.scee_label, self.config.scee_columns);
        let compensated = self.energy_line(
            text,
            &self.config.compensated_label,
            self.config.compensated_columns,
        );

        invoice.energy_amount_kwh = primary.amount;
        invoice.energy_value = primary.value;
        invoice.energy_scee_kwh = scee.amount;
        invoice.energy_scee_value = scee.value;
        invoice.compensated_gdi_kwh = compensated.amount;
        invoice.compensated_gdi_value = compensated.value;
    }

    fn extract_charges(&self, text: &str, invoice: &mut InvoiceBuilder) {
        invoice.public_lighting_value =
            value_on_line(text, &self.config.public_lighting_label).and_then(parse_monetary);

        // The fee caption continues with varying text, so take the last number.
        invoice.fine_for_delay =
            value_on_line(text, &self.config.fine_label).and_then(last_numeric_token);
    }

    fn extract_reading_dates(
        &self,
        text: &str,
        invoice: &mut InvoiceBuilder,
        warnings: &mut Vec<String>,
    ) {
        let year = self.reading_year.unwrap_or_else(|| Local::now().year());
        let dates = value_below(text, &self.config.reading_label)
            .and_then(|line| parse_reading_dates_in_year(line, year));

        match dates {
            Some(dates) => {
                invoice.last_reading_date = dates.last_reading;
                invoice.reading_date = dates.reading;
                invoice.days_to_read = Some(dates.days_to_read);
                invoice.next_reading_date = dates.next_reading;
            }
            None => {
                warn!("reading dates not found");
                warnings.push("Could not extract reading dates".to_string());
            }
        }
    }

    fn extract_holder(&self, text: &str, invoice: &mut InvoiceBuilder, warnings: &mut Vec<String>) {
        match self.address.parse(text) {
            Some(address) => invoice.address = address,
            None => {
                warn!("address line not found");
                warnings.push("Could not extract address".to_string());
            }
        }

        invoice.client.name = self
            .address
            .name_above_address(text)
            .unwrap_or("")
            .to_string();

        invoice.client.cpf_cnpj = value_on_line(text, &self.config.cpf_label)
            .or_else(|| value_on_line(text, &self.config.cnpj_label))
            .unwrap_or("")
            .to_string();
    }
}

impl Default for InvoiceFieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for InvoiceFieldExtractor {
    fn parse(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();
        if text.trim().is_empty() {
            return Err(ExtractionError::NoData);
        }

        info!("Parsing invoice from {} characters of text", text.len());

        let mut warnings = Vec::new();
        let mut invoice = InvoiceBuilder::new();

        self.extract_numbers(text, &mut invoice);
        self.extract_header(text, &mut invoice, &mut warnings);
        invoice.class_name = self.extract_class(text);
        self.extract_energy(text, &mut invoice, &mut warnings);
        self.extract_charges(text, &mut invoice);
        self.extract_reading_dates(text, &mut invoice, &mut warnings);
        self.extract_holder(text, &mut invoice, &mut warnings);

        debug!(?invoice, "assembled invoice fields");

        let invoice = invoice.build()?;

        Ok(ExtractionResult {
            invoice,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl InvoiceExtractor for InvoiceFieldExtractor {
    fn extract(&self, text: &str) -> Option<InvoiceRecord> {
        match self.parse(text) {
            Ok(result) => {
                debug!(
                    key = %result.invoice.key(),
                    warnings = result.warnings.len(),
                    "extracted invoice"
                );
                Some(result.invoice)
            }
            Err(e) => {
                warn!(error = %e, "discarding invoice text");
                None
            }
        }
    }
}
