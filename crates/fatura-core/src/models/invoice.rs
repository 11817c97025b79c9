//! Electricity invoice data models.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Service address printed on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    /// Street name, without the house number.
    pub street: String,

    /// House number, numeric or empty.
    pub number: String,

    /// Apartment, block and similar trailing tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,

    /// District (bairro).
    pub district: String,

    /// City name.
    pub city: String,

    /// State abbreviation (UF).
    pub state: String,

    /// Postal code (CEP).
    pub zip_code: String,
}

/// Account holder identification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    /// Utility client number, unique per account holder.
    pub client_number: String,

    /// Holder name.
    pub name: String,

    /// CPF or CNPJ, empty when neither label is present.
    pub cpf_cnpj: String,
}

/// Identity of an invoice for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceKey {
    pub reference_month: String,
    pub reference_year: String,
    pub installation_number: String,
}

impl fmt::Display for InvoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}",
            self.reference_month, self.reference_year, self.installation_number
        )
    }
}

/// Billing fields of an invoice, shared by extracted and stored invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    /// Installation (consumer unit) number.
    pub installation_number: String,

    /// Three-letter uppercase month abbreviation (e.g. `MAR`).
    pub reference_month: String,

    /// Four-digit reference year.
    pub reference_year: String,

    /// Payment due date.
    pub expiration_date: NaiveDate,

    /// Amount to pay.
    pub total_value: Decimal,

    /// Tariff class, two words (e.g. `Residencial Convencional`).
    #[serde(rename = "class")]
    pub class_name: String,

    /// Primary energy line amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_amount_kwh: Option<Decimal>,

    /// Primary energy line value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_value: Option<Decimal>,

    /// SCEE (compensation system) energy amount.
    #[serde(rename = "energySCEEEKwh", skip_serializing_if = "Option::is_none")]
    pub energy_scee_kwh: Option<Decimal>,

    /// SCEE energy value.
    #[serde(rename = "energySCEEValue", skip_serializing_if = "Option::is_none")]
    pub energy_scee_value: Option<Decimal>,

    /// Energy compensated by distributed generation.
    #[serde(rename = "compensatedGDIKwh", skip_serializing_if = "Option::is_none")]
    pub compensated_gdi_kwh: Option<Decimal>,

    /// Value of the distributed generation compensation.
    #[serde(rename = "compensatedGDIValue", skip_serializing_if = "Option::is_none")]
    pub compensated_gdi_value: Option<Decimal>,

    /// Municipal public lighting contribution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_lighting_value: Option<Decimal>,

    /// Late payment fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fine_for_delay: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reading_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_reading_date: Option<NaiveDate>,

    /// Days between the previous and the current meter reading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_to_read: Option<u32>,
}

impl InvoiceData {
    /// Deduplication key of this invoice.
    pub fn key(&self) -> InvoiceKey {
        InvoiceKey {
            reference_month: self.reference_month.clone(),
            reference_year: self.reference_year.clone(),
            installation_number: self.installation_number.clone(),
        }
    }
}

impl AsRef<InvoiceData> for InvoiceData {
    fn as_ref(&self) -> &InvoiceData {
        self
    }
}

/// A validated invoice extracted from one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Billing fields.
    #[serde(flatten)]
    pub data: InvoiceData,

    /// Account holder.
    pub client: ClientIdentity,

    /// Service address.
    pub address: RawAddress,
}

impl InvoiceRecord {
    /// Deduplication key of this invoice.
    pub fn key(&self) -> InvoiceKey {
        self.data.key()
    }
}

impl AsRef<InvoiceData> for InvoiceRecord {
    fn as_ref(&self) -> &InvoiceData {
        &self.data
    }
}

/// Accumulates extracted fields before the record is validated.
///
/// Every field starts out absent. [`InvoiceBuilder::build`] is the only way to
/// obtain an [`InvoiceRecord`] and rejects builders missing any of the
/// installation number, client number, reference month/year, due date or
/// total value.
#[derive(Debug, Clone, Default)]
pub struct InvoiceBuilder {
    pub installation_number: Option<String>,
    pub reference_month: Option<String>,
    pub reference_year: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub total_value: Option<Decimal>,
    pub class_name: String,
    pub energy_amount_kwh: Option<Decimal>,
    pub energy_value: Option<Decimal>,
    pub energy_scee_kwh: Option<Decimal>,
    pub energy_scee_value: Option<Decimal>,
    pub compensated_gdi_kwh: Option<Decimal>,
    pub compensated_gdi_value: Option<Decimal>,
    pub public_lighting_value: Option<Decimal>,
    pub fine_for_delay: Option<Decimal>,
    pub last_reading_date: Option<NaiveDate>,
    pub reading_date: Option<NaiveDate>,
    pub next_reading_date: Option<NaiveDate>,
    pub days_to_read: Option<u32>,
    pub client: ClientIdentity,
    pub address: RawAddress,
}

impl InvoiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate mandatory fields and produce the immutable record.
    pub fn build(self) -> Result<InvoiceRecord, ExtractionError> {
        let installation_number =
            non_empty(self.installation_number)
                .ok_or(ExtractionError::MissingField("installationNumber"))?;
        if self.client.client_number.is_empty() {
            return Err(ExtractionError::MissingField("client.clientNumber"));
        }
        let reference_month =
            non_empty(self.reference_month).ok_or(ExtractionError::MissingField("referenceMonth"))?;
        let reference_year =
            non_empty(self.reference_year).ok_or(ExtractionError::MissingField("referenceYear"))?;
        let expiration_date = self
            .expiration_date
            .ok_or(ExtractionError::MissingField("expirationDate"))?;
        let total_value = self
            .total_value
            .ok_or(ExtractionError::MissingField("totalValue"))?;

        Ok(InvoiceRecord {
            data: InvoiceData {
                installation_number,
                reference_month,
                reference_year,
                expiration_date,
                total_value,
                class_name: self.class_name,
                energy_amount_kwh: self.energy_amount_kwh,
                energy_value: self.energy_value,
                energy_scee_kwh: self.energy_scee_kwh,
                energy_scee_value: self.energy_scee_value,
                compensated_gdi_kwh: self.compensated_gdi_kwh,
                compensated_gdi_value: self.compensated_gdi_value,
                public_lighting_value: self.public_lighting_value,
                fine_for_delay: self.fine_for_delay,
                last_reading_date: self.last_reading_date,
                reading_date: self.reading_date,
                next_reading_date: self.next_reading_date,
                days_to_read: self.days_to_read,
            },
            client: self.client,
            address: self.address,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
