//! Consumption and financial metrics derived from an invoice.
//!
//! Metrics are never stored; callers recompute them on every read.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::models::invoice::InvoiceData;
use crate::store::StoredInvoice;

/// Aggregates derived from the billing lines of one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMetrics {
    /// Primary plus SCEE energy, in kWh.
    pub consumption_kwh: Decimal,

    /// What the bill would cost without distributed generation credit.
    #[serde(rename = "totalWithoutGD")]
    pub total_without_gd: Decimal,

    /// Energy compensated by distributed generation, in kWh.
    pub compensated_energy_kwh: Decimal,

    /// Value credited by distributed generation.
    #[serde(rename = "economyGD")]
    pub economy_gd: Decimal,
}

impl InvoiceMetrics {
    /// Zero metrics, the identity for [`InvoiceMetrics::accumulate`].
    pub const ZERO: Self = Self {
        consumption_kwh: Decimal::ZERO,
        total_without_gd: Decimal::ZERO,
        compensated_energy_kwh: Decimal::ZERO,
        economy_gd: Decimal::ZERO,
    };

    /// Add another invoice's metrics to these.
    pub fn accumulate(&mut self, other: &InvoiceMetrics) {
        self.consumption_kwh += other.consumption_kwh;
        self.total_without_gd += other.total_without_gd;
        self.compensated_energy_kwh += other.compensated_energy_kwh;
        self.economy_gd += other.economy_gd;
    }
}

/// Derive metrics from an invoice's billing lines.
///
/// Absent optional lines count as zero. The primary energy amount and value
/// come from a mandatory billing line and must be present.
pub fn derive_metrics<T: AsRef<InvoiceData> + ?Sized>(
    invoice: &T,
) -> Result<InvoiceMetrics, MetricsError> {
    let data = invoice.as_ref();
    let energy_kwh = data
        .energy_amount_kwh
        .ok_or(MetricsError::MissingField("energyAmountKwh"))?;
    let energy_value = data
        .energy_value
        .ok_or(MetricsError::MissingField("energyValue"))?;

    let or_zero = |v: Option<Decimal>| v.unwrap_or(Decimal::ZERO);

    Ok(InvoiceMetrics {
        consumption_kwh: round(energy_kwh + or_zero(data.energy_scee_kwh)),
        total_without_gd: round(
            energy_value + or_zero(data.energy_scee_value) + or_zero(data.public_lighting_value),
        ),
        compensated_energy_kwh: round(or_zero(data.compensated_gdi_kwh)),
        economy_gd: round(or_zero(data.compensated_gdi_value)),
    })
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A stored invoice together with its derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedInvoice {
    #[serde(flatten)]
    pub invoice: StoredInvoice,

    #[serde(flatten)]
    pub metrics: InvoiceMetrics,
}

impl EnrichedInvoice {
    /// Compute metrics for a stored invoice.
    pub fn new(invoice: StoredInvoice) -> Result<Self, MetricsError> {
        let metrics = derive_metrics(&invoice)?;
        Ok(Self { invoice, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn invoice() -> InvoiceData {
        InvoiceData {
            installation_number: "3001116735".to_string(),
            reference_month: "MAR".to_string(),
            reference_year: "2024".to_string(),
            expiration_date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
            total_value: dec("285.43"),
            class_name: "Residencial Convencional".to_string(),
            energy_amount_kwh: Some(dec("100")),
            energy_value: Some(dec("95.00")),
            energy_scee_kwh: Some(dec("250")),
            energy_scee_value: Some(dec("150.00")),
            compensated_gdi_kwh: Some(dec("250")),
            compensated_gdi_value: Some(dec("-125.00")),
            public_lighting_value: Some(dec("45.67")),
            fine_for_delay: None,
            last_reading_date: None,
            reading_date: None,
            next_reading_date: None,
            days_to_read: Some(14),
        }
    }

    #[test]
    fn test_derive_metrics() {
        let metrics = derive_metrics(&invoice()).unwrap();

        assert_eq!(metrics.consumption_kwh, dec("350"));
        assert_eq!(metrics.total_without_gd, dec("290.67"));
        assert_eq!(metrics.compensated_energy_kwh, dec("250"));
        assert_eq!(metrics.economy_gd, dec("-125.00"));
    }

    #[test]
    fn test_absent_optionals_count_as_zero() {
        let mut data = invoice();
        data.energy_scee_kwh = None;
        data.energy_scee_value = None;
        data.compensated_gdi_kwh = None;
        data.compensated_gdi_value = None;
        data.public_lighting_value = None;

        let metrics = derive_metrics(&data).unwrap();
        assert_eq!(metrics.consumption_kwh, dec("100"));
        assert_eq!(metrics.total_without_gd, dec("95"));
        assert_eq!(metrics.compensated_energy_kwh, Decimal::ZERO);
        assert_eq!(metrics.economy_gd, Decimal::ZERO);
        assert_eq!(data.energy_scee_kwh, None);
    }

    #[test]
    fn test_derive_is_pure() {
        let data = invoice();
        let before = data.clone();
        assert_eq!(derive_metrics(&data), derive_metrics(&data));
        assert_eq!(data, before);
    }

    #[test]
    fn test_missing_primary_line() {
        let mut data = invoice();
        data.energy_value = None;
        assert_eq!(
            derive_metrics(&data),
            Err(MetricsError::MissingField("energyValue"))
        );

        data.energy_amount_kwh = None;
        assert_eq!(
            derive_metrics(&data),
            Err(MetricsError::MissingField("energyAmountKwh"))
        );
    }

    #[test]
    fn test_rounding() {
        let mut data = invoice();
        data.energy_amount_kwh = Some(dec("100.005"));
        data.energy_scee_kwh = None;
        assert_eq!(derive_metrics(&data).unwrap().consumption_kwh, dec("100.01"));
    }

    #[test]
    fn test_enriched_serialization() {
        let stored = StoredInvoice {
            id: uuid::Uuid::nil(),
            client_id: uuid::Uuid::nil(),
            data: invoice(),
        };
        let enriched = EnrichedInvoice::new(stored).unwrap();
        let json = serde_json::to_value(&enriched).unwrap();

        assert_eq!(json["installationNumber"], "3001116735");
        assert_eq!(json["totalWithoutGD"], "290.67");
        assert_eq!(json["economyGD"], "-125.00");
    }
}
