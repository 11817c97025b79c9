//! Read-side views over stored invoices.
//!
//! Metrics are recomputed here on every call from the stored billing lines.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::invoice::rules::{month_abbreviation, month_number};
use crate::metrics::{derive_metrics, InvoiceMetrics};
use crate::models::invoice::InvoiceKey;
use crate::store::{StoredClient, StoredInvoice};

/// File name under which an invoice's source document is archived:
/// `{installation}-{MM}-{YYYY}.pdf`. None when the month is not a known
/// abbreviation.
pub fn document_file_name(key: &InvoiceKey) -> Option<String> {
    let month = month_number(&key.reference_month)?;
    Some(format!(
        "{}-{:02}-{}.pdf",
        key.installation_number, month, key.reference_year
    ))
}

/// Full path of an invoice's archived document inside `documents_dir`.
pub fn document_path(documents_dir: &Path, key: &InvoiceKey) -> Option<PathBuf> {
    document_file_name(key).map(|name| documents_dir.join(name))
}

/// Selection applied to report inputs. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub client_number: Option<String>,
    pub installation_number: Option<String>,
    pub reference_year: Option<String>,
}

impl ReportFilter {
    fn matches(&self, invoice: &StoredInvoice, client: Option<&StoredClient>) -> bool {
        let client_ok = match &self.client_number {
            Some(number) => client.is_some_and(|c| &c.identity.client_number == number),
            None => true,
        };
        let installation_ok = self
            .installation_number
            .as_ref()
            .is_none_or(|n| n == &invoice.data.installation_number);
        let year_ok = self
            .reference_year
            .as_ref()
            .is_none_or(|y| y == &invoice.data.reference_year);

        client_ok && installation_ok && year_ok
    }
}

/// One row of the invoice listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDisplay {
    #[serde(flatten)]
    pub invoice: StoredInvoice,

    /// Absent when the primary energy line was not extracted.
    #[serde(flatten)]
    pub metrics: Option<InvoiceMetrics>,

    pub client_number: String,
    pub client_name: String,
    pub document_file: Option<String>,
    pub document_available: bool,
}

fn client_index(clients: &[StoredClient]) -> HashMap<Uuid, &StoredClient> {
    clients.iter().map(|c| (c.id, c)).collect()
}

fn metrics_or_warn(invoice: &StoredInvoice) -> Option<InvoiceMetrics> {
    match derive_metrics(invoice) {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!(key = %invoice.data.key(), "cannot derive metrics: {}", e);
            None
        }
    }
}

/// Build listing rows, checking each document against `documents_dir`.
pub fn display_rows(
    invoices: &[StoredInvoice],
    clients: &[StoredClient],
    documents_dir: Option<&Path>,
    filter: &ReportFilter,
) -> Vec<InvoiceDisplay> {
    let clients = client_index(clients);

    invoices
        .iter()
        .filter_map(|invoice| {
            let client = clients.get(&invoice.client_id).copied();
            if !filter.matches(invoice, client) {
                return None;
            }

            let document_file = document_file_name(&invoice.data.key());
            let document_available = match (documents_dir, &document_file) {
                (Some(dir), Some(name)) => dir.join(name).is_file(),
                _ => false,
            };

            Some(InvoiceDisplay {
                invoice: invoice.clone(),
                metrics: metrics_or_warn(invoice),
                client_number: client
                    .map(|c| c.identity.client_number.clone())
                    .unwrap_or_default(),
                client_name: client.map(|c| c.identity.name.clone()).unwrap_or_default(),
                document_file,
                document_available,
            })
        })
        .collect()
}

/// Aggregates for one reference month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    pub reference_year: String,
    pub reference_month: String,
    pub invoice_count: usize,
    pub consumption_kwh: Decimal,
    pub compensated_energy_kwh: Decimal,
    #[serde(rename = "totalWithoutGD")]
    pub total_without_gd: Decimal,
    #[serde(rename = "economyGD")]
    pub economy_gd: Decimal,
    pub total_value: Decimal,
}

/// Sum metrics and amounts per reference month, oldest month first.
///
/// Invoices whose metrics cannot be derived still count and add their total
/// value.
pub fn monthly_totals(
    invoices: &[StoredInvoice],
    clients: &[StoredClient],
    filter: &ReportFilter,
) -> Vec<MonthlyTotals> {
    let clients = client_index(clients);
    let mut months: BTreeMap<(i32, u32), (String, String, usize, InvoiceMetrics, Decimal)> =
        BTreeMap::new();

    for invoice in invoices {
        let client = clients.get(&invoice.client_id).copied();
        if !filter.matches(invoice, client) {
            continue;
        }

        let data = &invoice.data;
        let year = data.reference_year.trim().parse().unwrap_or(0);
        let month = month_number(&data.reference_month).unwrap_or(0);
        let label = month_abbreviation(month)
            .map(str::to_string)
            .unwrap_or_else(|| data.reference_month.clone());

        let entry = months.entry((year, month)).or_insert_with(|| {
            (
                data.reference_year.clone(),
                label,
                0,
                InvoiceMetrics::ZERO,
                Decimal::ZERO,
            )
        });
        entry.2 += 1;
        if let Some(metrics) = metrics_or_warn(invoice) {
            entry.3.accumulate(&metrics);
        }
        entry.4 += data.total_value;
    }

    months
        .into_values()
        .map(
            |(reference_year, reference_month, invoice_count, metrics, total_value)| {
                MonthlyTotals {
                    reference_year,
                    reference_month,
                    invoice_count,
                    consumption_kwh: metrics.consumption_kwh,
                    compensated_energy_kwh: metrics.compensated_energy_kwh,
                    total_without_gd: metrics.total_without_gd,
                    economy_gd: metrics.economy_gd,
                    total_value,
                }
            },
        )
        .collect()
}
