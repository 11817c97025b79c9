//! Report command - listings and monthly totals over stored invoices.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use rust_decimal::Decimal;

use fatura_core::invoice::rules::format_brl_amount;
use fatura_core::reporting::{
    display_rows, monthly_totals, InvoiceDisplay, MonthlyTotals, ReportFilter,
};
use fatura_core::{InvoiceStore, MemoryStore};

use super::{load_config, OutputFormat};

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    command: ReportCommand,

    /// Store snapshot file (default: from config)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Only invoices of this client number
    #[arg(long, global = true)]
    client: Option<String>,

    /// Only invoices of this installation number
    #[arg(long, global = true)]
    installation: Option<String>,

    /// Only invoices of this reference year
    #[arg(long, global = true)]
    year: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum ReportCommand {
    /// List invoices with their metrics and document availability
    List {
        /// Documents directory (default: from config)
        #[arg(long)]
        documents_dir: Option<PathBuf>,
    },

    /// Totals per reference month
    Monthly,
}

pub async fn run(args: ReportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store_path = args.store.unwrap_or(config.storage.store_path);
    if !store_path.exists() {
        anyhow::bail!("Store not found: {}", store_path.display());
    }

    let store = MemoryStore::open(&store_path)?;
    let invoices = store.list_invoices().await?;
    let clients = store.list_clients().await?;

    let filter = ReportFilter {
        client_number: args.client,
        installation_number: args.installation,
        reference_year: args.year,
    };

    let output = match args.command {
        ReportCommand::List { documents_dir } => {
            let documents_dir = documents_dir.unwrap_or(config.storage.documents_dir);
            let rows = display_rows(&invoices, &clients, Some(&documents_dir), &filter);
            match args.format {
                OutputFormat::Json => serde_json::to_string_pretty(&rows)?,
                OutputFormat::Csv => list_csv(&rows)?,
                OutputFormat::Text => list_text(&rows),
            }
        }
        ReportCommand::Monthly => {
            let totals = monthly_totals(&invoices, &clients, &filter);
            match args.format {
                OutputFormat::Json => serde_json::to_string_pretty(&totals)?,
                OutputFormat::Csv => monthly_csv(&totals)?,
                OutputFormat::Text => monthly_text(&totals),
            }
        }
    };

    println!("{}", output);
    Ok(())
}

fn opt(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn list_csv(rows: &[InvoiceDisplay]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "client_number",
        "client_name",
        "installation_number",
        "reference_month",
        "reference_year",
        "expiration_date",
        "total_value",
        "consumption_kwh",
        "compensated_energy_kwh",
        "total_without_gd",
        "economy_gd",
        "document_file",
        "document_available",
    ])?;

    for row in rows {
        let data = &row.invoice.data;
        wtr.write_record([
            row.client_number.clone(),
            row.client_name.clone(),
            data.installation_number.clone(),
            data.reference_month.clone(),
            data.reference_year.clone(),
            data.expiration_date.to_string(),
            data.total_value.to_string(),
            opt(row.metrics.map(|m| m.consumption_kwh)),
            opt(row.metrics.map(|m| m.compensated_energy_kwh)),
            opt(row.metrics.map(|m| m.total_without_gd)),
            opt(row.metrics.map(|m| m.economy_gd)),
            row.document_file.clone().unwrap_or_default(),
            row.document_available.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn list_text(rows: &[InvoiceDisplay]) -> String {
    if rows.is_empty() {
        return format!("{} No invoices stored", style("ℹ").blue());
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<24} {:<12} {:<9} {:>10} {:>12} {:>12}  {}\n",
        "Client", "Name", "Installation", "Ref", "kWh", "Total R$", "Economy R$", "PDF"
    ));

    for row in rows {
        let data = &row.invoice.data;
        let consumption = row
            .metrics
            .map(|m| m.consumption_kwh.to_string())
            .unwrap_or_else(|| "-".to_string());
        let economy = row
            .metrics
            .map(|m| format_brl_amount(m.economy_gd))
            .unwrap_or_else(|| "-".to_string());
        let document = if row.document_available {
            style("yes").green().to_string()
        } else {
            style("no").dim().to_string()
        };

        output.push_str(&format!(
            "{:<12} {:<24} {:<12} {:<9} {:>10} {:>12} {:>12}  {}\n",
            row.client_number,
            truncate(&row.client_name, 24),
            data.installation_number,
            format!("{}/{}", data.reference_month, data.reference_year),
            consumption,
            format_brl_amount(data.total_value),
            economy,
            document
        ));
    }

    output
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn monthly_csv(totals: &[MonthlyTotals]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "reference_year",
        "reference_month",
        "invoice_count",
        "consumption_kwh",
        "compensated_energy_kwh",
        "total_without_gd",
        "economy_gd",
        "total_value",
    ])?;

    for month in totals {
        wtr.write_record([
            month.reference_year.clone(),
            month.reference_month.clone(),
            month.invoice_count.to_string(),
            month.consumption_kwh.to_string(),
            month.compensated_energy_kwh.to_string(),
            month.total_without_gd.to_string(),
            month.economy_gd.to_string(),
            month.total_value.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn monthly_text(totals: &[MonthlyTotals]) -> String {
    if totals.is_empty() {
        return format!("{} No invoices stored", style("ℹ").blue());
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<9} {:>8} {:>12} {:>14} {:>16} {:>14} {:>14}\n",
        "Month", "Invoices", "kWh", "Compensated", "Without GD R$", "Economy R$", "Total R$"
    ));

    for month in totals {
        output.push_str(&format!(
            "{:<9} {:>8} {:>12} {:>14} {:>16} {:>14} {:>14}\n",
            format!("{}/{}", month.reference_month, month.reference_year),
            month.invoice_count,
            month.consumption_kwh.to_string(),
            month.compensated_energy_kwh.to_string(),
            format_brl_amount(month.total_without_gd),
            format_brl_amount(month.economy_gd),
            format_brl_amount(month.total_value)
        ));
    }

    output
}
