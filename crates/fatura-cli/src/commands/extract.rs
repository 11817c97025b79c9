//! Extract command - read fields from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use fatura_core::invoice::rules::format_brl_amount;
use fatura_core::invoice::{InvoiceFieldExtractor, InvoiceParser};
use fatura_core::models::invoice::InvoiceRecord;
use fatura_core::{derive_metrics, InvoiceMetrics};

use super::{load_config, read_document_text, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or extracted text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Year for meter reading dates (default: current year)
    #[arg(long)]
    reading_year: Option<i32>,

    /// Show layout warnings raised during extraction
    #[arg(long)]
    show_warnings: bool,
}

/// Extracted record together with its derived metrics.
#[derive(Serialize)]
struct ExtractOutput<'a> {
    #[serde(flatten)]
    invoice: &'a InvoiceRecord,

    #[serde(flatten)]
    metrics: Option<InvoiceMetrics>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let text = read_document_text(&args.input)?;

    let mut extractor = InvoiceFieldExtractor::with_config(config.extraction);
    if let Some(year) = args.reading_year {
        extractor = extractor.with_reading_year(year);
    }

    let result = extractor
        .parse(&text)
        .map_err(|e| anyhow::anyhow!("No invoice could be extracted: {}", e))?;
    let invoice = &result.invoice;
    let metrics = derive_metrics(invoice).ok();

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&ExtractOutput { invoice, metrics })?,
        OutputFormat::Csv => format_csv(invoice, metrics.as_ref())?,
        OutputFormat::Text => format_text(invoice, metrics.as_ref()),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_warnings {
        if result.warnings.is_empty() {
            eprintln!("{} No extraction warnings", style("ℹ").blue());
        } else {
            eprintln!("{}", style("Extraction warnings:").yellow());
            for warning in &result.warnings {
                eprintln!("  - {}", warning);
            }
        }
        eprintln!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

fn opt(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_csv(invoice: &InvoiceRecord, metrics: Option<&InvoiceMetrics>) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let data = &invoice.data;

    wtr.write_record([
        "installation_number",
        "client_number",
        "client_name",
        "reference_month",
        "reference_year",
        "expiration_date",
        "total_value",
        "class",
        "energy_kwh",
        "energy_value",
        "energy_scee_kwh",
        "energy_scee_value",
        "compensated_gdi_kwh",
        "compensated_gdi_value",
        "public_lighting_value",
        "consumption_kwh",
        "total_without_gd",
        "economy_gd",
    ])?;

    wtr.write_record([
        data.installation_number.clone(),
        invoice.client.client_number.clone(),
        invoice.client.name.clone(),
        data.reference_month.clone(),
        data.reference_year.clone(),
        data.expiration_date.to_string(),
        data.total_value.to_string(),
        data.class_name.clone(),
        opt(data.energy_amount_kwh),
        opt(data.energy_value),
        opt(data.energy_scee_kwh),
        opt(data.energy_scee_value),
        opt(data.compensated_gdi_kwh),
        opt(data.compensated_gdi_value),
        opt(data.public_lighting_value),
        opt(metrics.map(|m| m.consumption_kwh)),
        opt(metrics.map(|m| m.total_without_gd)),
        opt(metrics.map(|m| m.economy_gd)),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(invoice: &InvoiceRecord, metrics: Option<&InvoiceMetrics>) -> String {
    let data = &invoice.data;
    let address = &invoice.address;
    let mut output = String::new();

    output.push_str(&format!(
        "Invoice: {}/{} - installation {}\n",
        data.reference_month, data.reference_year, data.installation_number
    ));
    output.push_str(&format!("Due: {}\n", data.expiration_date.format("%d/%m/%Y")));
    if !data.class_name.is_empty() {
        output.push_str(&format!("Class: {}\n", data.class_name));
    }
    output.push('\n');

    output.push_str("Client:\n");
    output.push_str(&format!("  {} ({})\n", invoice.client.name, invoice.client.client_number));
    if !invoice.client.cpf_cnpj.is_empty() {
        output.push_str(&format!("  {}\n", invoice.client.cpf_cnpj));
    }
    if !address.street.is_empty() {
        output.push_str(&format!("  {} {}", address.street, address.number));
        if let Some(complement) = &address.complement {
            output.push_str(&format!(" {}", complement));
        }
        output.push('\n');
        output.push_str(&format!(
            "  {} - {} {}/{}\n",
            address.district, address.zip_code, address.city, address.state
        ));
    }
    output.push('\n');

    output.push_str("Billing:\n");
    let lines = [
        ("Energy", data.energy_amount_kwh, data.energy_value),
        ("SCEE energy", data.energy_scee_kwh, data.energy_scee_value),
        ("Compensated GD I", data.compensated_gdi_kwh, data.compensated_gdi_value),
    ];
    for (label, kwh, value) in lines {
        if let (Some(kwh), Some(value)) = (kwh, value) {
            output.push_str(&format!(
                "  {:<18} {:>8} kWh  R$ {:>10}\n",
                label,
                kwh.to_string(),
                format_brl_amount(value)
            ));
        }
    }
    if let Some(lighting) = data.public_lighting_value {
        output.push_str(&format!(
            "  {:<18} {:>12}  R$ {:>10}\n",
            "Public lighting",
            "",
            format_brl_amount(lighting)
        ));
    }
    if let Some(fine) = data.fine_for_delay {
        output.push_str(&format!(
            "  {:<18} {:>12}  R$ {:>10}\n",
            "Late fee",
            "",
            format_brl_amount(fine)
        ));
    }
    output.push_str(&format!("  Total: R$ {}\n", format_brl_amount(data.total_value)));

    if let Some(metrics) = metrics {
        output.push('\n');
        output.push_str("Metrics:\n");
        output.push_str(&format!("  Consumption: {} kWh\n", metrics.consumption_kwh));
        output.push_str(&format!("  Compensated energy: {} kWh\n", metrics.compensated_energy_kwh));
        output.push_str(&format!(
            "  Total without GD: R$ {}\n",
            format_brl_amount(metrics.total_without_gd)
        ));
        output.push_str(&format!("  GD economy: R$ {}\n", format_brl_amount(metrics.economy_gd)));
    }

    output
}
