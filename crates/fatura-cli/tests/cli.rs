use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INVOICE: &str = "\
CEMIG DISTRIBUIÇÃO S.A. CNPJ 06.981.180/0001-16
JOSE DA SILVA
RUA DAS FLORES 123 APTO 4
CENTRO
38400-000 UBERLANDIA, MG
CPF 123.456.789-00
Classe Subclasse Modalidade Tarifária
ResidencialResidencial Trifásico
Convencional B3
Nº DA INSTALAÇÃO Nº DO CLIENTE
3001116735 7202788969
Referente a Vencimento Valor a pagar (R$)
MAR/2024 10/04/2024 285,43
Leituras Anterior Atual Nº de dias Próxima
01/03 15/03 14 31/03
Energia Elétrica kWh 100 0,95 95,00
Energia SCEE s/ ICMS kWh 250 0,60 150,00
Energia compensada GD I kWh 250 -0,50 -125,00
Contrib Ilum Publica Municipal 45,67
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        fs::create_dir(dir.path().join("inbox")).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn add_invoice(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path("inbox").join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn fatura(&self) -> Command {
        let mut cmd = Command::cargo_bin("fatura").unwrap();
        cmd.arg("--config").arg(self.path("config.json"));
        cmd
    }

    fn ingest(&self) -> Command {
        let mut cmd = self.fatura();
        cmd.arg("ingest")
            .arg(self.path("inbox"))
            .arg("--store")
            .arg(self.path("store.json"));
        cmd
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn extract_prints_record_with_metrics() {
    let ws = Workspace::new();
    let input = ws.add_invoice("march.txt", INVOICE);

    ws.fatura()
        .args(["extract", arg(&input)])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""installationNumber": "3001116735""#))
        .stdout(predicate::str::contains(r#""referenceMonth": "MAR""#))
        .stdout(predicate::str::contains(r#""totalWithoutGD": "290.67""#));
}

#[test]
fn extract_csv_output() {
    let ws = Workspace::new();
    let input = ws.add_invoice("march.txt", INVOICE);

    ws.fatura()
        .args(["extract", arg(&input), "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("installation_number,client_number"))
        .stdout(predicate::str::contains("3001116735,7202788969,JOSE DA SILVA,MAR,2024"));
}

#[test]
fn extract_rejects_incomplete_document() {
    let ws = Workspace::new();
    let input = ws.add_invoice("broken.txt", &INVOICE.replace("285,43", ""));

    ws.fatura()
        .args(["extract", arg(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No invoice could be extracted"));
}

#[test]
fn ingest_skips_duplicates_on_rerun() {
    let ws = Workspace::new();
    ws.add_invoice("march.txt", INVOICE);

    ws.ingest()
        .assert()
        .success()
        .stdout(predicate::str::contains("1 created, 0 skipped"));

    ws.ingest()
        .assert()
        .success()
        .stdout(predicate::str::contains("0 created, 1 skipped"))
        .stdout(predicate::str::contains("duplicate"));

    let store = fs::read_to_string(ws.path("store.json")).unwrap();
    assert_eq!(store.matches(r#""installationNumber": "3001116735""#).count(), 1);
}

#[test]
fn ingest_writes_summary() {
    let ws = Workspace::new();
    ws.add_invoice("march.txt", INVOICE);
    ws.add_invoice("april.txt", &INVOICE.replace("MAR/2024", "ABR/2024"));
    ws.add_invoice("notes.txt", "nothing to see here");
    let summary = ws.path("summary.csv");

    ws.ingest()
        .args(["--summary", arg(&summary)])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 created, 1 skipped"));

    let content = fs::read_to_string(&summary).unwrap();
    assert!(content.contains("ABR/2024,3001116735"));
    assert!(content.contains("notes.txt,skipped"));
    assert!(content.contains("unparseable"));
}

#[test]
fn report_monthly_totals() {
    let ws = Workspace::new();
    ws.add_invoice("march.txt", INVOICE);
    ws.add_invoice("april.txt", &INVOICE.replace("MAR/2024", "ABR/2024"));
    ws.ingest().assert().success();

    ws.fatura()
        .args(["report", "monthly", "--format", "json", "--store"])
        .arg(ws.path("store.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""referenceMonth": "MAR""#))
        .stdout(predicate::str::contains(r#""referenceMonth": "ABR""#))
        .stdout(predicate::str::contains(r#""consumptionKwh": "350""#));
}

#[test]
fn report_without_store_fails() {
    let ws = Workspace::new();

    ws.fatura()
        .args(["report", "list", "--store"])
        .arg(ws.path("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Store not found"));
}

#[test]
fn config_get_reads_given_file() {
    let ws = Workspace::new();
    fs::write(ws.path("config.json"), r#"{"ingest": {"workers": 7}}"#).unwrap();

    ws.fatura()
        .args(["config", "get", "ingest.workers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let ws = Workspace::new();

    ws.fatura()
        .args(["config", "set", "ingest.threads", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
