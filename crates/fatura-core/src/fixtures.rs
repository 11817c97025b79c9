//! Synthetic invoice text shared by unit tests.

/// Text laid out like a CEMIG residential bill after PDF text extraction.
pub const SAMPLE_INVOICE: &str = "\
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
Itens da fatura Unid. Quant. Preço unit Valor (R$)
Energia Elétrica kWh 100 0,95 95,00
Energia SCEE s/ ICMS kWh 250 0,60 150,00
Energia compensada GD I kWh 250 -0,50 -125,00
Contrib Ilum Publica Municipal 45,67
Multa por atraso 02/2024 5,32
";

/// Sample invoice with the installation, client and reference replaced.
pub fn invoice_text(installation: &str, client: &str, reference: &str) -> String {
    SAMPLE_INVOICE
        .replace("3001116735 7202788969", &format!("{installation} {client}"))
        .replace("MAR/2024 10/04/2024", &format!("{reference} 10/04/2024"))
}
