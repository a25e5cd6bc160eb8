//! Records mirrored from backend responses. Field names follow the wire format.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

// --- Lenient field decoding ---

/// Null or missing amounts count as zero, the way the listings have always
/// displayed them.
pub fn amount_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(crate::commands::utils::parse_date_safe))
}

pub fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

// --- Invoices ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: i64,
    #[serde(default)]
    pub numero_fattura: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_fattura: Option<NaiveDate>,
    pub ragione_sociale_fornitore: Option<String>,
    pub partita_iva_fornitore: Option<String>,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub totale: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub iva: Decimal,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub pagata: bool,
    pub metodo_pagamento: Option<String>,
    pub stato: Option<String>,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub riconciliata: bool,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_pagamento: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLine {
    pub id: Option<i64>,
    #[serde(default)]
    pub descrizione: String,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub quantita: Decimal,
    pub unita_misura: Option<String>,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub prezzo_unitario: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub prezzo_totale: Decimal,
    pub aliquota_iva: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadReport {
    #[serde(default)]
    pub uploaded: u32,
    #[serde(default)]
    pub errors: u32,
}

// --- Payment instruments ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Disponibile,
    Emesso,
    Incassato,
    Annullato,
}

impl CheckStatus {
    pub const ALL: [CheckStatus; 4] = [
        CheckStatus::Disponibile,
        CheckStatus::Emesso,
        CheckStatus::Incassato,
        CheckStatus::Annullato,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Disponibile => "disponibile",
            CheckStatus::Emesso => "emesso",
            CheckStatus::Incassato => "incassato",
            CheckStatus::Annullato => "annullato",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Check {
    pub id: i64,
    #[serde(default, alias = "numero_assegno")]
    pub numero: String,
    pub banca: Option<String>,
    pub stato: CheckStatus,
    pub beneficiario: Option<String>,
    pub importo: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_emissione: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_incasso: Option<NaiveDate>,
    pub id_fattura: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckStats {
    #[serde(default)]
    pub totale: u32,
    #[serde(default)]
    pub disponibili: u32,
    #[serde(default)]
    pub emessi: u32,
    #[serde(default)]
    pub incassati: u32,
    #[serde(default)]
    pub annullati: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankTransfer {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_bonifico: Option<NaiveDate>,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub importo: Decimal,
    pub beneficiario: Option<String>,
    pub ordinante: Option<String>,
    pub causale: Option<String>,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub collegato: bool,
    pub id_fattura: Option<i64>,
}

/// Line of the bank book (Prima Nota Banca).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankMovement {
    pub id: i64,
    #[serde(default, alias = "data", deserialize_with = "lenient_date")]
    pub data_operazione: Option<NaiveDate>,
    pub tipo: Option<String>,
    pub descrizione: Option<String>,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub importo: Decimal,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub riconciliato: bool,
}

// --- Cash book ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashMovement {
    pub id: i64,
    #[serde(default, alias = "data", deserialize_with = "lenient_date")]
    pub data_operazione: Option<NaiveDate>,
    #[serde(default)]
    pub tipo: String,
    pub descrizione: Option<String>,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub importo: Decimal,
    pub note: Option<String>,
}

/// Body of `/cash-register/saldo`, which is not wrapped in `data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashBalance {
    #[serde(default = "crate::models::default_true")]
    pub success: bool,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub saldo: Decimal,
    pub data_calcolo: Option<String>,
}

pub(crate) fn default_true() -> bool {
    true
}

// --- Suppliers ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Supplier {
    pub partita_iva: String,
    #[serde(default)]
    pub ragione_sociale: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub indirizzo: Option<String>,
    pub citta: Option<String>,
    pub cap: Option<String>,
    pub metodo_pagamento: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SupplierStats {
    #[serde(default)]
    pub totale_fatture: u32,
    #[serde(default, alias = "importo_totale", deserialize_with = "amount_or_zero")]
    pub totale_importo: Decimal,
    #[serde(default, deserialize_with = "lenient_date")]
    pub ultima_fattura: Option<NaiveDate>,
    #[serde(default)]
    pub fatture_pagate: u32,
    #[serde(default)]
    pub fatture_da_pagare: u32,
}

// --- Employees ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: i64,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub cognome: String,
    pub codice_fiscale: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub mansione: Option<String>,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub retribuzione_mensile: Decimal,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nome, self.cognome).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payslip {
    pub id: i64,
    pub mese_anno: Option<String>,
    pub retribuzione_lorda: Option<Decimal>,
    pub retribuzione_netta: Option<Decimal>,
    pub inps: Option<Decimal>,
    pub irpef: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HrStatistics {
    #[serde(default)]
    pub totale_dipendenti: u32,
    #[serde(default)]
    pub dipendenti_attivi: u32,
    #[serde(default)]
    pub dipendenti_cessati: u32,
    #[serde(default)]
    pub buste_paga_da_pagare: u32,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub importo_da_pagare: Decimal,
    #[serde(default)]
    pub richieste_ferie_pendenti: u32,
}

/// Outcome of a mailbox scan for payslip PDFs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmailBotReport {
    #[serde(default)]
    pub imported: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Payslip as the employee portal shows it, with the dispute window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortalPayslip {
    pub id: i64,
    #[serde(default)]
    pub periodo: String,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub retribuzione_lorda: Decimal,
    #[serde(default, alias = "inps", deserialize_with = "amount_or_zero")]
    pub inps_dipendente: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub irpef: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub netto_in_busta: Decimal,
    #[serde(default)]
    pub stato_pagamento: String,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub pdf_disponibile: bool,
    #[serde(default)]
    pub numero_visualizzazioni: u32,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub accettato: bool,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_disponibilita: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_scadenza_contestazione: Option<NaiveDate>,
    #[serde(default)]
    pub giorni_rimanenti_contestazione: i64,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub contestazione_scaduta: bool,
    pub messaggio_scadenza: Option<String>,
    #[serde(default)]
    pub numero_contestazioni: u32,
}

// --- HACCP ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemperatureReading {
    pub id: i64,
    #[serde(default)]
    pub tipo: String,
    #[serde(default, alias = "data", deserialize_with = "lenient_date")]
    pub data_rilevazione: Option<NaiveDate>,
    #[serde(alias = "ora")]
    pub ora_rilevazione: Option<String>,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub temperatura: Decimal,
    pub operatore: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sanitation {
    pub id: i64,
    #[serde(default, alias = "data", deserialize_with = "lenient_date")]
    pub data_sanificazione: Option<NaiveDate>,
    #[serde(default)]
    pub area: String,
    pub prodotto_usato: Option<String>,
    pub operatore: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCertificate {
    pub id: i64,
    pub nome_dipendente: Option<String>,
    pub cognome_dipendente: Option<String>,
    pub numero_libretto: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_rilascio: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub data_scadenza: Option<NaiveDate>,
    /// Joined employee row, present when the backend embeds it.
    pub dipendenti: Option<EmployeeName>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeName {
    pub nome: Option<String>,
    pub cognome: Option<String>,
}

impl HealthCertificate {
    pub fn holder_name(&self) -> String {
        let joined = self.dipendenti.as_ref();
        let nome = self
            .nome_dipendente
            .as_deref()
            .or_else(|| joined.and_then(|d| d.nome.as_deref()))
            .unwrap_or_default();
        let cognome = self
            .cognome_dipendente
            .as_deref()
            .or_else(|| joined.and_then(|d| d.cognome.as_deref()))
            .unwrap_or_default();
        format!("{} {}", nome, cognome).trim().to_string()
    }
}

// --- VAT ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VatLiquidation {
    pub mese: u32,
    pub anno: i32,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub iva_vendite: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub iva_acquisti: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub iva_da_versare: Decimal,
    pub tipo: Option<String>,
}

// --- Warehouse ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub codice_prodotto: Option<String>,
    #[serde(default)]
    pub descrizione: String,
    pub categoria: Option<String>,
    pub unita_misura: Option<String>,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub quantita: Decimal,
    pub prezzo_acquisto: Option<Decimal>,
}

// --- Dashboard ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthInvoices {
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub totale: Decimal,
    pub mese: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SupplierCount {
    #[serde(default)]
    pub totale: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PayableInvoices {
    #[serde(default)]
    pub numero: u32,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub importo: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    #[serde(default)]
    pub fatture_mese: MonthInvoices,
    #[serde(default)]
    pub fornitori: SupplierCount,
    #[serde(default)]
    pub fatture_da_pagare: PayableInvoices,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub saldo_cassa: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuickAction {
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub titolo: String,
    pub descrizione: Option<String>,
    pub azione: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub descrizione: String,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub importo: Decimal,
    pub data: Option<String>,
}

/// Body of the analytics endpoint, returned without the `data` wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsStats {
    #[serde(default)]
    pub totale_fatture: u32,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub importo_totale: Decimal,
    #[serde(default)]
    pub fatture_pagate: u32,
    #[serde(default)]
    pub fatture_da_pagare: u32,
    #[serde(default)]
    pub totale_fornitori: u32,
}

// --- Accounting ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatementSection {
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub totale: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IncomeStatement {
    pub anno: Option<i32>,
    #[serde(default)]
    pub ricavi: StatementSection,
    #[serde(default)]
    pub costi: StatementSection,
    pub utile_perdita: Option<Decimal>,
}

// --- Bulk import ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportReport {
    #[serde(default = "crate::models::default_true")]
    pub success: bool,
    #[serde(default)]
    pub imported: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub errors: Vec<String>,
    pub total_errors: Option<u32>,
    pub message: Option<String>,
}
