use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use gestionale::commands::auth::{self, RegisterRequest};
use gestionale::commands::bank::{NewTransfer, TransfersPage};
use gestionale::commands::bulk_import::{self, ImportKind};
use gestionale::commands::cash_register::{CashFilter, CashRegisterPage, DailyClosure, ManualMovement};
use gestionale::commands::checks::{CarnetRequest, ChecksPage};
use gestionale::commands::employees::{EmployeeInput, EmployeesPage};
use gestionale::commands::haccp::{reading_is_compliant, Appliance, HaccpPage, NewReading, NewSanitation};
use gestionale::commands::invoices::{ArchivePage, InvoiceTab};
use gestionale::commands::payment::PaymentMethod;
use gestionale::commands::portal::PayslipPortal;
use gestionale::commands::reconciliation::ReconciliationPage;
use gestionale::commands::suppliers::{SupplierInput, SuppliersPage};
use gestionale::commands::utils::{format_date, format_eur, parse_amount, parse_date};
use gestionale::commands::warehouse::{ProductInput, WarehousePage};
use gestionale::commands::{accounting, dashboard, hr, treasury, vat};
use gestionale::models::{CheckStatus, Invoice};
use gestionale::{ApiClient, Config, GestionaleError, GestionaleResult, SessionStore};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gestionale", version, about = "Console per il gestionale: fatture, pagamenti, prima nota, assegni, IVA")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login { email: String, password: String },
    /// Create an account and log in
    Register {
        email: String,
        password: String,
        #[arg(long)]
        ragione_sociale: String,
        #[arg(long)]
        partita_iva: String,
    },
    Logout,
    Whoami,
    Health,
    #[command(subcommand)]
    Invoices(InvoiceCommand),
    #[command(subcommand)]
    Checks(CheckCommand),
    #[command(subcommand)]
    Transfers(TransferCommand),
    #[command(subcommand)]
    Reconcile(ReconcileCommand),
    #[command(subcommand)]
    Cash(CashCommand),
    /// Monthly VAT settlement
    Vat { mese: u32, anno: i32 },
    #[command(subcommand)]
    Suppliers(SupplierCommand),
    #[command(subcommand)]
    Employees(EmployeeCommand),
    #[command(subcommand)]
    Hr(HrCommand),
    /// Employee portal
    #[command(subcommand)]
    Portal(PortalCommand),
    #[command(subcommand)]
    Haccp(HaccpCommand),
    #[command(subcommand)]
    Warehouse(WarehouseCommand),
    /// Liquidity forecast
    Treasury,
    Dashboard {
        /// Also list the most recent activity
        #[arg(long)]
        activity: Option<u32>,
    },
    #[command(subcommand)]
    Accounting(AccountingCommand),
    /// Bulk import from a spreadsheet
    Import {
        #[arg(value_parser = import_kind_arg)]
        kind: ImportKind,
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum InvoiceCommand {
    List {
        #[arg(long, value_parser = tab_arg, default_value = "attive")]
        tab: InvoiceTab,
    },
    /// Register the payment of an unpaid invoice
    Pay {
        id: i64,
        #[arg(long, value_parser = method_arg)]
        method: PaymentMethod,
        #[arg(long)]
        check: Option<i64>,
        #[arg(long)]
        transfer: Option<i64>,
        #[arg(long, value_parser = date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long, value_parser = tab_arg, default_value = "attive")]
        tab: InvoiceTab,
    },
    Delete {
        id: i64,
        #[arg(long, value_parser = tab_arg, default_value = "attive")]
        tab: InvoiceTab,
    },
    /// Upload FatturaPA XML files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    Lines { id: i64 },
    /// Invoice the backend would match to a transfer
    Suggest { transfer: i64 },
}

#[derive(Subcommand, Debug)]
enum CheckCommand {
    List {
        #[arg(long, value_parser = check_status_arg)]
        status: Option<CheckStatus>,
    },
    /// Register a new carnet of checks
    Carnet {
        #[arg(long)]
        banca: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        count: u32,
    },
    Cash { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum TransferCommand {
    List {
        #[arg(long)]
        linked: Option<bool>,
    },
    Add {
        #[arg(long)]
        date: String,
        #[arg(long, value_parser = amount_arg)]
        amount: Decimal,
        #[arg(long)]
        to: String,
        #[arg(long)]
        causale: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ReconcileCommand {
    List,
    Match {
        movement: i64,
        #[arg(long)]
        invoice: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum CashCommand {
    List {
        #[arg(long, value_parser = date_arg)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = date_arg)]
        to: Option<NaiveDate>,
        #[arg(long)]
        tipo: Option<String>,
    },
    /// Daily closure
    Close {
        #[arg(long, value_parser = date_arg)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = amount_arg, default_value = "0")]
        corrispettivi: Decimal,
        #[arg(long, value_parser = amount_arg, default_value = "0")]
        pos: Decimal,
        #[arg(long, value_parser = amount_arg, default_value = "0")]
        versamento: Decimal,
        #[arg(long)]
        note: Option<String>,
    },
    Add {
        #[arg(long, value_parser = date_arg)]
        date: Option<NaiveDate>,
        #[arg(long)]
        tipo: String,
        #[arg(long, value_parser = amount_arg, allow_hyphen_values = true)]
        amount: Decimal,
        #[arg(long)]
        descrizione: Option<String>,
    },
    Delete { id: i64 },
    ImportCorrispettivi { file: PathBuf },
    ImportPos { file: PathBuf },
}

#[derive(Args, Debug)]
struct SupplierArgs {
    #[arg(long)]
    piva: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    telefono: Option<String>,
    #[arg(long)]
    indirizzo: Option<String>,
    #[arg(long)]
    citta: Option<String>,
    #[arg(long)]
    cap: Option<String>,
    #[arg(long)]
    metodo_pagamento: Option<String>,
}

impl From<SupplierArgs> for SupplierInput {
    fn from(a: SupplierArgs) -> Self {
        SupplierInput {
            partita_iva: a.piva,
            ragione_sociale: a.name,
            email: a.email,
            telefono: a.telefono,
            indirizzo: a.indirizzo,
            citta: a.citta,
            cap: a.cap,
            metodo_pagamento: a.metodo_pagamento,
        }
    }
}

#[derive(Subcommand, Debug)]
enum SupplierCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show { piva: String },
    Add(SupplierArgs),
    Update(SupplierArgs),
    Delete { piva: String },
}

#[derive(Subcommand, Debug)]
enum EmployeeCommand {
    List,
    Add {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        cognome: String,
        #[arg(long)]
        codice_fiscale: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        telefono: Option<String>,
        #[arg(long)]
        mansione: Option<String>,
        #[arg(long, value_parser = amount_arg)]
        retribuzione: Option<Decimal>,
    },
    UploadPayslip { file: PathBuf },
    Payslips { id: i64 },
}

#[derive(Subcommand, Debug)]
enum HrCommand {
    Stats,
    /// Import payslips from the mailbox now
    EmailBot,
}

#[derive(Subcommand, Debug)]
enum PortalCommand {
    Show { id: i64 },
    /// Confirm having read the payslip
    Accept { id: i64 },
    Download {
        id: i64,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    DisputeForm {
        id: i64,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum HaccpCommand {
    Show,
    Temperature {
        #[arg(long, value_parser = appliance_arg)]
        tipo: Appliance,
        #[arg(long, value_parser = amount_arg, allow_hyphen_values = true)]
        value: Decimal,
        #[arg(long)]
        operatore: Option<String>,
    },
    Sanitation {
        #[arg(long)]
        area: String,
        #[arg(long)]
        prodotto: Option<String>,
        #[arg(long)]
        operatore: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum WarehouseCommand {
    List {
        #[arg(long)]
        category: Option<String>,
    },
    Add {
        #[arg(long)]
        codice: String,
        #[arg(long)]
        descrizione: String,
        #[arg(long)]
        categoria: Option<String>,
        #[arg(long)]
        unita: Option<String>,
        #[arg(long, value_parser = amount_arg, default_value = "0")]
        quantita: Decimal,
        #[arg(long, value_parser = amount_arg)]
        prezzo: Option<Decimal>,
    },
    /// Create products from invoice lines
    Populate,
}

#[derive(Subcommand, Debug)]
enum AccountingCommand {
    Statement { anno: i32 },
    PopulateAccounts,
}

// --- Argument parsers ---

fn amount_arg(raw: &str) -> Result<Decimal, String> {
    parse_amount(raw).map_err(|e| e.user_message())
}

fn date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|e| e.user_message())
}

fn tab_arg(raw: &str) -> Result<InvoiceTab, String> {
    InvoiceTab::parse(raw).ok_or_else(|| format!("scheda sconosciuta: {}", raw))
}

fn method_arg(raw: &str) -> Result<PaymentMethod, String> {
    PaymentMethod::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = PaymentMethod::ALL.iter().map(|m| m.as_str()).collect();
        format!("metodo sconosciuto: {} (valori: {})", raw, known.join(", "))
    })
}

fn check_status_arg(raw: &str) -> Result<CheckStatus, String> {
    CheckStatus::parse(raw).ok_or_else(|| format!("stato assegno sconosciuto: {}", raw))
}

fn import_kind_arg(raw: &str) -> Result<ImportKind, String> {
    ImportKind::parse(raw).ok_or_else(|| format!("tipo import sconosciuto: {}", raw))
}

fn appliance_arg(raw: &str) -> Result<Appliance, String> {
    Appliance::parse(raw).ok_or_else(|| format!("tipo apparecchio sconosciuto: {}", raw))
}

// --- Output ---

struct Output {
    json: bool,
}

impl Output {
    fn print<T, F>(&self, value: &T, text: F) -> GestionaleResult<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    fn message(&self, message: Option<String>, fallback: &str) -> GestionaleResult<()> {
        let text = message.unwrap_or_else(|| fallback.to_string());
        self.print(&json!({ "message": text }), || text.clone())
    }
}

fn invoice_table(invoices: &[Invoice]) -> String {
    let mut lines: Vec<String> = invoices
        .iter()
        .map(|f| {
            format!(
                "{:>6}  {:<18} {:<10} {:<32} {:>12}  {}",
                f.id,
                f.numero_fattura,
                format_date(f.data_fattura),
                f.ragione_sociale_fornitore.as_deref().unwrap_or("-"),
                format_eur(f.totale),
                if f.pagata { "pagata" } else { "da pagare" }
            )
        })
        .collect();
    let total: Decimal = invoices.iter().map(|f| f.totale).sum();
    lines.push(format!("{} fatture, totale {}", invoices.len(), format_eur(total)));
    lines.join("\n")
}

fn report(err: &GestionaleError, json: bool) {
    tracing::debug!("{:?}", err);
    if json {
        eprintln!("{}", json!({ "error": err }));
    } else {
        eprintln!("{}", err.user_message());
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e, json);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> GestionaleResult<()> {
    let config = Config::from_env()?;
    let store = SessionStore::new(config.session_file.clone());
    let client = ApiClient::new(&config, store.load()?)?;
    tracing::debug!("Backend {}", client.base_url());
    let out = Output { json: cli.json };

    match cli.command {
        Command::Login { email, password } => {
            let session = auth::login(&client, &email, &password).await?;
            store.save(&session)?;
            out.print(&session.user, || format!("Accesso effettuato come {}", email))
        }
        Command::Register {
            email,
            password,
            ragione_sociale,
            partita_iva,
        } => {
            let request = RegisterRequest {
                email: email.clone(),
                password,
                ragione_sociale,
                partita_iva,
            };
            let session = auth::register(&client, request).await?;
            store.save(&session)?;
            out.print(&session.user, || format!("Registrazione completata per {}", email))
        }
        Command::Logout => {
            auth::logout(&client).await?;
            store.clear()?;
            out.message(None, "Logout effettuato")
        }
        Command::Whoami => {
            let user = auth::me(&client).await?;
            out.print(&user, || {
                format!(
                    "{} <{}> {}",
                    user.full_name.as_deref().unwrap_or("-"),
                    user.email,
                    user.role.as_deref().unwrap_or("")
                )
            })
        }
        Command::Health => {
            let health = auth::health(&client).await?;
            let value = json!({
                "status": health.status,
                "database": health.database,
                "timestamp": health.timestamp,
            });
            out.print(&value, || {
                format!(
                    "{} (database: {})",
                    health.status,
                    health.database.as_deref().unwrap_or("-")
                )
            })
        }
        Command::Invoices(cmd) => run_invoices(&client, &out, cmd).await,
        Command::Checks(cmd) => run_checks(&client, &out, cmd).await,
        Command::Transfers(cmd) => run_transfers(&client, &out, cmd).await,
        Command::Reconcile(cmd) => run_reconcile(&client, &out, cmd).await,
        Command::Cash(cmd) => run_cash(&client, &out, cmd).await,
        Command::Vat { mese, anno } => {
            let settlement = vat::liquidation(&client, mese, anno).await?;
            let value = json!({
                "mese": settlement.mese,
                "anno": settlement.anno,
                "iva_vendite": settlement.iva_vendite,
                "iva_acquisti": settlement.iva_acquisti,
                "saldo": settlement.display_amount(),
                "tipo": settlement.kind().as_str(),
                "nota": settlement.notice(),
            });
            out.print(&value, || match settlement.notice() {
                Some(notice) => format!("{}\n{}", settlement, notice),
                None => settlement.to_string(),
            })
        }
        Command::Suppliers(cmd) => run_suppliers(&client, &out, cmd).await,
        Command::Employees(cmd) => run_employees(&client, &out, cmd).await,
        Command::Hr(HrCommand::Stats) => {
            let dashboard = hr::overview(&client).await?;
            out.print(&dashboard.stats, || {
                let stats = &dashboard.stats;
                let mut text = format!(
                    "Dipendenti attivi {} su {} ({} cessati)\nBuste paga da pagare {} ({})\nRichieste ferie in attesa {}",
                    stats.dipendenti_attivi,
                    stats.totale_dipendenti,
                    stats.dipendenti_cessati,
                    stats.buste_paga_da_pagare,
                    format_eur(stats.importo_da_pagare),
                    stats.richieste_ferie_pendenti
                );
                if let Some(alert) = dashboard.payment_alert() {
                    text.push('\n');
                    text.push_str(&alert);
                }
                text
            })
        }
        Command::Hr(HrCommand::EmailBot) => {
            let report = hr::run_email_bot(&client).await?;
            out.print(&report, || report.to_string())
        }
        Command::Portal(cmd) => run_portal(&client, &out, cmd).await,
        Command::Haccp(cmd) => run_haccp(&client, &out, cmd).await,
        Command::Warehouse(cmd) => run_warehouse(&client, &out, cmd).await,
        Command::Treasury => {
            let overview = treasury::overview(&client).await?;
            let value = json!({
                "cassa": overview.cash,
                "banca": overview.bank(),
                "liquidita": overview.liquidity(),
                "da_pagare": overview.to_pay(),
                "netto": overview.net(),
                "fatture_da_pagare": overview.unpaid.len(),
            });
            out.print(&value, || {
                let mut text = format!(
                    "Cassa {}\nBanca {}\nLiquidità {}\nDa pagare {} ({} fatture)\nNetto {}",
                    format_eur(overview.cash),
                    format_eur(overview.bank()),
                    format_eur(overview.liquidity()),
                    format_eur(overview.to_pay()),
                    overview.unpaid.len(),
                    format_eur(overview.net())
                );
                if overview.is_shortfall() {
                    text.push_str("\nAttenzione: liquidità insufficiente");
                }
                text
            })
        }
        Command::Dashboard { activity } => {
            let (home, analytics) =
                tokio::try_join!(dashboard::overview(&client), dashboard::analytics(&client))?;
            let recent = match activity {
                Some(limit) => dashboard::recent_activity(&client, limit).await?,
                None => Vec::new(),
            };
            let value = json!({
                "stats": home.stats,
                "quick_actions": home.quick_actions,
                "analytics": analytics,
                "media_fattura": analytics.average_invoice(),
                "recent_activity": recent,
            });
            out.print(&value, || {
                let mut lines = vec![
                    format!("Fatture del mese: {}", format_eur(home.stats.fatture_mese.totale)),
                    format!("Fornitori: {}", home.stats.fornitori.totale),
                    format!(
                        "Da pagare: {} fatture, {}",
                        home.stats.fatture_da_pagare.numero,
                        format_eur(home.stats.fatture_da_pagare.importo)
                    ),
                    format!("Saldo cassa: {}", format_eur(home.stats.saldo_cassa)),
                    format!("Media per fattura: {}", format_eur(analytics.average_invoice())),
                ];
                lines.extend(home.quick_actions.iter().map(|a| format!("[{}] {}", a.tipo, a.titolo)));
                lines.extend(
                    recent
                        .iter()
                        .map(|a| format!("{} {} {}", a.data.as_deref().unwrap_or("-"), a.descrizione, format_eur(a.importo))),
                );
                lines.join("\n")
            })
        }
        Command::Accounting(AccountingCommand::Statement { anno }) => {
            let statement = accounting::income_statement(&client, anno).await?;
            out.print(&statement, || {
                format!(
                    "Conto economico {}\nRicavi {}\nCosti {}\nRisultato ({}) {}",
                    anno,
                    format_eur(statement.ricavi.totale),
                    format_eur(statement.costi.totale),
                    statement.result_label(),
                    format_eur(statement.result())
                )
            })
        }
        Command::Accounting(AccountingCommand::PopulateAccounts) => {
            let (message, created) = accounting::populate_chart_of_accounts(&client).await?;
            let text = message.unwrap_or_else(|| format!("Creati {} conti", created));
            out.print(&json!({ "message": text, "conti_creati": created }), || text.clone())
        }
        Command::Import { kind, file } => {
            let report = bulk_import::upload(&client, kind, &file).await?;
            out.print(&report, || {
                let mut lines = vec![format!(
                    "Import {}: {} importati, {} saltati",
                    kind, report.imported, report.skipped
                )];
                lines.extend(report.displayed_errors().iter().cloned());
                let hidden = report.hidden_errors();
                if hidden > 0 {
                    lines.push(format!("... e altri {} errori", hidden));
                }
                lines.join("\n")
            })
        }
    }
}

async fn run_invoices(client: &ApiClient, out: &Output, cmd: InvoiceCommand) -> GestionaleResult<()> {
    let mut archive = ArchivePage::new(client.clone());
    match cmd {
        InvoiceCommand::List { tab } => {
            archive.set_tab(tab).await?;
            out.print(archive.invoices(), || invoice_table(archive.invoices()))
        }
        InvoiceCommand::Pay {
            id,
            method,
            check,
            transfer,
            date,
            note,
            tab,
        } => {
            archive.set_tab(tab).await?;
            let mut form = archive.open_payment(id)?;
            form.select_method(method).await;
            if let Some(date) = date {
                form.set_payment_date(date);
            }
            if let Some(note) = note.as_deref() {
                form.set_note(note);
            }
            if let Some(check) = check {
                form.select_check(check)?;
            }
            if method == PaymentMethod::BancaBonifico {
                form.select_transfer(transfer)?;
            }

            let outcome = archive.complete_payment(&mut form).await?;
            for notice in &outcome.notices {
                eprintln!("{}", notice.message());
            }
            let summary = form.summary().to_string();
            let value = json!({ "message": outcome.message, "riepilogo": summary });
            out.print(&value, || format!("{}\n{}", outcome.message, summary))
        }
        InvoiceCommand::Delete { id, tab } => {
            archive.set_tab(tab).await?;
            let message = archive.delete(id).await?;
            out.message(message, "Fattura eliminata")
        }
        InvoiceCommand::Upload { files } => {
            let report = archive.upload_xml(&files).await?;
            out.print(&report, || {
                format!("{} fatture caricate, {} errori", report.uploaded, report.errors)
            })
        }
        InvoiceCommand::Lines { id } => {
            let lines = archive.lines(id).await?;
            out.print(&lines, || {
                lines
                    .iter()
                    .map(|l| {
                        format!(
                            "{:<40} {:>8} {:<4} {:>10} {:>12}",
                            l.descrizione,
                            l.quantita,
                            l.unita_misura.as_deref().unwrap_or(""),
                            format_eur(l.prezzo_unitario),
                            format_eur(l.prezzo_totale)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        InvoiceCommand::Suggest { transfer } => {
            let suggestion = archive.suggest_transfer_match(transfer).await?;
            out.print(&suggestion, || match &suggestion {
                Some(f) => format!(
                    "Fattura suggerita: {} {} {}",
                    f.id,
                    f.numero_fattura,
                    format_eur(f.totale)
                ),
                None => "Nessuna fattura corrispondente trovata".to_string(),
            })
        }
    }
}

async fn run_checks(client: &ApiClient, out: &Output, cmd: CheckCommand) -> GestionaleResult<()> {
    let mut page = ChecksPage::new(client.clone());
    match cmd {
        CheckCommand::List { status } => {
            page.refresh().await?;
            page.set_filter(status);
            let visible = page.visible();
            let stats = page.stats();
            out.print(&json!({ "assegni": visible, "stats": stats }), || {
                let mut lines: Vec<String> = visible
                    .iter()
                    .map(|c| {
                        format!(
                            "{:>6}  {:<10} {:<20} {:<11} {:>12}  {}",
                            c.id,
                            c.numero,
                            c.banca.as_deref().unwrap_or("-"),
                            c.stato.as_str(),
                            c.importo.map(format_eur).unwrap_or_else(|| "-".to_string()),
                            c.beneficiario.as_deref().unwrap_or("")
                        )
                    })
                    .collect();
                lines.push(format!(
                    "Totale {}: {} disponibili, {} emessi, {} incassati, {} annullati",
                    stats.totale, stats.disponibili, stats.emessi, stats.incassati, stats.annullati
                ));
                lines.join("\n")
            })
        }
        CheckCommand::Carnet { banca, from, count } => {
            let request = CarnetRequest {
                banca,
                numero_inizio: from,
                quantita: count,
            };
            let message = page.create_carnet(&request).await?;
            out.message(message, "Carnet registrato")
        }
        CheckCommand::Cash { id } => {
            page.refresh().await?;
            let message = page.mark_cashed(id).await?;
            out.message(message, "Assegno incassato")
        }
        CheckCommand::Delete { id } => {
            let message = page.delete(id).await?;
            out.message(message, "Assegno eliminato")
        }
    }
}

async fn run_transfers(client: &ApiClient, out: &Output, cmd: TransferCommand) -> GestionaleResult<()> {
    let mut page = TransfersPage::new(client.clone());
    match cmd {
        TransferCommand::List { linked } => {
            page.set_linked_filter(linked).await?;
            out.print(page.transfers(), || {
                let mut lines: Vec<String> = page
                    .transfers()
                    .iter()
                    .map(|t| {
                        format!(
                            "{:>6}  {:<10} {:<30} {:>12}  {}",
                            t.id,
                            format_date(t.data_bonifico),
                            t.beneficiario.as_deref().unwrap_or("-"),
                            format_eur(t.importo),
                            if t.collegato { "collegato" } else { "da collegare" }
                        )
                    })
                    .collect();
                lines.push(format!(
                    "Totale {} ({} da collegare)",
                    format_eur(page.total()),
                    page.unlinked_count()
                ));
                lines.join("\n")
            })
        }
        TransferCommand::Add {
            date,
            amount,
            to,
            causale,
        } => {
            let transfer = NewTransfer::parse(&date, amount, &to, causale.as_deref())?;
            let message = page.create(&transfer).await?;
            out.message(message, "Bonifico registrato")
        }
    }
}

async fn run_reconcile(client: &ApiClient, out: &Output, cmd: ReconcileCommand) -> GestionaleResult<()> {
    let mut page = ReconciliationPage::new(client.clone());
    match cmd {
        ReconcileCommand::List => {
            page.refresh().await?;
            let value = json!({ "movimenti": page.movements(), "fatture": page.candidates() });
            out.print(&value, || {
                let mut lines: Vec<String> = page
                    .movements()
                    .iter()
                    .map(|m| {
                        format!(
                            "{:>6}  {:<10} {:<40} {:>12}",
                            m.id,
                            format_date(m.data_operazione),
                            m.descrizione.as_deref().unwrap_or("-"),
                            format_eur(m.importo)
                        )
                    })
                    .collect();
                lines.push(String::new());
                lines.push(invoice_table(page.candidates()));
                lines.join("\n")
            })
        }
        ReconcileCommand::Match { movement, invoice } => {
            let message = page.match_movement(movement, invoice).await?;
            out.message(message, "Riconciliazione completata")
        }
    }
}

async fn run_cash(client: &ApiClient, out: &Output, cmd: CashCommand) -> GestionaleResult<()> {
    let mut page = CashRegisterPage::new(client.clone());
    let today = Local::now().date_naive();
    match cmd {
        CashCommand::List { from, to, tipo } => {
            page.set_filter(CashFilter {
                data_inizio: from,
                data_fine: to,
                tipo,
            })
            .await?;
            let value = json!({ "movimenti": page.movements(), "saldo": page.balance() });
            out.print(&value, || {
                let mut lines: Vec<String> = page
                    .movements()
                    .iter()
                    .map(|m| {
                        format!(
                            "{:>6}  {:<10} {:<16} {:>12}  {}",
                            m.id,
                            format_date(m.data_operazione),
                            m.tipo,
                            format_eur(m.importo),
                            m.descrizione.as_deref().unwrap_or("")
                        )
                    })
                    .collect();
                lines.push(format!(
                    "Entrate {}  Uscite {}  Saldo {}",
                    format_eur(page.income()),
                    format_eur(page.outgoings()),
                    format_eur(page.balance())
                ));
                lines.join("\n")
            })
        }
        CashCommand::Close {
            date,
            corrispettivi,
            pos,
            versamento,
            note,
        } => {
            let closure = DailyClosure {
                data: date.unwrap_or(today),
                corrispettivi,
                pos,
                versamento,
                note,
            };
            let outcome = page.close_day(&closure).await?;
            let value = json!({
                "message": outcome.message,
                "saldo_giorno": outcome.saldo_giorno,
                "saldo_cassa": page.balance(),
            });
            out.print(&value, || {
                format!(
                    "{}\nSaldo del giorno {}\nSaldo cassa {}",
                    outcome.message,
                    format_eur(outcome.saldo_giorno),
                    format_eur(page.balance())
                )
            })
        }
        CashCommand::Add {
            date,
            tipo,
            amount,
            descrizione,
        } => {
            let movement = ManualMovement {
                data_operazione: date.unwrap_or(today),
                tipo,
                importo: amount,
                descrizione,
            };
            let message = page.record_movement(&movement).await?;
            out.message(message, "Movimento registrato")
        }
        CashCommand::Delete { id } => {
            let message = page.delete(id).await?;
            out.message(message, "Movimento eliminato")
        }
        CashCommand::ImportCorrispettivi { file } => {
            let report = page.import_corrispettivi(&file).await?;
            out.print(&report, || {
                report
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("{} corrispettivi importati", report.imported))
            })
        }
        CashCommand::ImportPos { file } => {
            let report = page.import_pos(&file).await?;
            out.print(&report, || {
                report
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("{} incassi POS importati", report.imported))
            })
        }
    }
}

async fn run_suppliers(client: &ApiClient, out: &Output, cmd: SupplierCommand) -> GestionaleResult<()> {
    let mut page = SuppliersPage::new(client.clone());
    match cmd {
        SupplierCommand::List { search } => {
            page.refresh().await?;
            let found = page.search(search.as_deref().unwrap_or(""));
            out.print(&found, || {
                found
                    .iter()
                    .map(|s| {
                        format!(
                            "{:<13} {:<40} {}",
                            s.partita_iva,
                            s.ragione_sociale,
                            s.citta.as_deref().unwrap_or("")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        SupplierCommand::Show { piva } => {
            let detail = page.detail(&piva).await?;
            let value = json!({
                "partita_iva": detail.partita_iva,
                "stats": detail.stats,
                "fatture": detail.invoices,
            });
            out.print(&value, || {
                format!(
                    "{}: {} fatture, totale {}, ultima {}\n{}",
                    detail.partita_iva,
                    detail.stats.totale_fatture,
                    format_eur(detail.stats.totale_importo),
                    format_date(detail.stats.ultima_fattura),
                    invoice_table(&detail.invoices)
                )
            })
        }
        SupplierCommand::Add(args) => {
            let message = page.create(&args.into()).await?;
            out.message(message, "Fornitore creato")
        }
        SupplierCommand::Update(args) => {
            let message = page.update(&args.into()).await?;
            out.message(message, "Fornitore aggiornato")
        }
        SupplierCommand::Delete { piva } => {
            let message = page.delete(&piva).await?;
            out.message(message, "Fornitore eliminato")
        }
    }
}

async fn run_employees(client: &ApiClient, out: &Output, cmd: EmployeeCommand) -> GestionaleResult<()> {
    let mut page = EmployeesPage::new(client.clone());
    match cmd {
        EmployeeCommand::List => {
            page.refresh().await?;
            out.print(page.employees(), || {
                let mut lines: Vec<String> = page
                    .employees()
                    .iter()
                    .map(|e| {
                        format!(
                            "{:>6}  {:<30} {:<20} {:>12}",
                            e.id,
                            e.full_name(),
                            e.mansione.as_deref().unwrap_or("-"),
                            format_eur(e.retribuzione_mensile)
                        )
                    })
                    .collect();
                lines.push(format!("Costo mensile {}", format_eur(page.payroll_total())));
                lines.join("\n")
            })
        }
        EmployeeCommand::Add {
            nome,
            cognome,
            codice_fiscale,
            email,
            telefono,
            mansione,
            retribuzione,
        } => {
            let input = EmployeeInput {
                nome,
                cognome,
                codice_fiscale,
                email,
                telefono,
                mansione,
                retribuzione_mensile: retribuzione,
            };
            let message = page.create(&input).await?;
            out.message(message, "Dipendente creato")
        }
        EmployeeCommand::UploadPayslip { file } => {
            let message = page.upload_payslip(&file).await?;
            out.message(message, "Busta paga caricata")
        }
        EmployeeCommand::Payslips { id } => {
            let payslips = page.payslips(id).await?;
            out.print(&payslips, || {
                payslips
                    .iter()
                    .map(|p| {
                        format!(
                            "{:<8} lordo {} netto {}",
                            p.mese_anno.as_deref().unwrap_or("-"),
                            p.retribuzione_lorda.map(format_eur).unwrap_or_else(|| "-".to_string()),
                            p.retribuzione_netta.map(format_eur).unwrap_or_else(|| "-".to_string())
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

async fn run_portal(client: &ApiClient, out: &Output, cmd: PortalCommand) -> GestionaleResult<()> {
    match cmd {
        PortalCommand::Show { id } => {
            let portal = PayslipPortal::open(client.clone(), id).await?;
            let Some(p) = portal.payslip() else {
                return Err(GestionaleError::MissingData(format!("busta paga {}", id)));
            };
            out.print(p, || {
                let mut lines = vec![
                    format!(
                        "Busta paga {} ({})",
                        p.periodo,
                        if portal.is_paid() { "pagata" } else { "da pagare" }
                    ),
                    format!("Lordo {}", format_eur(p.retribuzione_lorda)),
                    format!("INPS {}", format_eur(p.inps_dipendente)),
                    format!("IRPEF {}", format_eur(p.irpef)),
                    format!("Netto {}", format_eur(p.netto_in_busta)),
                    format!(
                        "Disponibile dal {}, contestabile fino al {}",
                        format_date(p.data_disponibilita),
                        format_date(p.data_scadenza_contestazione)
                    ),
                ];
                if p.contestazione_scaduta {
                    lines.push("Termine di contestazione scaduto".to_string());
                } else {
                    lines.push(format!("{} giorni per contestare", p.giorni_rimanenti_contestazione));
                }
                if let Some(msg) = &p.messaggio_scadenza {
                    lines.push(msg.clone());
                }
                if !portal.is_accepted() {
                    lines.push("Da accettare prima del download".to_string());
                }
                lines.join("\n")
            })
        }
        PortalCommand::Accept { id } => {
            let mut portal = PayslipPortal::open(client.clone(), id).await?;
            let message = portal.accept().await?;
            out.message(Some(message), "")
        }
        PortalCommand::Download { id, dir } => {
            let portal = PayslipPortal::open(client.clone(), id).await?;
            let saved = portal.download_pdf(&dir).await?;
            out.message(Some(format!("Salvato {}", saved.display())), "")
        }
        PortalCommand::DisputeForm { id, dir } => {
            let portal = PayslipPortal::open(client.clone(), id).await?;
            let saved = portal.download_dispute_form(&dir).await?;
            out.message(Some(format!("Salvato {}", saved.display())), "")
        }
    }
}

async fn run_haccp(client: &ApiClient, out: &Output, cmd: HaccpCommand) -> GestionaleResult<()> {
    let mut page = HaccpPage::new(client.clone());
    let now = Local::now();
    match cmd {
        HaccpCommand::Show => {
            page.refresh().await?;
            let today = now.date_naive();
            let value = json!({
                "temperature": page.temperatures(),
                "sanificazioni": page.sanitations(),
                "libretti": page.certificates(),
                "fuori_limite": page.non_compliant_readings().len(),
                "libretti_scaduti": page.expired_certificates(today).len(),
            });
            out.print(&value, || {
                let mut lines: Vec<String> = page
                    .temperatures()
                    .iter()
                    .map(|r| {
                        format!(
                            "{} {} {:<12} {:>6} °C {}",
                            format_date(r.data_rilevazione),
                            r.ora_rilevazione.as_deref().unwrap_or("-"),
                            r.tipo,
                            r.temperatura,
                            if reading_is_compliant(r) { "" } else { "FUORI LIMITE" }
                        )
                    })
                    .collect();
                lines.extend(page.sanitations().iter().map(|s| {
                    format!(
                        "{} sanificazione {} {}",
                        format_date(s.data_sanificazione),
                        s.area,
                        s.operatore.as_deref().unwrap_or("")
                    )
                }));
                lines.extend(page.expired_certificates(today).iter().map(|c| {
                    format!(
                        "Libretto scaduto: {} ({})",
                        c.holder_name(),
                        format_date(c.data_scadenza)
                    )
                }));
                lines.join("\n")
            })
        }
        HaccpCommand::Temperature {
            tipo,
            value,
            operatore,
        } => {
            let reading = NewReading {
                tipo,
                data_rilevazione: now.date_naive(),
                ora_rilevazione: now.time(),
                temperatura: value,
                operatore,
            };
            let message = page.record_temperature(&reading).await?;
            out.message(message, "Temperatura registrata")
        }
        HaccpCommand::Sanitation {
            area,
            prodotto,
            operatore,
        } => {
            let entry = NewSanitation {
                data_sanificazione: now.date_naive(),
                area,
                prodotto_usato: prodotto,
                operatore,
            };
            let message = page.record_sanitation(&entry).await?;
            out.message(message, "Sanificazione registrata")
        }
    }
}

async fn run_warehouse(client: &ApiClient, out: &Output, cmd: WarehouseCommand) -> GestionaleResult<()> {
    let mut page = WarehousePage::new(client.clone());
    match cmd {
        WarehouseCommand::List { category } => {
            page.set_category(category).await?;
            out.print(page.products(), || {
                let mut lines: Vec<String> = page
                    .products()
                    .iter()
                    .map(|p| {
                        format!(
                            "{:<12} {:<36} {:<14} {:>8} {}",
                            p.codice_prodotto.as_deref().unwrap_or("-"),
                            p.descrizione,
                            p.categoria.as_deref().unwrap_or("-"),
                            p.quantita,
                            p.unita_misura.as_deref().unwrap_or("")
                        )
                    })
                    .collect();
                lines.push(format!("Valore magazzino {}", format_eur(page.stock_value())));
                lines.join("\n")
            })
        }
        WarehouseCommand::Add {
            codice,
            descrizione,
            categoria,
            unita,
            quantita,
            prezzo,
        } => {
            let input = ProductInput {
                codice_prodotto: codice,
                descrizione,
                categoria,
                unita_misura: unita,
                quantita,
                prezzo_acquisto: prezzo,
            };
            let message = page.create(&input).await?;
            out.message(message, "Prodotto creato")
        }
        WarehouseCommand::Populate => {
            let outcome = page.populate_from_invoices().await?;
            let created = outcome.prodotti_creati.unwrap_or(0);
            let text = outcome
                .message
                .unwrap_or_else(|| format!("Creati {} prodotti", created));
            out.print(&json!({ "message": text, "prodotti_creati": created }), || text.clone())
        }
    }
}
