use crate::api::{ApiClient, Envelope, NO_QUERY};
use crate::commands::payment::{InvoiceRef, PaymentForm, PaymentOutcome};
use crate::commands::utils::file_part;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::{Invoice, InvoiceLine, UploadReport};
use reqwest::multipart;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Archive tabs. The last five are the backend's payment-state buckets an
/// unpaid invoice moves through before being archived as paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceTab {
    Archiviate,
    Attive,
    Pending,
    RegisteredBank,
    RegisteredCash,
    PaidNotReconciled,
    Unmanaged,
}

impl InvoiceTab {
    pub const ALL: [InvoiceTab; 7] = [
        InvoiceTab::Archiviate,
        InvoiceTab::Attive,
        InvoiceTab::Pending,
        InvoiceTab::RegisteredBank,
        InvoiceTab::RegisteredCash,
        InvoiceTab::PaidNotReconciled,
        InvoiceTab::Unmanaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceTab::Archiviate => "archiviate",
            InvoiceTab::Attive => "attive",
            InvoiceTab::Pending => "pending",
            InvoiceTab::RegisteredBank => "registered_bank",
            InvoiceTab::RegisteredCash => "registered_cash",
            InvoiceTab::PaidNotReconciled => "paid_not_reconciled",
            InvoiceTab::Unmanaged => "unmanaged",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceTab::Archiviate => "Archiviate",
            InvoiceTab::Attive => "Attive",
            InvoiceTab::Pending => "In Attesa",
            InvoiceTab::RegisteredBank => "Banca",
            InvoiceTab::RegisteredCash => "Cassa",
            InvoiceTab::PaidNotReconciled => "Non Riconciliate",
            InvoiceTab::Unmanaged => "Non Gestite",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw))
    }

    /// Tabs served by `/api/invoices/by-state/{state}`.
    pub fn state_bucket(&self) -> Option<&'static str> {
        match self {
            InvoiceTab::Archiviate | InvoiceTab::Attive => None,
            other => Some(other.as_str()),
        }
    }

    fn path_and_query(&self, user_id: i64) -> (String, Vec<(&'static str, String)>) {
        let mut query = vec![("id_utente", user_id.to_string())];
        match self.state_bucket() {
            Some(state) => (format!("/api/invoices/by-state/{}", state), query),
            None => {
                if *self == InvoiceTab::Attive {
                    query.push(("status", "active".to_string()));
                    query.push(("pagata", "false".to_string()));
                } else {
                    query.push(("pagata", "true".to_string()));
                }
                ("/api/invoices/".to_string(), query)
            }
        }
    }
}

impl fmt::Display for InvoiceTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub async fn fetch_invoices(client: &ApiClient, tab: InvoiceTab) -> GestionaleResult<Vec<Invoice>> {
    let (path, query) = tab.path_and_query(client.user_id()?);
    let envelope: Envelope<Vec<Invoice>> = client.get(&path, &query).await?;
    envelope.into_list("fatture")
}

/// Every invoice not yet paid, whatever its state bucket.
pub async fn fetch_unpaid(client: &ApiClient) -> GestionaleResult<Vec<Invoice>> {
    let mut query = client.user_params()?;
    query.push(("pagata", "false".to_string()));
    let envelope: Envelope<Vec<Invoice>> = client.get("/api/invoices/", &query).await?;
    envelope.into_list("fatture da pagare")
}

pub fn total_of(invoices: &[Invoice]) -> Decimal {
    invoices.iter().map(|f| f.totale).sum()
}

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    suggested: bool,
    data: Option<Invoice>,
}

pub struct ArchivePage {
    client: ApiClient,
    tab: InvoiceTab,
    invoices: Vec<Invoice>,
}

impl ArchivePage {
    pub fn new(client: ApiClient) -> Self {
        ArchivePage {
            client,
            tab: InvoiceTab::Attive,
            invoices: Vec::new(),
        }
    }

    pub fn tab(&self) -> InvoiceTab {
        self.tab
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn total(&self) -> Decimal {
        total_of(&self.invoices)
    }

    pub async fn set_tab(&mut self, tab: InvoiceTab) -> GestionaleResult<()> {
        self.tab = tab;
        self.refresh().await
    }

    /// On failure the page shows an empty list and the error is returned.
    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        match fetch_invoices(&self.client, self.tab).await {
            Ok(invoices) => {
                tracing::debug!("{} fatture in {}", invoices.len(), self.tab.as_str());
                self.invoices = invoices;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Errore caricamento fatture ({}): {}", self.tab.as_str(), e);
                self.invoices.clear();
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, id: i64) -> GestionaleResult<Option<String>> {
        let query = self.client.user_params()?;
        let envelope: Envelope<serde_json::Value> = self
            .client
            .delete(&format!("/api/invoices/{}", id), &query)
            .await
            .map_err(|e| {
                tracing::error!("Errore eliminazione fattura {}: {}", id, e);
                e
            })?;
        let message = envelope.into_message()?;
        tracing::info!("Fattura {} eliminata", id);
        self.refresh().await?;
        Ok(message)
    }

    /// Opens the payment form for a listed invoice that is still unpaid.
    pub fn open_payment(&self, id: i64) -> GestionaleResult<PaymentForm> {
        let invoice = self
            .invoices
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| GestionaleError::Validation(format!("Fattura {} non trovata", id)))?;
        if invoice.pagata {
            return Err(GestionaleError::Validation(format!(
                "Fattura {} già pagata",
                invoice.numero_fattura
            )));
        }
        Ok(PaymentForm::new(self.client.clone(), InvoiceRef::from(invoice)))
    }

    pub async fn complete_payment(&mut self, form: &mut PaymentForm) -> GestionaleResult<PaymentOutcome> {
        let outcome = form.submit().await?;
        self.refresh().await?;
        Ok(outcome)
    }

    pub async fn upload_xml(&mut self, files: &[PathBuf]) -> GestionaleResult<UploadReport> {
        if files.is_empty() {
            return Err(GestionaleError::Validation(
                "Seleziona almeno un file XML".to_string(),
            ));
        }
        let user_id = self.client.user_id()?;
        let mut form = multipart::Form::new().text("id_utente", user_id.to_string());
        for path in files {
            form = form.part("files", file_part(path).await?);
        }

        let report: UploadReport = self
            .client
            .post_multipart("/api/invoices/upload-bulk", NO_QUERY, form)
            .await
            .map_err(|e| {
                tracing::error!("Errore upload fatture: {}", e);
                e
            })?;
        tracing::info!(
            "Upload completato: {} caricate, {} errori",
            report.uploaded,
            report.errors
        );
        self.refresh().await?;
        Ok(report)
    }

    pub async fn lines(&self, id: i64) -> GestionaleResult<Vec<InvoiceLine>> {
        let query = self.client.user_params()?;
        let envelope: Envelope<Vec<InvoiceLine>> = self
            .client
            .get(&format!("/api/invoices/{}/righe", id), &query)
            .await?;
        envelope.into_list("righe fattura")
    }

    /// Invoice the backend would link to the given transfer, if any.
    pub async fn suggest_transfer_match(&self, id_bonifico: i64) -> GestionaleResult<Option<Invoice>> {
        let query = self.client.user_params()?;
        let form = [("id_bonifico", id_bonifico.to_string())];
        let response: SuggestionResponse = self
            .client
            .post_form("/api/invoices/suggest-payment-match", &query, &form)
            .await?;
        if !response.suggested {
            return Ok(None);
        }
        Ok(response.data)
    }
}
