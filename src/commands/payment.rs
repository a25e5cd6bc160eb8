//! Registration of a payment against an unpaid invoice.
//!
//! A [`PaymentForm`] is opened from the invoice archive for one invoice. The
//! user picks one of the four payment methods; cheques must be bound to a
//! cheque that is still available, bank transfers may optionally be bound to
//! a transfer that is not linked yet. Submitting marks the invoice paid on the
//! backend, which records the movement in the matching ledger and moves the
//! invoice out of the unpaid bucket.

use crate::api::{ApiClient, Envelope, Params};
use crate::commands::utils::format_eur;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::{BankTransfer, Check, CheckStatus, Invoice};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MSG_NO_METHOD: &str = "Seleziona un metodo di pagamento";
pub const MSG_NO_CHECK: &str = "Seleziona un assegno";
pub const MSG_UNLINKED_TRANSFER: &str = "Seleziona un bonifico o procedi senza collegamento";
const MSG_PAYMENT_DONE: &str = "Pagamento registrato con successo!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cassa,
    BancaBonifico,
    BancaRid,
    Assegno,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cassa,
        PaymentMethod::BancaBonifico,
        PaymentMethod::BancaRid,
        PaymentMethod::Assegno,
    ];

    /// Wire value of the `metodo` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cassa => "cassa",
            PaymentMethod::BancaBonifico => "banca_bonifico",
            PaymentMethod::BancaRid => "banca_rid",
            PaymentMethod::Assegno => "assegno",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cassa => "Cassa",
            PaymentMethod::BancaBonifico => "Bonifico",
            PaymentMethod::BancaRid => "RID Bancario",
            PaymentMethod::Assegno => "Assegno",
        }
    }

    pub fn ledger(&self) -> Ledger {
        match self {
            PaymentMethod::Cassa => Ledger::Cassa,
            _ => Ledger::Banca,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Book in which the backend records the payment movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ledger {
    Cassa,
    Banca,
}

impl Ledger {
    pub fn label(&self) -> &'static str {
        match self {
            Ledger::Cassa => "Prima Nota Cassa",
            Ledger::Banca => "Prima Nota Banca",
        }
    }
}

/// Warnings that do not block submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentNotice {
    UnlinkedTransfer,
}

impl PaymentNotice {
    pub fn message(&self) -> &'static str {
        match self {
            PaymentNotice::UnlinkedTransfer => MSG_UNLINKED_TRANSFER,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRef {
    pub id: i64,
    pub numero_fattura: String,
    pub totale: Decimal,
}

impl From<&Invoice> for InvoiceRef {
    fn from(invoice: &Invoice) -> Self {
        InvoiceRef {
            id: invoice.id,
            numero_fattura: invoice.numero_fattura.clone(),
            totale: invoice.totale,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub message: String,
    pub notices: Vec<PaymentNotice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSummary {
    pub numero_fattura: String,
    pub amount: Decimal,
    pub method: Option<PaymentMethod>,
    pub ledger: Option<Ledger>,
}

impl fmt::Display for PaymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fattura {} - {}", self.numero_fattura, format_eur(self.amount))?;
        if let (Some(method), Some(ledger)) = (self.method, self.ledger) {
            write!(f, " - {} ({})", method.label(), ledger.label())?;
        }
        Ok(())
    }
}

/// Holds the in-flight flag for the duration of a request. Dropping it,
/// including when the submit future is cancelled, clears the flag.
struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a mut bool) -> Self {
        *flag = true;
        InFlight(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[derive(Debug)]
pub struct PaymentForm {
    client: ApiClient,
    invoice: InvoiceRef,
    method: Option<PaymentMethod>,
    payment_date: NaiveDate,
    note: String,
    available_checks: Vec<Check>,
    unlinked_transfers: Vec<BankTransfer>,
    selected_check: Option<i64>,
    selected_transfer: Option<i64>,
    in_flight: bool,
}

impl PaymentForm {
    pub fn new(client: ApiClient, invoice: InvoiceRef) -> Self {
        PaymentForm {
            client,
            invoice,
            method: None,
            payment_date: chrono::Local::now().date_naive(),
            note: String::new(),
            available_checks: Vec::new(),
            unlinked_transfers: Vec::new(),
            selected_check: None,
            selected_transfer: None,
            in_flight: false,
        }
    }

    pub fn invoice(&self) -> &InvoiceRef {
        &self.invoice
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    pub fn payment_date(&self) -> NaiveDate {
        self.payment_date
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn available_checks(&self) -> &[Check] {
        &self.available_checks
    }

    pub fn unlinked_transfers(&self) -> &[BankTransfer] {
        &self.unlinked_transfers
    }

    pub fn selected_check(&self) -> Option<i64> {
        self.selected_check
    }

    pub fn selected_transfer(&self) -> Option<i64> {
        self.selected_transfer
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn set_payment_date(&mut self, date: NaiveDate) {
        self.payment_date = date;
    }

    pub fn set_note(&mut self, note: &str) {
        self.note = note.to_string();
    }

    /// Switches method and loads the instruments it can be bound to.
    /// A selection that belongs to another method is dropped.
    pub async fn select_method(&mut self, method: PaymentMethod) {
        self.method = Some(method);
        if method != PaymentMethod::Assegno {
            self.selected_check = None;
        }
        if method != PaymentMethod::BancaBonifico {
            self.selected_transfer = None;
        }

        match method {
            PaymentMethod::Assegno => self.load_checks().await,
            PaymentMethod::BancaBonifico => self.load_transfers().await,
            _ => {}
        }
    }

    async fn load_checks(&mut self) {
        match self.fetch_options::<Check>("assegni").await {
            Ok(checks) => {
                self.available_checks = checks
                    .into_iter()
                    .filter(|c| c.stato == CheckStatus::Disponibile)
                    .collect();
            }
            Err(e) => {
                tracing::error!("Errore caricamento assegni: {}", e);
                self.available_checks.clear();
            }
        }
        if let Some(id) = self.selected_check {
            if !self.available_checks.iter().any(|c| c.id == id) {
                self.selected_check = None;
            }
        }
    }

    async fn load_transfers(&mut self) {
        match self.fetch_options::<BankTransfer>("bonifici").await {
            Ok(transfers) => self.unlinked_transfers = transfers,
            Err(e) => {
                tracing::error!("Errore caricamento bonifici: {}", e);
                self.unlinked_transfers.clear();
            }
        }
        if let Some(id) = self.selected_transfer {
            if !self.unlinked_transfers.iter().any(|t| t.id == id) {
                self.selected_transfer = None;
            }
        }
    }

    async fn fetch_options<T>(&self, kind: &str) -> GestionaleResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let query = self.client.user_params()?;
        let path = format!("/api/invoices/payment-options/{}", kind);
        let envelope: Envelope<Vec<T>> = self.client.get(&path, &query).await?;
        envelope.into_list(kind)
    }

    pub fn select_check(&mut self, id: i64) -> GestionaleResult<()> {
        if !self.available_checks.iter().any(|c| c.id == id) {
            return Err(GestionaleError::Validation(format!(
                "Assegno {} non disponibile",
                id
            )));
        }
        self.selected_check = Some(id);
        Ok(())
    }

    /// `None` means "proceed without linking a transfer".
    pub fn select_transfer(&mut self, id: Option<i64>) -> GestionaleResult<()> {
        if let Some(id) = id {
            if !self.unlinked_transfers.iter().any(|t| t.id == id) {
                return Err(GestionaleError::Validation(format!(
                    "Bonifico {} non disponibile",
                    id
                )));
            }
        }
        self.selected_transfer = id;
        Ok(())
    }

    pub fn validate(&self) -> GestionaleResult<Vec<PaymentNotice>> {
        let method = self
            .method
            .ok_or_else(|| GestionaleError::Validation(MSG_NO_METHOD.to_string()))?;

        let mut notices = Vec::new();
        match method {
            PaymentMethod::Assegno => {
                let id = self
                    .selected_check
                    .ok_or_else(|| GestionaleError::Validation(MSG_NO_CHECK.to_string()))?;
                if !self.available_checks.iter().any(|c| c.id == id) {
                    return Err(GestionaleError::Validation(MSG_NO_CHECK.to_string()));
                }
            }
            PaymentMethod::BancaBonifico if self.selected_transfer.is_none() => {
                notices.push(PaymentNotice::UnlinkedTransfer);
            }
            _ => {}
        }
        Ok(notices)
    }

    pub fn can_submit(&self) -> bool {
        match self.method {
            None => false,
            Some(_) if self.in_flight => false,
            Some(PaymentMethod::Assegno) => self.selected_check.is_some(),
            Some(_) => true,
        }
    }

    fn form_fields(&self, method: PaymentMethod) -> Params {
        let mut fields: Params = vec![
            ("metodo", method.as_str().to_string()),
            ("data_pagamento", self.payment_date.format("%Y-%m-%d").to_string()),
        ];
        let note = self.note.trim();
        if !note.is_empty() {
            fields.push(("note", note.to_string()));
        }
        if method == PaymentMethod::Assegno {
            if let Some(id) = self.selected_check {
                fields.push(("id_assegno", id.to_string()));
            }
        }
        if method == PaymentMethod::BancaBonifico {
            if let Some(id) = self.selected_transfer {
                fields.push(("id_bonifico", id.to_string()));
            }
        }
        fields
    }

    /// Marks the invoice paid. Validation failures return before any request;
    /// on a failed request the form keeps every field so it can be retried.
    pub async fn submit(&mut self) -> GestionaleResult<PaymentOutcome> {
        if self.in_flight {
            return Err(GestionaleError::Validation(
                "Registrazione pagamento già in corso".to_string(),
            ));
        }
        let notices = self.validate()?;
        let method = self
            .method
            .ok_or_else(|| GestionaleError::Validation(MSG_NO_METHOD.to_string()))?;
        for notice in &notices {
            tracing::warn!("Fattura {}: {}", self.invoice.numero_fattura, notice.message());
        }

        let query = self.client.user_params()?;
        let fields = self.form_fields(method);
        let path = format!("/api/invoices/{}/mark-paid", self.invoice.id);

        let result: GestionaleResult<Envelope<serde_json::Value>> = {
            let _in_flight = InFlight::enter(&mut self.in_flight);
            self.client.post_form(&path, &query, &fields).await
        };

        let message = match result.and_then(|envelope| envelope.into_message()) {
            Ok(message) => message.unwrap_or_else(|| MSG_PAYMENT_DONE.to_string()),
            Err(e) => {
                tracing::error!("Errore registrazione pagamento: {}", e);
                return Err(e);
            }
        };

        tracing::info!(
            "Fattura {} pagata con {} in {}",
            self.invoice.numero_fattura,
            method.as_str(),
            method.ledger().label()
        );
        Ok(PaymentOutcome { message, notices })
    }

    pub fn summary(&self) -> PaymentSummary {
        PaymentSummary {
            numero_fattura: self.invoice.numero_fattura.clone(),
            amount: self.invoice.totale,
            method: self.method,
            ledger: self.method.map(|m| m.ledger()),
        }
    }
}
