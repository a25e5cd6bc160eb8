use crate::api::{ApiClient, Envelope, Params, NO_QUERY};
use crate::commands::utils::file_part;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::{CashBalance, CashMovement, ImportReport};
use chrono::NaiveDate;
use reqwest::multipart;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// End-of-day figures for the cash book.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClosure {
    pub data: NaiveDate,
    pub corrispettivi: Decimal,
    pub pos: Decimal,
    pub versamento: Decimal,
    pub note: Option<String>,
}

impl DailyClosure {
    pub fn new(data: NaiveDate) -> Self {
        DailyClosure {
            data,
            corrispettivi: Decimal::ZERO,
            pos: Decimal::ZERO,
            versamento: Decimal::ZERO,
            note: None,
        }
    }

    /// Cash left in the drawer: takings minus card payments minus the bank deposit.
    pub fn closing_balance(&self) -> Decimal {
        self.corrispettivi - self.pos - self.versamento
    }

    pub fn validate(&self) -> GestionaleResult<()> {
        let amounts = [
            ("corrispettivi", self.corrispettivi),
            ("pos", self.pos),
            ("versamento", self.versamento),
        ];
        for (name, amount) in amounts {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(GestionaleError::Validation(format!(
                    "Importo {} non può essere negativo",
                    name
                )));
            }
        }
        Ok(())
    }

    fn form_fields(&self, user_id: i64) -> Params {
        let mut fields: Params = vec![
            ("id_utente", user_id.to_string()),
            ("data", self.data.format("%Y-%m-%d").to_string()),
            ("corrispettivi", self.corrispettivi.to_string()),
            ("pos", self.pos.to_string()),
            ("versamento", self.versamento.to_string()),
        ];
        if let Some(note) = self.note.as_deref().filter(|n| !n.trim().is_empty()) {
            fields.push(("note", note.trim().to_string()));
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManualMovement {
    pub data_operazione: NaiveDate,
    pub tipo: String,
    pub importo: Decimal,
    pub descrizione: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClosureResponse {
    #[serde(default = "crate::models::default_true")]
    success: bool,
    message: Option<String>,
    saldo_cassa: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureOutcome {
    pub message: String,
    pub saldo_giorno: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct CashFilter {
    pub data_inizio: Option<NaiveDate>,
    pub data_fine: Option<NaiveDate>,
    pub tipo: Option<String>,
}

pub async fn fetch_balance(client: &ApiClient) -> GestionaleResult<CashBalance> {
    let query = client.user_params()?;
    let balance: CashBalance = client.get("/api/cash-register/saldo", &query).await?;
    if !balance.success {
        return Err(GestionaleError::Rejected("saldo cassa".to_string()));
    }
    Ok(balance)
}

pub struct CashRegisterPage {
    client: ApiClient,
    filter: CashFilter,
    movements: Vec<CashMovement>,
    balance: Decimal,
}

impl CashRegisterPage {
    pub fn new(client: ApiClient) -> Self {
        CashRegisterPage {
            client,
            filter: CashFilter::default(),
            movements: Vec::new(),
            balance: Decimal::ZERO,
        }
    }

    pub fn movements(&self) -> &[CashMovement] {
        &self.movements
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn income(&self) -> Decimal {
        self.movements
            .iter()
            .filter(|m| m.importo.is_sign_positive())
            .map(|m| m.importo)
            .sum()
    }

    pub fn outgoings(&self) -> Decimal {
        self.movements
            .iter()
            .filter(|m| m.importo.is_sign_negative())
            .map(|m| m.importo.abs())
            .sum()
    }

    pub async fn set_filter(&mut self, filter: CashFilter) -> GestionaleResult<()> {
        self.filter = filter;
        self.refresh().await
    }

    fn list_query(&self) -> GestionaleResult<Params> {
        let mut query = self.client.user_params()?;
        if let Some(d) = self.filter.data_inizio {
            query.push(("data_inizio", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = self.filter.data_fine {
            query.push(("data_fine", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(tipo) = self.filter.tipo.as_deref().filter(|t| !t.is_empty()) {
            query.push(("tipo", tipo.to_string()));
        }
        Ok(query)
    }

    /// Reloads movements and balance together.
    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        let query = match self.list_query() {
            Ok(q) => q,
            Err(e) => {
                self.movements.clear();
                self.balance = Decimal::ZERO;
                return Err(e);
            }
        };

        let (movements, balance) = tokio::join!(
            self.client.get::<Envelope<Vec<CashMovement>>, _>("/api/cash-register/", &query),
            fetch_balance(&self.client),
        );
        let movements = movements.and_then(|env| env.into_list("movimenti cassa"));

        match (movements, balance) {
            (Ok(movements), Ok(balance)) => {
                self.movements = movements;
                self.balance = balance.saldo;
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Errore caricamento prima nota cassa: {}", e);
                self.movements.clear();
                self.balance = Decimal::ZERO;
                Err(e)
            }
        }
    }

    pub async fn close_day(&mut self, closure: &DailyClosure) -> GestionaleResult<ClosureOutcome> {
        closure.validate()?;
        let fields = closure.form_fields(self.client.user_id()?);

        let response: ClosureResponse = self
            .client
            .post_form("/api/cash-register/chiusura-giornaliera", NO_QUERY, &fields)
            .await
            .map_err(|e| {
                tracing::error!("Errore durante la chiusura: {}", e);
                e
            })?;
        if !response.success {
            return Err(GestionaleError::Rejected(response.message.unwrap_or_default()));
        }

        let expected = closure.closing_balance();
        if let Some(saldo) = response.saldo_cassa {
            if saldo.round_dp(2) != expected.round_dp(2) {
                tracing::warn!("Saldo chiusura dal server {} diverso da {}", saldo, expected);
            }
        }
        tracing::info!("Chiusura {} registrata, saldo {}", closure.data, expected);

        self.refresh().await?;
        Ok(ClosureOutcome {
            message: response
                .message
                .unwrap_or_else(|| "Chiusura registrata con successo!".to_string()),
            saldo_giorno: expected,
        })
    }

    pub async fn record_movement(&mut self, movement: &ManualMovement) -> GestionaleResult<Option<String>> {
        if movement.tipo.trim().is_empty() {
            return Err(GestionaleError::Validation("Seleziona il tipo di movimento".to_string()));
        }
        let mut form = self.client.user_params()?;
        form.push(("data_operazione", movement.data_operazione.format("%Y-%m-%d").to_string()));
        form.push(("tipo", movement.tipo.trim().to_string()));
        form.push(("importo", movement.importo.to_string()));
        if let Some(descrizione) = &movement.descrizione {
            form.push(("descrizione", descrizione.clone()));
        }

        let envelope: Envelope<CashMovement> = self
            .client
            .post_form("/api/cash-register/", NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore registrazione movimento: {}", e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    pub async fn delete(&mut self, id: i64) -> GestionaleResult<Option<String>> {
        let query = self.client.user_params()?;
        let envelope: Envelope<serde_json::Value> = self
            .client
            .delete(&format!("/api/cash-register/{}", id), &query)
            .await
            .map_err(|e| {
                tracing::error!("Errore eliminazione movimento {}: {}", id, e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    pub async fn import_corrispettivi(&mut self, file: &Path) -> GestionaleResult<ImportReport> {
        self.import("/api/cash-register/import-corrispettivi", file).await
    }

    pub async fn import_pos(&mut self, file: &Path) -> GestionaleResult<ImportReport> {
        self.import("/api/cash-register/import-pos", file).await
    }

    async fn import(&mut self, path: &str, file: &Path) -> GestionaleResult<ImportReport> {
        let form = multipart::Form::new()
            .text("id_utente", self.client.user_id()?.to_string())
            .part("file", file_part(file).await?);
        let report: ImportReport = self
            .client
            .post_multipart(path, NO_QUERY, form)
            .await
            .map_err(|e| {
                tracing::error!("Errore durante import {}: {}", path, e);
                e
            })?;
        if !report.success {
            return Err(GestionaleError::Rejected(report.message.unwrap_or_default()));
        }
        self.refresh().await?;
        Ok(report)
    }
}
