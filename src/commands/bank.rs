use crate::api::{ApiClient, Envelope, NO_QUERY};
use crate::commands::utils::parse_date;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::BankTransfer;
use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub data_bonifico: NaiveDate,
    pub importo: Decimal,
    pub beneficiario: String,
    pub causale: Option<String>,
}

impl NewTransfer {
    pub fn parse(data: &str, importo: Decimal, beneficiario: &str, causale: Option<&str>) -> GestionaleResult<Self> {
        let transfer = NewTransfer {
            data_bonifico: parse_date(data)?,
            importo,
            beneficiario: beneficiario.trim().to_string(),
            causale: causale.map(str::trim).filter(|c| !c.is_empty()).map(String::from),
        };
        transfer.validate()?;
        Ok(transfer)
    }

    pub fn validate(&self) -> GestionaleResult<()> {
        if self.beneficiario.is_empty() {
            return Err(GestionaleError::Validation("Inserisci il beneficiario".to_string()));
        }
        if self.importo <= Decimal::ZERO {
            return Err(GestionaleError::Validation(
                "L'importo deve essere maggiore di zero".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct TransfersPage {
    client: ApiClient,
    linked: Option<bool>,
    transfers: Vec<BankTransfer>,
}

impl TransfersPage {
    pub fn new(client: ApiClient) -> Self {
        TransfersPage {
            client,
            linked: None,
            transfers: Vec::new(),
        }
    }

    pub fn transfers(&self) -> &[BankTransfer] {
        &self.transfers
    }

    pub fn total(&self) -> Decimal {
        self.transfers.iter().map(|t| t.importo).sum()
    }

    pub fn unlinked_count(&self) -> usize {
        self.transfers.iter().filter(|t| !t.collegato).count()
    }

    pub async fn set_linked_filter(&mut self, linked: Option<bool>) -> GestionaleResult<()> {
        self.linked = linked;
        self.refresh().await
    }

    async fn fetch(&self) -> GestionaleResult<Vec<BankTransfer>> {
        let mut query = self.client.user_params()?;
        if let Some(linked) = self.linked {
            query.push(("collegato", linked.to_string()));
        }
        let envelope: Envelope<Vec<BankTransfer>> = self.client.get("/api/bank/", &query).await?;
        envelope.into_list("bonifici")
    }

    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        match self.fetch().await {
            Ok(transfers) => {
                self.transfers = transfers;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Errore caricamento bonifici: {}", e);
                self.transfers.clear();
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, transfer: &NewTransfer) -> GestionaleResult<Option<String>> {
        transfer.validate()?;
        let mut form = self.client.user_params()?;
        form.push(("data_bonifico", transfer.data_bonifico.format("%Y-%m-%d").to_string()));
        form.push(("importo", transfer.importo.to_string()));
        form.push(("beneficiario", transfer.beneficiario.clone()));
        if let Some(causale) = &transfer.causale {
            form.push(("causale", causale.clone()));
        }

        let envelope: Envelope<serde_json::Value> = self
            .client
            .post_form("/api/bank/", NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore creazione bonifico: {}", e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }
}
