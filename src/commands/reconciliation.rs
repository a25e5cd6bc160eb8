use crate::api::{ApiClient, Envelope};
use crate::commands::invoices::fetch_unpaid;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::{BankMovement, Invoice};

/// Matches bank-book lines to the invoices they pay.
pub struct ReconciliationPage {
    client: ApiClient,
    movements: Vec<BankMovement>,
    candidates: Vec<Invoice>,
}

impl ReconciliationPage {
    pub fn new(client: ApiClient) -> Self {
        ReconciliationPage {
            client,
            movements: Vec::new(),
            candidates: Vec::new(),
        }
    }

    pub fn movements(&self) -> &[BankMovement] {
        &self.movements
    }

    pub fn candidates(&self) -> &[Invoice] {
        &self.candidates
    }

    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        let query = match self.client.user_params() {
            Ok(q) => q,
            Err(e) => {
                self.movements.clear();
                self.candidates.clear();
                return Err(e);
            }
        };

        let (movements, candidates) = tokio::join!(
            self.client.get::<Envelope<Vec<BankMovement>>, _>("/api/reconciliation/", &query),
            fetch_unpaid(&self.client),
        );

        let movements = movements.and_then(|env| env.into_list("movimenti da riconciliare"));
        match (movements, candidates) {
            (Ok(movements), Ok(candidates)) => {
                self.movements = movements;
                self.candidates = candidates;
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Errore caricamento riconciliazione: {}", e);
                self.movements.clear();
                self.candidates.clear();
                Err(e)
            }
        }
    }

    /// Links a movement to an invoice. With no invoice chosen nothing is sent.
    pub async fn match_movement(
        &mut self,
        id_movimento: i64,
        id_fattura: Option<i64>,
    ) -> GestionaleResult<Option<String>> {
        let id_fattura = id_fattura
            .ok_or_else(|| GestionaleError::Validation("Seleziona una fattura".to_string()))?;

        let mut query = vec![
            ("id_movimento", id_movimento.to_string()),
            ("id_fattura", id_fattura.to_string()),
        ];
        query.extend(self.client.user_params()?);

        let envelope: Envelope<serde_json::Value> = self
            .client
            .post_form("/api/reconciliation/match", &query, crate::api::NO_QUERY)
            .await
            .map_err(|e| {
                tracing::error!("Errore durante riconciliazione: {}", e);
                e
            })?;
        let message = envelope.into_message()?;
        tracing::info!("Movimento {} riconciliato con fattura {}", id_movimento, id_fattura);
        self.refresh().await?;
        Ok(message)
    }
}
