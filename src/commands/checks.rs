use crate::api::{ApiClient, Envelope, Params};
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::{Check, CheckStats, CheckStatus};

pub const MAX_CARNET_SIZE: u32 = 50;

#[derive(Debug, Clone, Default)]
pub struct CarnetRequest {
    pub banca: String,
    pub numero_inizio: String,
    pub quantita: u32,
}

impl CarnetRequest {
    pub fn validate(&self) -> GestionaleResult<u64> {
        if self.banca.trim().is_empty() {
            return Err(GestionaleError::Validation("Inserisci la banca".to_string()));
        }
        let start = self
            .numero_inizio
            .trim()
            .parse::<u64>()
            .map_err(|_| GestionaleError::Validation("Numero iniziale non valido".to_string()))?;
        if self.quantita == 0 || self.quantita > MAX_CARNET_SIZE {
            return Err(GestionaleError::Validation(format!(
                "La quantità deve essere tra 1 e {}",
                MAX_CARNET_SIZE
            )));
        }
        Ok(start)
    }

    /// Numbers the carnet will contain, e.g. 1001..=1025.
    pub fn numbers(&self) -> GestionaleResult<Vec<String>> {
        let start = self.validate()?;
        Ok((0..self.quantita as u64)
            .map(|i| (start + i).to_string())
            .collect())
    }
}

pub struct ChecksPage {
    client: ApiClient,
    checks: Vec<Check>,
    stats: CheckStats,
    filter: Option<CheckStatus>,
}

impl ChecksPage {
    pub fn new(client: ApiClient) -> Self {
        ChecksPage {
            client,
            checks: Vec::new(),
            stats: CheckStats::default(),
            filter: None,
        }
    }

    pub fn stats(&self) -> &CheckStats {
        &self.stats
    }

    pub fn all(&self) -> &[Check] {
        &self.checks
    }

    pub fn filter(&self) -> Option<CheckStatus> {
        self.filter
    }

    /// Filtering is local; no request is made.
    pub fn set_filter(&mut self, filter: Option<CheckStatus>) {
        self.filter = filter;
    }

    pub fn visible(&self) -> Vec<&Check> {
        self.checks
            .iter()
            .filter(|c| self.filter.map_or(true, |s| c.stato == s))
            .collect()
    }

    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        let query = match self.client.user_params() {
            Ok(q) => q,
            Err(e) => {
                self.checks.clear();
                self.stats = CheckStats::default();
                return Err(e);
            }
        };

        let (list, stats) = tokio::join!(
            self.client.get::<Envelope<Vec<Check>>, _>("/api/checks/", &query),
            self.client.get::<Envelope<CheckStats>, _>("/api/checks/stats", &query),
        );

        let result = list
            .and_then(|env| env.into_list("assegni"))
            .and_then(|checks| Ok((checks, stats?.into_data("statistiche assegni")?)));

        match result {
            Ok((checks, stats)) => {
                self.checks = checks;
                self.stats = stats;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Errore caricamento assegni: {}", e);
                self.checks.clear();
                self.stats = CheckStats::default();
                Err(e)
            }
        }
    }

    pub async fn create_carnet(&mut self, request: &CarnetRequest) -> GestionaleResult<Option<String>> {
        let start = request.validate()?;
        let user_id = self.client.user_id()?;
        let form: Params = vec![
            ("id_utente", user_id.to_string()),
            ("banca", request.banca.trim().to_string()),
            ("numero_inizio", start.to_string()),
            ("quantita", request.quantita.to_string()),
        ];

        let envelope: Envelope<serde_json::Value> = self
            .client
            .post_form("/api/checks/batch-create", crate::api::NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore creazione carnet: {}", e);
                e
            })?;
        let message = envelope.into_message()?;
        tracing::info!(
            "Carnet {} creato: {} assegni da {}",
            request.banca,
            request.quantita,
            start
        );
        self.refresh().await?;
        Ok(message)
    }

    /// Only issued cheques can be cashed.
    pub async fn mark_cashed(&mut self, id: i64) -> GestionaleResult<Option<String>> {
        let check = self
            .checks
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| GestionaleError::Validation(format!("Assegno {} non trovato", id)))?;
        if check.stato != CheckStatus::Emesso {
            return Err(GestionaleError::Validation(format!(
                "L'assegno {} non è emesso (stato: {})",
                check.numero,
                check.stato.as_str()
            )));
        }

        let query = self.client.user_params()?;
        let envelope: Envelope<serde_json::Value> = self
            .client
            .post_form(
                &format!("/api/checks/{}/mark-incassato", id),
                &query,
                crate::api::NO_QUERY,
            )
            .await
            .map_err(|e| {
                tracing::error!("Errore incasso assegno {}: {}", id, e);
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
            .delete(&format!("/api/checks/{}", id), &query)
            .await
            .map_err(|e| {
                tracing::error!("Errore eliminazione assegno {}: {}", id, e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }
}
