use crate::api::{ApiClient, Envelope, NO_QUERY};
use crate::commands::vat::validate_period;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::IncomeStatement;
use rust_decimal::Decimal;
use serde::Deserialize;

impl IncomeStatement {
    /// Revenues minus costs; the backend figure wins when present.
    pub fn result(&self) -> Decimal {
        self.utile_perdita
            .unwrap_or(self.ricavi.totale - self.costi.totale)
    }

    pub fn result_label(&self) -> &'static str {
        if self.result() < Decimal::ZERO {
            "perdita"
        } else {
            "utile"
        }
    }
}

#[derive(Debug, Deserialize)]
struct PopulateAccountsResponse {
    #[serde(default = "crate::models::default_true")]
    success: bool,
    message: Option<String>,
    conti_creati: Option<u32>,
}

pub async fn income_statement(client: &ApiClient, anno: i32) -> GestionaleResult<IncomeStatement> {
    validate_period(1, anno)?;
    let mut query = client.user_params()?;
    query.push(("anno", anno.to_string()));

    let envelope: Envelope<IncomeStatement> = client
        .get("/api/contabilita/bilancio/conto-economico", &query)
        .await
        .map_err(|e| {
            tracing::error!("Errore conto economico {}: {}", anno, e);
            e
        })?;
    let mut statement = envelope.into_data("conto economico")?;
    statement.anno.get_or_insert(anno);
    Ok(statement)
}

/// Seeds the standard chart of accounts; returns how many accounts were created.
pub async fn populate_chart_of_accounts(client: &ApiClient) -> GestionaleResult<(Option<String>, u32)> {
    let form = client.user_params()?;
    let response: PopulateAccountsResponse = client
        .post_form("/api/contabilita/popola-piano-conti", NO_QUERY, &form)
        .await
        .map_err(|e| {
            tracing::error!("Errore popolamento piano dei conti: {}", e);
            e
        })?;
    if !response.success {
        return Err(GestionaleError::Rejected(response.message.unwrap_or_default()));
    }
    Ok((response.message, response.conti_creati.unwrap_or(0)))
}
