use crate::api::{ApiClient, NO_QUERY};
use crate::commands::utils::format_eur;
use crate::error::GestionaleResult;
use crate::models::{EmailBotReport, HrStatistics};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct HrDashboard {
    pub stats: HrStatistics,
}

impl HrDashboard {
    /// Warning shown while payslips are still waiting to be paid.
    pub fn payment_alert(&self) -> Option<String> {
        if self.stats.buste_paga_da_pagare == 0 {
            return None;
        }
        Some(format!(
            "Ci sono {} buste paga da pagare per un totale di {}",
            self.stats.buste_paga_da_pagare,
            format_eur(self.stats.importo_da_pagare)
        ))
    }
}

/// HR figures. The body is the statistics object itself, without an envelope.
pub async fn overview(client: &ApiClient) -> GestionaleResult<HrDashboard> {
    let stats: HrStatistics = client.get("/api/hr/statistics", NO_QUERY).await.map_err(|e| {
        tracing::error!("Errore caricamento statistiche HR: {}", e);
        e
    })?;
    Ok(HrDashboard { stats })
}

impl fmt::Display for EmailBotReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email Bot: {} importate, {} skippate", self.imported, self.skipped)
    }
}

/// Runs the payslip mailbox import now instead of waiting for the schedule.
pub async fn run_email_bot(client: &ApiClient) -> GestionaleResult<EmailBotReport> {
    let report: EmailBotReport = client
        .post_json("/api/hr/email-bot/run", NO_QUERY, &serde_json::json!({}))
        .await
        .map_err(|e| {
            tracing::error!("Errore esecuzione email bot: {}", e);
            e
        })?;
    tracing::info!("{}", report);
    Ok(report)
}
