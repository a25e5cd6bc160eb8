use crate::api::{ApiClient, Envelope};
use crate::error::GestionaleResult;
use crate::models::{Activity, AnalyticsStats, DashboardStats, QuickAction};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub quick_actions: Vec<QuickAction>,
}

/// Home page figures: month totals, payables, cash balance and pending actions.
pub async fn overview(client: &ApiClient) -> GestionaleResult<DashboardOverview> {
    let query = client.user_params()?;
    let (stats, actions) = tokio::try_join!(
        client.get::<Envelope<DashboardStats>, _>("/api/dashboard/stats", &query),
        client.get::<Envelope<Vec<QuickAction>>, _>("/api/dashboard/quick-actions", &query),
    )
    .map_err(|e| {
        tracing::error!("Errore caricamento dashboard: {}", e);
        e
    })?;

    Ok(DashboardOverview {
        stats: stats.into_data("statistiche dashboard")?,
        quick_actions: actions.into_list("azioni rapide")?,
    })
}

pub async fn recent_activity(client: &ApiClient, limit: u32) -> GestionaleResult<Vec<Activity>> {
    let mut query = client.user_params()?;
    query.push(("limit", limit.to_string()));
    let envelope: Envelope<Vec<Activity>> = client.get("/api/dashboard/recent-activity", &query).await?;
    envelope.into_list("attività recenti")
}

impl AnalyticsStats {
    pub fn average_invoice(&self) -> Decimal {
        if self.totale_fatture == 0 {
            return Decimal::ZERO;
        }
        self.importo_totale / Decimal::from(self.totale_fatture)
    }

    pub fn paid_ratio(&self) -> Decimal {
        if self.totale_fatture == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.fatture_pagate) / Decimal::from(self.totale_fatture)
    }
}

/// The analytics body is the stats object itself, without an envelope.
pub async fn analytics(client: &ApiClient) -> GestionaleResult<AnalyticsStats> {
    let query = client.user_params()?;
    client.get("/api/dashboard/", &query).await.map_err(|e| {
        tracing::error!("Errore caricamento analytics: {}", e);
        e
    })
}
