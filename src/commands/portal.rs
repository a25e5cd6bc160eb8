use crate::api::{ApiClient, Envelope, NO_QUERY};
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::PortalPayslip;
use serde_json::json;
use std::path::{Path, PathBuf};

pub const MSG_ACCEPT_FIRST: &str = "Devi prima accettare la busta paga";
pub const MSG_DISPUTE_EXPIRED: &str = "Termine di contestazione scaduto";
const MSG_ALREADY_ACCEPTED: &str = "Busta paga già accettata";
const MSG_ACCEPTED: &str = "Busta paga accettata correttamente";

/// Employee-side view of one payslip.
///
/// The PDF can be downloaded only after the employee has confirmed reading
/// it. The dispute form is available until the 180-day window closes.
#[derive(Debug)]
pub struct PayslipPortal {
    client: ApiClient,
    id: i64,
    payslip: Option<PortalPayslip>,
}

impl PayslipPortal {
    pub fn new(client: ApiClient, id: i64) -> Self {
        PayslipPortal {
            client,
            id,
            payslip: None,
        }
    }

    pub async fn open(client: ApiClient, id: i64) -> GestionaleResult<Self> {
        let mut portal = Self::new(client, id);
        portal.refresh().await?;
        Ok(portal)
    }

    pub fn payslip(&self) -> Option<&PortalPayslip> {
        self.payslip.as_ref()
    }

    pub fn is_accepted(&self) -> bool {
        self.payslip.as_ref().is_some_and(|p| p.accettato)
    }

    pub fn is_paid(&self) -> bool {
        self.payslip.as_ref().is_some_and(|p| p.stato_pagamento == "pagato")
    }

    pub fn can_download(&self) -> bool {
        self.payslip.as_ref().is_some_and(|p| p.accettato && p.pdf_disponibile)
    }

    pub fn can_dispute(&self) -> bool {
        self.payslip.as_ref().is_some_and(|p| !p.contestazione_scaduta)
    }

    fn path(&self, action: &str) -> String {
        if action.is_empty() {
            format!("/api/portale/buste-paga/{}", self.id)
        } else {
            format!("/api/portale/buste-paga/{}/{}", self.id, action)
        }
    }

    fn loaded(&self) -> GestionaleResult<&PortalPayslip> {
        self.payslip
            .as_ref()
            .ok_or_else(|| GestionaleError::MissingData(format!("busta paga {}", self.id)))
    }

    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        match self.client.get::<PortalPayslip, _>(&self.path(""), NO_QUERY).await {
            Ok(payslip) => {
                self.payslip = Some(payslip);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Errore caricamento busta paga {}: {}", self.id, e);
                self.payslip = None;
                Err(e)
            }
        }
    }

    /// Confirms the employee has read the payslip, then reloads it.
    pub async fn accept(&mut self) -> GestionaleResult<String> {
        if self.loaded()?.accettato {
            return Err(GestionaleError::Validation(MSG_ALREADY_ACCEPTED.to_string()));
        }
        let envelope: Envelope<serde_json::Value> = self
            .client
            .post_json(&self.path("accetta"), NO_QUERY, &json!({ "accetto": true }))
            .await
            .map_err(|e| {
                tracing::error!("Errore accettazione busta paga {}: {}", self.id, e);
                e
            })?;
        let message = envelope
            .into_message()?
            .unwrap_or_else(|| MSG_ACCEPTED.to_string());
        self.refresh().await?;
        Ok(message)
    }

    /// Saves the payslip PDF into `dir`. Nothing is requested before acceptance.
    pub async fn download_pdf(&self, dir: &Path) -> GestionaleResult<PathBuf> {
        let payslip = self.loaded()?;
        if !payslip.accettato {
            return Err(GestionaleError::Validation(MSG_ACCEPT_FIRST.to_string()));
        }
        if !payslip.pdf_disponibile {
            return Err(GestionaleError::Validation("PDF non disponibile".to_string()));
        }
        let target = dir.join(format!("BustaPaga_{}.pdf", file_stem(&payslip.periodo)));
        self.save(&self.path("download-pdf"), &target).await?;
        Ok(target)
    }

    pub async fn download_dispute_form(&self, dir: &Path) -> GestionaleResult<PathBuf> {
        let payslip = self.loaded()?;
        if payslip.contestazione_scaduta {
            return Err(GestionaleError::Validation(MSG_DISPUTE_EXPIRED.to_string()));
        }
        let target = dir.join(format!(
            "Modulo_Contestazione_BustaPaga_{}.docx",
            file_stem(&payslip.periodo)
        ));
        self.save(&self.path("download-modulo-contestazione"), &target)
            .await?;
        Ok(target)
    }

    async fn save(&self, path: &str, target: &Path) -> GestionaleResult<()> {
        let bytes = self.client.get_bytes(path, NO_QUERY).await?;
        tokio::fs::write(target, &bytes).await.map_err(|e| {
            tracing::error!("Cannot write {:?}: {}", target, e);
            e
        })?;
        tracing::info!("Saved {} bytes to {:?}", bytes.len(), target);
        Ok(())
    }
}

fn file_stem(periodo: &str) -> String {
    let stem: String = periodo
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "senza_periodo".to_string()
    } else {
        stem
    }
}
