use crate::api::{ApiClient, NO_QUERY};
use crate::commands::utils::file_part;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::ImportReport;
use reqwest::multipart;
use std::fmt;
use std::path::Path;

pub const MAX_DISPLAYED_ERRORS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Fornitori,
    Corrispettivi,
    Pos,
    Versamenti,
}

impl ImportKind {
    pub const ALL: [ImportKind; 4] = [
        ImportKind::Fornitori,
        ImportKind::Corrispettivi,
        ImportKind::Pos,
        ImportKind::Versamenti,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Fornitori => "fornitori",
            ImportKind::Corrispettivi => "corrispettivi",
            ImportKind::Pos => "pos",
            ImportKind::Versamenti => "versamenti",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ImportReport {
    pub fn displayed_errors(&self) -> &[String] {
        let end = self.errors.len().min(MAX_DISPLAYED_ERRORS);
        &self.errors[..end]
    }

    pub fn hidden_errors(&self) -> u32 {
        let total = self.total_errors.unwrap_or(self.errors.len() as u32);
        total.saturating_sub(self.displayed_errors().len() as u32)
    }
}

/// Uploads a spreadsheet to the importer for `kind`. The file is not inspected locally.
pub async fn upload(client: &ApiClient, kind: ImportKind, file: &Path) -> GestionaleResult<ImportReport> {
    let form = multipart::Form::new()
        .text("id_utente", client.user_id()?.to_string())
        .part("file", file_part(file).await?);

    let path = format!("/api/bulk-import/{}", kind.as_str());
    let report: ImportReport = client
        .post_multipart(&path, NO_QUERY, form)
        .await
        .map_err(|e| {
            tracing::error!("Errore durante import {}: {}", kind, e);
            e
        })?;
    if !report.success {
        return Err(GestionaleError::Rejected(report.message.unwrap_or_default()));
    }

    tracing::info!(
        "Import {}: {} importati, {} saltati, {} errori",
        kind,
        report.imported,
        report.skipped,
        report.total_errors.unwrap_or(report.errors.len() as u32)
    );
    Ok(report)
}
