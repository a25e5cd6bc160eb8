use crate::api::{ApiClient, Envelope, Params, NO_QUERY};
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::{Invoice, Supplier, SupplierStats};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierInput {
    pub partita_iva: String,
    pub ragione_sociale: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub indirizzo: Option<String>,
    pub citta: Option<String>,
    pub cap: Option<String>,
    pub metodo_pagamento: Option<String>,
}

impl SupplierInput {
    pub fn validate(&self) -> GestionaleResult<()> {
        if self.partita_iva.trim().is_empty() {
            return Err(GestionaleError::Validation("Inserisci la partita IVA".to_string()));
        }
        if self.ragione_sociale.trim().is_empty() {
            return Err(GestionaleError::Validation(
                "Inserisci la ragione sociale".to_string(),
            ));
        }
        Ok(())
    }

    /// Only filled fields are sent; the key travels in the path on update.
    fn form_fields(&self, include_key: bool) -> Params {
        let mut fields = Params::new();
        if include_key {
            fields.push(("partita_iva", self.partita_iva.trim().to_string()));
        }
        fields.push(("ragione_sociale", self.ragione_sociale.trim().to_string()));
        let optional = [
            ("email", &self.email),
            ("telefono", &self.telefono),
            ("indirizzo", &self.indirizzo),
            ("citta", &self.citta),
            ("cap", &self.cap),
            ("metodo_pagamento", &self.metodo_pagamento),
        ];
        for (key, value) in optional {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                fields.push((key, v.to_string()));
            }
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupplierDetail {
    pub partita_iva: String,
    pub stats: SupplierStats,
    pub invoices: Vec<Invoice>,
}

pub struct SuppliersPage {
    client: ApiClient,
    suppliers: Vec<Supplier>,
}

impl SuppliersPage {
    pub fn new(client: ApiClient) -> Self {
        SuppliersPage {
            client,
            suppliers: Vec::new(),
        }
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn search(&self, text: &str) -> Vec<&Supplier> {
        let needle = text.trim().to_lowercase();
        self.suppliers
            .iter()
            .filter(|s| {
                needle.is_empty()
                    || s.ragione_sociale.to_lowercase().contains(&needle)
                    || s.partita_iva.contains(&needle)
            })
            .collect()
    }

    async fn fetch(&self) -> GestionaleResult<Vec<Supplier>> {
        let query = self.client.user_params()?;
        let envelope: Envelope<Vec<Supplier>> = self.client.get("/api/suppliers/", &query).await?;
        envelope.into_list("fornitori")
    }

    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        match self.fetch().await {
            Ok(suppliers) => {
                self.suppliers = suppliers;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Errore caricamento fornitori: {}", e);
                self.suppliers.clear();
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, input: &SupplierInput) -> GestionaleResult<Option<String>> {
        input.validate()?;
        let mut form = self.client.user_params()?;
        form.extend(input.form_fields(true));

        let envelope: Envelope<Supplier> = self
            .client
            .post_form("/api/suppliers/", NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore creazione fornitore {}: {}", input.partita_iva, e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    pub async fn update(&mut self, input: &SupplierInput) -> GestionaleResult<Option<String>> {
        input.validate()?;
        let query = self.client.user_params()?;
        let path = format!("/api/suppliers/{}", input.partita_iva.trim());

        let envelope: Envelope<Supplier> = self
            .client
            .put_form(&path, &query, &input.form_fields(false))
            .await
            .map_err(|e| {
                tracing::error!("Errore aggiornamento fornitore {}: {}", input.partita_iva, e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    /// Suppliers with invoices are deactivated by the backend rather than removed.
    pub async fn delete(&mut self, partita_iva: &str) -> GestionaleResult<Option<String>> {
        let mut query = self.client.user_params()?;
        query.push(("force", "true".to_string()));

        let envelope: Envelope<serde_json::Value> = self
            .client
            .delete(&format!("/api/suppliers/{}", partita_iva), &query)
            .await
            .map_err(|e| {
                tracing::error!("Errore eliminazione fornitore {}: {}", partita_iva, e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    pub async fn detail(&self, partita_iva: &str) -> GestionaleResult<SupplierDetail> {
        let query = self.client.user_params()?;
        let stats_path = format!("/api/suppliers/{}/stats", partita_iva);
        let invoices_path = format!("/api/suppliers/{}/fatture", partita_iva);

        let (stats, invoices) = tokio::try_join!(
            self.client.get::<Envelope<SupplierStats>, _>(&stats_path, &query),
            self.client.get::<Envelope<Vec<Invoice>>, _>(&invoices_path, &query),
        )
        .map_err(|e| {
            tracing::error!("Errore caricamento dettaglio fornitore {}: {}", partita_iva, e);
            e
        })?;

        Ok(SupplierDetail {
            partita_iva: partita_iva.to_string(),
            stats: stats.into_optional()?.unwrap_or_default(),
            invoices: invoices.into_list("fatture fornitore")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_skip_empty_values() {
        let input = SupplierInput {
            partita_iva: " 01234567890 ".to_string(),
            ragione_sociale: "Caseificio Rossi srl".to_string(),
            email: Some(" ".to_string()),
            citta: Some("Bologna".to_string()),
            ..Default::default()
        };
        let fields = input.form_fields(true);
        assert_eq!(fields[0], ("partita_iva", "01234567890".to_string()));
        assert!(fields.contains(&("citta", "Bologna".to_string())));
        assert!(!fields.iter().any(|(k, _)| *k == "email"));

        assert!(!input.form_fields(false).iter().any(|(k, _)| *k == "partita_iva"));
    }

    #[test]
    fn test_validation() {
        assert!(SupplierInput::default().validate().is_err());
        let input = SupplierInput {
            partita_iva: "01234567890".to_string(),
            ..Default::default()
        };
        assert_eq!(
            input.validate().unwrap_err().user_message(),
            "Inserisci la ragione sociale"
        );
    }
}
