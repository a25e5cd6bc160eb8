use crate::api::{ApiClient, Envelope, NO_QUERY};
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::Product;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeSet;

pub const DEFAULT_UNIT: &str = "kg";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductInput {
    pub codice_prodotto: String,
    pub descrizione: String,
    pub categoria: Option<String>,
    pub unita_misura: Option<String>,
    pub quantita: Decimal,
    pub prezzo_acquisto: Option<Decimal>,
}

impl ProductInput {
    pub fn validate(&self) -> GestionaleResult<()> {
        if self.codice_prodotto.trim().is_empty() {
            return Err(GestionaleError::Validation("Inserisci il codice prodotto".to_string()));
        }
        if self.descrizione.trim().is_empty() {
            return Err(GestionaleError::Validation("Inserisci la descrizione".to_string()));
        }
        if self.quantita < Decimal::ZERO {
            return Err(GestionaleError::Validation(
                "La quantità non può essere negativa".to_string(),
            ));
        }
        Ok(())
    }

    pub fn unit(&self) -> &str {
        self.unita_misura
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_UNIT)
    }
}

#[derive(Debug, Deserialize)]
struct PopulateResponse {
    #[serde(default = "crate::models::default_true")]
    success: bool,
    message: Option<String>,
    prodotti_creati: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulateOutcome {
    pub message: Option<String>,
    pub prodotti_creati: Option<u32>,
}

pub fn stock_value(products: &[Product]) -> Decimal {
    products
        .iter()
        .map(|p| p.quantita * p.prezzo_acquisto.unwrap_or_default())
        .sum()
}

pub struct WarehousePage {
    client: ApiClient,
    category: Option<String>,
    products: Vec<Product>,
}

impl WarehousePage {
    pub fn new(client: ApiClient) -> Self {
        WarehousePage {
            client,
            category: None,
            products: Vec::new(),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Distinct categories of the listed products, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.products
            .iter()
            .filter_map(|p| p.categoria.as_deref())
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn stock_value(&self) -> Decimal {
        stock_value(&self.products)
    }

    pub async fn set_category(&mut self, category: Option<String>) -> GestionaleResult<()> {
        self.category = category.filter(|c| !c.trim().is_empty());
        self.refresh().await
    }

    async fn fetch(&self) -> GestionaleResult<Vec<Product>> {
        let mut query = self.client.user_params()?;
        if let Some(cat) = &self.category {
            query.push(("categoria", cat.clone()));
        }
        let envelope: Envelope<Vec<Product>> = self.client.get("/api/warehouse/", &query).await?;
        envelope.into_list("prodotti")
    }

    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        match self.fetch().await {
            Ok(products) => {
                self.products = products;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Errore caricamento magazzino: {}", e);
                self.products.clear();
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, input: &ProductInput) -> GestionaleResult<Option<String>> {
        input.validate()?;
        let mut form = self.client.user_params()?;
        form.push(("codice_prodotto", input.codice_prodotto.trim().to_string()));
        form.push(("descrizione", input.descrizione.trim().to_string()));
        if let Some(cat) = input.categoria.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            form.push(("categoria", cat.to_string()));
        }
        form.push(("unita_misura", input.unit().to_string()));
        form.push(("quantita", input.quantita.to_string()));
        if let Some(price) = input.prezzo_acquisto {
            form.push(("prezzo_acquisto", price.to_string()));
        }

        let envelope: Envelope<Product> = self
            .client
            .post_form("/api/warehouse/", NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore creazione prodotto: {}", e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    pub async fn populate_from_invoices(&mut self) -> GestionaleResult<PopulateOutcome> {
        let form = self.client.user_params()?;
        let response: PopulateResponse = self
            .client
            .post_form("/api/warehouse/populate-from-invoices", NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore popolamento magazzino: {}", e);
                e
            })?;
        if !response.success {
            return Err(GestionaleError::Rejected(response.message.unwrap_or_default()));
        }
        self.refresh().await?;
        Ok(PopulateOutcome {
            message: response.message,
            prodotti_creati: response.prodotti_creati,
        })
    }
}
