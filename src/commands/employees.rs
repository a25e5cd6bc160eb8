use crate::api::{ApiClient, Envelope, NO_QUERY};
use crate::commands::utils::file_part;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::{Employee, Payslip};
use reqwest::multipart;
use rust_decimal::Decimal;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeInput {
    pub nome: String,
    pub cognome: String,
    pub codice_fiscale: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub mansione: Option<String>,
    pub retribuzione_mensile: Option<Decimal>,
}

impl EmployeeInput {
    pub fn validate(&self) -> GestionaleResult<()> {
        let required = [
            (&self.nome, "Inserisci il nome"),
            (&self.cognome, "Inserisci il cognome"),
            (&self.codice_fiscale, "Inserisci il codice fiscale"),
        ];
        for (value, message) in required {
            if value.trim().is_empty() {
                return Err(GestionaleError::Validation(message.to_string()));
            }
        }
        if let Some(pay) = self.retribuzione_mensile {
            if pay < Decimal::ZERO {
                return Err(GestionaleError::Validation(
                    "La retribuzione non può essere negativa".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub struct EmployeesPage {
    client: ApiClient,
    employees: Vec<Employee>,
}

impl EmployeesPage {
    pub fn new(client: ApiClient) -> Self {
        EmployeesPage {
            client,
            employees: Vec::new(),
        }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn payroll_total(&self) -> Decimal {
        self.employees.iter().map(|e| e.retribuzione_mensile).sum()
    }

    async fn fetch(&self) -> GestionaleResult<Vec<Employee>> {
        let query = self.client.user_params()?;
        let envelope: Envelope<Vec<Employee>> = self.client.get("/api/dipendenti/", &query).await?;
        envelope.into_list("dipendenti")
    }

    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        match self.fetch().await {
            Ok(employees) => {
                self.employees = employees;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Errore caricamento dipendenti: {}", e);
                self.employees.clear();
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, input: &EmployeeInput) -> GestionaleResult<Option<String>> {
        input.validate()?;
        let mut form = self.client.user_params()?;
        form.push(("nome", input.nome.trim().to_string()));
        form.push(("cognome", input.cognome.trim().to_string()));
        form.push(("codice_fiscale", input.codice_fiscale.trim().to_uppercase()));
        for (key, value) in [
            ("email", &input.email),
            ("telefono", &input.telefono),
            ("mansione", &input.mansione),
        ] {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                form.push((key, v.to_string()));
            }
        }
        if let Some(pay) = input.retribuzione_mensile {
            form.push(("retribuzione_mensile", pay.to_string()));
        }

        let envelope: Envelope<serde_json::Value> = self
            .client
            .post_form("/api/dipendenti/", NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore creazione dipendente: {}", e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    /// Uploads a payslip PDF; the backend parses it and files it under the employee.
    pub async fn upload_payslip(&mut self, file: &Path) -> GestionaleResult<Option<String>> {
        let form = multipart::Form::new()
            .text("id_utente", self.client.user_id()?.to_string())
            .part("file", file_part(file).await?);

        let envelope: Envelope<serde_json::Value> = self
            .client
            .post_multipart("/api/dipendenti/upload-busta-paga", NO_QUERY, form)
            .await
            .map_err(|e| {
                tracing::error!("Errore caricamento busta paga {:?}: {}", file, e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    pub async fn payslips(&self, id_dipendente: i64) -> GestionaleResult<Vec<Payslip>> {
        let query = self.client.user_params()?;
        let envelope: Envelope<Vec<Payslip>> = self
            .client
            .get(&format!("/api/dipendenti/{}/paghe", id_dipendente), &query)
            .await
            .map_err(|e| {
                tracing::error!("Errore caricamento buste paga {}: {}", id_dipendente, e);
                e
            })?;
        envelope.into_list("buste paga")
    }
}
