use crate::api::{ApiClient, Envelope, NO_QUERY};
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::{HealthCertificate, Sanitation, TemperatureReading};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appliance {
    Frigorifero,
    Congelatore,
}

impl Appliance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Appliance::Frigorifero => "frigorifero",
            Appliance::Congelatore => "congelatore",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "frigorifero" | "frigo" => Some(Appliance::Frigorifero),
            "congelatore" | "freezer" => Some(Appliance::Congelatore),
            _ => None,
        }
    }

    /// Highest temperature (°C) still within the food-safety limit.
    pub fn max_temperature(&self) -> Decimal {
        match self {
            Appliance::Frigorifero => Decimal::new(4, 0),
            Appliance::Congelatore => Decimal::new(-18, 0),
        }
    }

    pub fn is_compliant(&self, temperatura: Decimal) -> bool {
        temperatura <= self.max_temperature()
    }
}

/// Readings of an unknown appliance type are reported as compliant.
pub fn reading_is_compliant(reading: &TemperatureReading) -> bool {
    Appliance::parse(&reading.tipo).map_or(true, |a| a.is_compliant(reading.temperatura))
}

pub fn certificate_expired(cert: &HealthCertificate, today: NaiveDate) -> bool {
    cert.data_scadenza.map_or(false, |d| d < today)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub tipo: Appliance,
    pub data_rilevazione: NaiveDate,
    pub ora_rilevazione: NaiveTime,
    pub temperatura: Decimal,
    pub operatore: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSanitation {
    pub data_sanificazione: NaiveDate,
    pub area: String,
    pub prodotto_usato: Option<String>,
    pub operatore: Option<String>,
}

pub struct HaccpPage {
    client: ApiClient,
    temperatures: Vec<TemperatureReading>,
    sanitations: Vec<Sanitation>,
    certificates: Vec<HealthCertificate>,
}

impl HaccpPage {
    pub fn new(client: ApiClient) -> Self {
        HaccpPage {
            client,
            temperatures: Vec::new(),
            sanitations: Vec::new(),
            certificates: Vec::new(),
        }
    }

    pub fn temperatures(&self) -> &[TemperatureReading] {
        &self.temperatures
    }

    pub fn sanitations(&self) -> &[Sanitation] {
        &self.sanitations
    }

    pub fn certificates(&self) -> &[HealthCertificate] {
        &self.certificates
    }

    pub fn non_compliant_readings(&self) -> Vec<&TemperatureReading> {
        self.temperatures
            .iter()
            .filter(|r| !reading_is_compliant(r))
            .collect()
    }

    pub fn expired_certificates(&self, today: NaiveDate) -> Vec<&HealthCertificate> {
        self.certificates
            .iter()
            .filter(|c| certificate_expired(c, today))
            .collect()
    }

    fn clear(&mut self) {
        self.temperatures.clear();
        self.sanitations.clear();
        self.certificates.clear();
    }

    pub async fn refresh(&mut self) -> GestionaleResult<()> {
        let query = match self.client.user_params() {
            Ok(q) => q,
            Err(e) => {
                self.clear();
                return Err(e);
            }
        };

        let loaded = tokio::try_join!(
            self.client.get::<Envelope<Vec<TemperatureReading>>, _>("/api/haccp/temperature", &query),
            self.client.get::<Envelope<Vec<Sanitation>>, _>("/api/haccp/sanificazioni", &query),
            self.client.get::<Envelope<Vec<HealthCertificate>>, _>("/api/haccp/libretti-sanitari", &query),
        )
        .and_then(|(t, s, c)| {
            Ok((
                t.into_list("temperature")?,
                s.into_list("sanificazioni")?,
                c.into_list("libretti sanitari")?,
            ))
        });

        match loaded {
            Ok((temperatures, sanitations, certificates)) => {
                self.temperatures = temperatures;
                self.sanitations = sanitations;
                self.certificates = certificates;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Errore caricamento HACCP: {}", e);
                self.clear();
                Err(e)
            }
        }
    }

    pub async fn record_temperature(&mut self, reading: &NewReading) -> GestionaleResult<Option<String>> {
        let mut form = self.client.user_params()?;
        form.push(("tipo", reading.tipo.as_str().to_string()));
        form.push(("data_rilevazione", reading.data_rilevazione.format("%Y-%m-%d").to_string()));
        form.push(("ora_rilevazione", reading.ora_rilevazione.format("%H:%M:%S").to_string()));
        form.push(("temperatura", reading.temperatura.to_string()));
        if let Some(op) = reading.operatore.as_deref().filter(|o| !o.trim().is_empty()) {
            form.push(("operatore", op.trim().to_string()));
        }

        if !reading.tipo.is_compliant(reading.temperatura) {
            tracing::warn!(
                "Temperatura {} fuori limite per {} (max {})",
                reading.temperatura,
                reading.tipo.as_str(),
                reading.tipo.max_temperature()
            );
        }

        let envelope: Envelope<TemperatureReading> = self
            .client
            .post_form("/api/haccp/temperature", NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore registrazione temperatura: {}", e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }

    pub async fn record_sanitation(&mut self, entry: &NewSanitation) -> GestionaleResult<Option<String>> {
        if entry.area.trim().is_empty() {
            return Err(GestionaleError::Validation("Inserisci l'area sanificata".to_string()));
        }
        let mut form = self.client.user_params()?;
        form.push(("data_sanificazione", entry.data_sanificazione.format("%Y-%m-%d").to_string()));
        form.push(("area", entry.area.trim().to_string()));
        for (key, value) in [("prodotto_usato", &entry.prodotto_usato), ("operatore", &entry.operatore)] {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                form.push((key, v.to_string()));
            }
        }

        let envelope: Envelope<serde_json::Value> = self
            .client
            .post_form("/api/haccp/sanificazioni", NO_QUERY, &form)
            .await
            .map_err(|e| {
                tracing::error!("Errore registrazione sanificazione: {}", e);
                e
            })?;
        let message = envelope.into_message()?;
        self.refresh().await?;
        Ok(message)
    }
}
