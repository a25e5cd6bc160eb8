use crate::api::{ApiClient, Envelope};
use crate::commands::utils::format_eur;
use crate::error::{GestionaleError, GestionaleResult};
use crate::models::VatLiquidation;
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    Debito,
    Credito,
}

impl SettlementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementKind::Debito => "debito",
            SettlementKind::Credito => "credito",
        }
    }
}

impl fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monthly VAT settlement as displayed: sales VAT against purchase VAT.
#[derive(Debug, Clone, PartialEq)]
pub struct VatSettlement {
    pub mese: u32,
    pub anno: i32,
    pub iva_vendite: Decimal,
    pub iva_acquisti: Decimal,
}

impl VatSettlement {
    pub fn net(&self) -> Decimal {
        self.iva_vendite - self.iva_acquisti
    }

    /// Zero counts as debito.
    pub fn kind(&self) -> SettlementKind {
        if self.net() < Decimal::ZERO {
            SettlementKind::Credito
        } else {
            SettlementKind::Debito
        }
    }

    pub fn display_amount(&self) -> Decimal {
        self.net().abs()
    }

    pub fn notice(&self) -> Option<&'static str> {
        let net = self.net();
        if net > Decimal::ZERO {
            Some("IVA da versare entro il 16 del mese successivo")
        } else if net < Decimal::ZERO {
            Some("Credito IVA compensabile nei mesi successivi")
        } else {
            None
        }
    }
}

impl From<VatLiquidation> for VatSettlement {
    fn from(l: VatLiquidation) -> Self {
        VatSettlement {
            mese: l.mese,
            anno: l.anno,
            iva_vendite: l.iva_vendite,
            iva_acquisti: l.iva_acquisti,
        }
    }
}

impl fmt::Display for VatSettlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{} IVA vendite {} - IVA acquisti {} = {} {}",
            self.mese,
            self.anno,
            format_eur(self.iva_vendite),
            format_eur(self.iva_acquisti),
            format_eur(self.display_amount()),
            self.kind()
        )
    }
}

pub fn validate_period(mese: u32, anno: i32) -> GestionaleResult<()> {
    if !(1..=12).contains(&mese) {
        return Err(GestionaleError::Validation(format!("Mese non valido: {}", mese)));
    }
    if !(2000..=2100).contains(&anno) {
        return Err(GestionaleError::Validation(format!("Anno non valido: {}", anno)));
    }
    Ok(())
}

pub async fn liquidation(client: &ApiClient, mese: u32, anno: i32) -> GestionaleResult<VatSettlement> {
    validate_period(mese, anno)?;
    let mut query = client.user_params()?;
    query.push(("mese", mese.to_string()));
    query.push(("anno", anno.to_string()));

    let envelope: Envelope<VatLiquidation> = client
        .get("/api/iva/liquidazione", &query)
        .await
        .map_err(|e| {
            tracing::error!("Errore calcolo liquidazione IVA {}/{}: {}", mese, anno, e);
            e
        })?;
    let data = envelope.into_data("liquidazione IVA")?;
    let settlement = VatSettlement::from(data);
    tracing::debug!("Liquidazione {}/{}: {}", mese, anno, settlement.net());
    Ok(settlement)
}
