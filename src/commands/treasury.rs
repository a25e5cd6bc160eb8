use crate::api::ApiClient;
use crate::commands::cash_register::fetch_balance;
use crate::commands::invoices::{fetch_unpaid, total_of};
use crate::error::GestionaleResult;
use crate::models::Invoice;
use rust_decimal::Decimal;

/// Liquidity forecast. Bank balance is not tracked separately: it is
/// estimated as the amount still to be paid, with the sign flipped.
#[derive(Debug, Clone, PartialEq)]
pub struct TreasuryOverview {
    pub cash: Decimal,
    pub unpaid: Vec<Invoice>,
}

impl TreasuryOverview {
    pub fn to_pay(&self) -> Decimal {
        total_of(&self.unpaid)
    }

    pub fn bank(&self) -> Decimal {
        -self.to_pay()
    }

    pub fn liquidity(&self) -> Decimal {
        self.cash + self.bank()
    }

    pub fn net(&self) -> Decimal {
        self.liquidity() - self.to_pay()
    }

    pub fn is_shortfall(&self) -> bool {
        self.net() < Decimal::ZERO
    }
}

pub async fn overview(client: &ApiClient) -> GestionaleResult<TreasuryOverview> {
    let (balance, unpaid) = tokio::try_join!(fetch_balance(client), fetch_unpaid(client)).map_err(|e| {
        tracing::error!("Errore caricamento tesoreria: {}", e);
        e
    })?;

    Ok(TreasuryOverview {
        cash: balance.saldo,
        unpaid,
    })
}
