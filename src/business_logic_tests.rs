#[cfg(test)]
mod tests {
    use crate::commands::cash_register::DailyClosure;
    use crate::commands::haccp::{certificate_expired, reading_is_compliant, Appliance};
    use crate::commands::treasury::TreasuryOverview;
    use crate::commands::vat::{validate_period, SettlementKind, VatSettlement};
    use crate::commands::warehouse::stock_value;
    use crate::models::{
        AnalyticsStats, HealthCertificate, IncomeStatement, Invoice, Product, StatementSection,
        TemperatureReading,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn invoice(id: i64, totale: &str) -> Invoice {
        serde_json::from_value(json!({
            "id": id, "numero_fattura": format!("FT/{}", id), "totale": totale, "pagata": false
        }))
        .unwrap()
    }

    /// Drawer balance after closing: takings minus POS minus the deposit.
    #[test]
    fn test_daily_closure_balance() {
        let mut closure = DailyClosure::new(NaiveDate::from_ymd_opt(2024, 5, 12).unwrap());
        closure.corrispettivi = dec("1500");
        closure.pos = dec("800");
        closure.versamento = dec("500");
        assert_eq!(closure.closing_balance(), dec("200"));
        assert!(closure.validate().is_ok());

        // Deposit larger than cash left: negative balance is shown, not rejected
        closure.versamento = dec("900");
        assert_eq!(closure.closing_balance(), dec("-200"));
        assert!(closure.validate().is_ok());

        closure.pos = dec("-1");
        assert!(closure.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_vat_settlement_sign() {
        let debito = VatSettlement {
            mese: 5,
            anno: 2024,
            iva_vendite: dec("1000"),
            iva_acquisti: dec("400"),
        };
        assert_eq!(debito.net(), dec("600"));
        assert_eq!(debito.kind(), SettlementKind::Debito);
        assert_eq!(
            debito.notice(),
            Some("IVA da versare entro il 16 del mese successivo")
        );

        let credito = VatSettlement {
            iva_vendite: dec("300"),
            iva_acquisti: dec("450"),
            ..debito.clone()
        };
        assert_eq!(credito.net(), dec("-150"));
        assert_eq!(credito.kind(), SettlementKind::Credito);
        assert_eq!(credito.display_amount(), dec("150"));

        let pari = VatSettlement {
            iva_vendite: dec("250"),
            iva_acquisti: dec("250"),
            ..debito
        };
        assert_eq!(pari.kind(), SettlementKind::Debito);
        assert_eq!(pari.notice(), None);
    }

    #[test]
    fn test_vat_period_bounds() {
        assert!(validate_period(1, 2024).is_ok());
        assert!(validate_period(12, 2024).is_ok());
        assert!(validate_period(0, 2024).is_err());
        assert!(validate_period(13, 2024).is_err());
        assert!(validate_period(6, 1999).is_err());
    }

    #[test]
    fn test_treasury_forecast() {
        let overview = TreasuryOverview {
            cash: dec("500"),
            unpaid: vec![invoice(1, "244.00"), invoice(2, "1220.50")],
        };
        assert_eq!(overview.to_pay(), dec("1464.50"));
        assert_eq!(overview.bank(), dec("-1464.50"));
        assert_eq!(overview.liquidity(), dec("-964.50"));
        assert_eq!(overview.net(), dec("-2429.00"));
        assert!(overview.is_shortfall());

        let nothing_due = TreasuryOverview {
            cash: dec("500"),
            unpaid: Vec::new(),
        };
        assert_eq!(nothing_due.net(), dec("500"));
        assert!(!nothing_due.is_shortfall());
    }

    #[test]
    fn test_analytics_average() {
        let stats = AnalyticsStats {
            totale_fatture: 4,
            importo_totale: dec("1000"),
            fatture_pagate: 1,
            ..Default::default()
        };
        assert_eq!(stats.average_invoice(), dec("250"));
        assert_eq!(stats.paid_ratio(), dec("0.25"));

        let empty = AnalyticsStats::default();
        assert_eq!(empty.average_invoice(), Decimal::ZERO);
        assert_eq!(empty.paid_ratio(), Decimal::ZERO);
    }

    #[test]
    fn test_stock_value_ignores_missing_prices() {
        let products: Vec<Product> = serde_json::from_value(json!([
            {"id": 1, "descrizione": "Mozzarella", "quantita": 10, "prezzo_acquisto": 8.5},
            {"id": 2, "descrizione": "Farina 00", "quantita": "25", "prezzo_acquisto": "0.90"},
            {"id": 3, "descrizione": "Ricotta", "quantita": 4, "prezzo_acquisto": null}
        ]))
        .unwrap();
        assert_eq!(stock_value(&products), dec("107.50"));
    }

    #[test]
    fn test_temperature_limits() {
        assert!(Appliance::Frigorifero.is_compliant(dec("4")));
        assert!(!Appliance::Frigorifero.is_compliant(dec("4.1")));
        assert!(Appliance::Congelatore.is_compliant(dec("-20")));
        assert!(!Appliance::Congelatore.is_compliant(dec("-12")));

        let reading: TemperatureReading = serde_json::from_value(json!({
            "id": 1, "tipo": "abbattitore", "temperatura": 10
        }))
        .unwrap();
        assert!(reading_is_compliant(&reading));
    }

    #[test]
    fn test_certificate_expiry() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let cert = |scadenza: Option<&str>| -> HealthCertificate {
            serde_json::from_value(json!({"id": 1, "data_scadenza": scadenza})).unwrap()
        };
        assert!(certificate_expired(&cert(Some("2024-05-11")), today));
        assert!(!certificate_expired(&cert(Some("2024-05-12")), today));
        assert!(!certificate_expired(&cert(None), today));
    }

    #[test]
    fn test_income_statement_result() {
        let statement = IncomeStatement {
            anno: Some(2024),
            ricavi: StatementSection { totale: dec("52000") },
            costi: StatementSection { totale: dec("58500") },
            utile_perdita: None,
        };
        assert_eq!(statement.result(), dec("-6500"));
        assert_eq!(statement.result_label(), "perdita");

        let reported = IncomeStatement {
            utile_perdita: Some(dec("100")),
            ..statement
        };
        assert_eq!(reported.result_label(), "utile");
    }

    #[test]
    fn test_date_parsing() {
        use crate::commands::utils::parse_date_safe;

        assert_eq!(
            parse_date_safe("2024-05-12"),
            NaiveDate::from_ymd_opt(2024, 5, 12)
        );
        assert_eq!(
            parse_date_safe("2024-05-12T09:30:00"),
            NaiveDate::from_ymd_opt(2024, 5, 12)
        );
        assert_eq!(parse_date_safe("non una data"), None);
    }
}
