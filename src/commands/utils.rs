use crate::error::{GestionaleError, GestionaleResult};
use chrono::NaiveDate;
use regex::Regex;
use reqwest::multipart::Part;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

pub fn parse_date_safe(date_str: &str) -> Option<NaiveDate> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Timestamps like "2024-03-01T10:22:00" carry the date in the first 10 chars.
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d"))
        .ok()
}

pub fn parse_date(date_str: &str) -> GestionaleResult<NaiveDate> {
    parse_date_safe(date_str)
        .ok_or_else(|| GestionaleError::Validation(format!("Data non valida: {}", date_str)))
}

const AMOUNT_WITH_COMMA: &str = r"^-?(\d{1,3}(\.\d{3})+|\d+),\d+$";
const AMOUNT_GROUPED: &str = r"^-?[1-9]\d{0,2}(\.\d{3})+$";
const AMOUNT_PLAIN: &str = r"^-?\d+(\.\d+)?$";

fn amount_regex(pattern: &str) -> GestionaleResult<Regex> {
    Regex::new(pattern).map_err(|e| GestionaleError::Internal(e.to_string()))
}

/// Accepts the plain "1500.50" and the Italian "1.500,50" or "1500,50".
/// A grouped figure without decimals such as "1.500" reads both ways and is
/// rejected, as is any other mix of separators.
pub fn parse_amount(raw: &str) -> GestionaleResult<Decimal> {
    let trimmed = raw.trim().trim_start_matches('€').trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let invalid = || GestionaleError::Validation(format!("Importo non valido: {}", raw));

    let normalized = if amount_regex(AMOUNT_WITH_COMMA)?.is_match(trimmed) {
        trimmed.replace('.', "").replace(',', ".")
    } else if amount_regex(AMOUNT_GROUPED)?.is_match(trimmed) {
        return Err(GestionaleError::Validation(format!(
            "Importo ambiguo: {} (usa 1500 oppure 1.500,00)",
            raw
        )));
    } else if amount_regex(AMOUNT_PLAIN)?.is_match(trimmed) {
        trimmed.to_string()
    } else {
        return Err(invalid());
    };
    Decimal::from_str(&normalized).map_err(|_| invalid())
}

pub fn format_eur(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-€{:.2}", rounded.abs())
    } else {
        format!("€{:.2}", rounded.abs())
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Reads a file from disk into a multipart part named after the file.
pub async fn file_part(path: &Path) -> GestionaleResult<Part> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        tracing::error!("Cannot read {:?}: {}", path, e);
        e
    })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(Part::bytes(bytes).file_name(file_name))
}
