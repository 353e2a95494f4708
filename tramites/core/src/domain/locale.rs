// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Spanish (Mexico) date and currency formatting used in documents, views and emails.

use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

pub fn month_name(month: u32) -> &'static str {
    MONTHS[((month.clamp(1, 12)) - 1) as usize]
}

/// "19 de octubre de 2026"
pub fn long_date<D: Datelike>(date: &D) -> String {
    format!("{} de {} de {}", date.day(), month_name(date.month()), date.year())
}

/// "19/10/2026"
pub fn short_date<D: Datelike>(date: &D) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}

/// Parse a `YYYY-MM-DD` form value
pub fn parse_form_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// "$12,345.50"
pub fn format_mxn(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", if negative { "-" } else { "" }, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(long_date(&date), "5 de marzo de 2026");
        assert_eq!(short_date(&date), "05/03/2026");
    }

    #[test]
    fn test_format_mxn() {
        assert_eq!(format_mxn(0.0), "$0.00");
        assert_eq!(format_mxn(999.5), "$999.50");
        assert_eq!(format_mxn(12345.5), "$12,345.50");
        assert_eq!(format_mxn(1234567.0), "$1,234,567.00");
    }

    #[test]
    fn test_parse_form_date() {
        assert!(parse_form_date("2026-02-30").is_none());
        assert_eq!(
            parse_form_date("2026-02-28"),
            NaiveDate::from_ymd_opt(2026, 2, 28)
        );
    }
}
