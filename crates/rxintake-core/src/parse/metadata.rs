//! Invoice number and date found in the document header.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DATE_LABEL, DATE_LONG, DATE_YMD, INVOICE_NUMBER};

/// Header fields that can fill in an upload's missing metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceMetadata {
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
}

/// Extract the invoice number and the first labeled, parseable date.
pub fn extract_metadata(text: &str) -> InvoiceMetadata {
    let invoice_number = INVOICE_NUMBER
        .captures(text)
        .map(|caps| caps[1].trim().to_string());

    let invoice_date = DATE_LABEL
        .captures_iter(text)
        .find_map(|caps| parse_date(&caps[1]));

    InvoiceMetadata {
        invoice_number,
        invoice_date,
    }
}

/// Parse the first date found in a string.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_YMD.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_DMY.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    let caps = DATE_LONG.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_to_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_to_number(month: &str) -> Option<u32> {
    let number = match month.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}
