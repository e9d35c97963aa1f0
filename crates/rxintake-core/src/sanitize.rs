//! Bounds and defaults applied to extracted fields before they are stored.

use crate::models::config::SanitizerConfig;
use crate::models::invoice::NewInvoiceItem;
use crate::parse::ExtractedItem;

pub const UNKNOWN_ITEM: &str = "Unknown Item";
pub const DEFAULT_QUANTITY: &str = "1";
pub const DEFAULT_PRICE: &str = "0.00";
const ELLIPSIS: &str = "...";

/// Normalizes extracted fields so they always fit their columns.
///
/// Sanitizing an already sanitized item returns it unchanged.
#[derive(Debug, Clone, Default)]
pub struct FieldSanitizer {
    bounds: SanitizerConfig,
}

impl FieldSanitizer {
    pub fn new(bounds: SanitizerConfig) -> Self {
        Self { bounds }
    }

    pub fn sanitize(&self, item: &ExtractedItem) -> NewInvoiceItem {
        let b = &self.bounds;
        NewInvoiceItem {
            name: bounded(present(Some(&item.name)).unwrap_or(UNKNOWN_ITEM), b.name_max),
            brand: present(item.brand.as_deref()).map(|s| bounded(s, b.brand_max)),
            quantity: bounded(
                present(item.quantity.as_deref()).unwrap_or(DEFAULT_QUANTITY),
                b.quantity_max,
            ),
            cost_price: bounded(
                present(item.cost_price.as_deref()).unwrap_or(DEFAULT_PRICE),
                b.price_max,
            ),
            batch_number: present(item.batch_number.as_deref())
                .map(|s| bounded(s, b.batch_number_max)),
            expiry_date: present(item.expiry_date.as_deref())
                .map(|s| bounded(s, b.expiry_date_max)),
        }
    }
}

/// Trimmed value, or `None` when blank.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
fn bounded(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    if max <= ELLIPSIS.len() {
        return value.chars().take(max).collect();
    }

    let mut out: String = value.chars().take(max - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}
