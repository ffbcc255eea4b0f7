//! Order drafts handed to order placement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartLineItem;
use crate::pricing::CartTotals;
use crate::types::{CurrencyCode, OrderDraftId};

/// Immutable snapshot of a cart ready to be turned into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub id: OrderDraftId,
    pub created_at: DateTime<Utc>,
    pub currency: CurrencyCode,
    pub items: Vec<CartLineItem>,
    pub coupon_code: Option<String>,
    pub totals: CartTotals,
}

impl OrderDraft {
    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}
