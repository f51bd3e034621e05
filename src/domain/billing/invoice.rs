//! Stripe Invoice payload and billing-cycle classification.
//!
//! Invoices are the richest payload this service handles. The helpers
//! here answer two questions handlers keep asking: which line item is
//! the subscription, and where in the customer's billing life this
//! invoice falls.

use serde::{Deserialize, Serialize};

/// Stripe Invoice object, reduced to the fields billing rules need.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoice {
    /// Customer ID the invoice belongs to.
    pub customer: String,

    /// Whether payment has been collected.
    #[serde(default)]
    pub paid: bool,

    /// Amount due in cents.
    #[serde(default)]
    pub amount_due: i64,

    /// Amount paid in cents.
    #[serde(default)]
    pub amount_paid: i64,

    /// Amount remaining in cents.
    #[serde(default)]
    pub amount_remaining: i64,

    /// Human-readable invoice number (e.g., "A1B2C3D4-0002").
    pub number: Option<String>,

    /// Invoice line items.
    #[serde(default)]
    pub lines: StripeInvoiceLines,
}

/// Invoice lines container.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeInvoiceLines {
    /// List of line items.
    #[serde(default)]
    pub data: Vec<StripeInvoiceLineItem>,
}

/// Single invoice line item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoiceLineItem {
    /// Line item kind ("subscription" or "invoiceitem").
    #[serde(rename = "type")]
    pub item_type: String,

    /// Amount in cents.
    #[serde(default)]
    pub amount: i64,

    /// Currency (lowercase, e.g., "usd").
    pub currency: String,

    /// Plan attached to subscription line items.
    pub plan: Option<StripePlan>,
}

/// Stripe Plan object (embedded in subscription line items).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePlan {
    /// Plan ID.
    pub id: String,
}

impl StripeInvoice {
    /// Find the subscription line item, skipping one-off invoice items.
    ///
    /// Referral credits arrive as negative `invoiceitem` lines on the
    /// same invoice, so the first `subscription` line is the one that
    /// carries the plan.
    pub fn subscription_line_item(&self) -> Option<&StripeInvoiceLineItem> {
        self.lines.data.iter().find(|line| line.item_type == "subscription")
    }

    /// Whether this invoice settles the customer's first real payment.
    ///
    /// Trial signups generate invoice -0001 at a zero amount; the first
    /// charged invoice arrives as -0002 with nothing left to collect and
    /// a positive subscription line.
    pub fn is_first_payment(&self, line: &StripeInvoiceLineItem) -> bool {
        self.amount_remaining <= 0
            && line.amount > 0
            && self.number.as_deref().map_or(false, |n| n.ends_with("0002"))
    }

    /// Whether this invoice marks the start of a free trial.
    ///
    /// Trial invoices bill nothing anywhere: no amount due, nothing
    /// paid, and a zero-amount subscription line.
    pub fn is_trial_start(&self, line: &StripeInvoiceLineItem) -> bool {
        self.amount_due == 0 && self.amount_paid == 0 && line.amount == 0
    }
}
