//! Order snapshot and status lifecycle
//!
//! An order captures the cart at checkout time: line items, denormalized
//! party names, and an immutable total. Status moves forward along a
//! fixed path, with a universal escape to `Cancelled` from any
//! non-terminal state:
//!
//! ```text
//! Pending -> PaymentProcessing -> Confirmed -> MeetingScheduled -> Completed
//! ```

use crate::errors::OrderError;
use crate::ids::{OrderId, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single cart line captured at checkout
///
/// `unit_price` is the price at the moment the order was placed; later
/// edits to the product never reach a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    /// Line subtotal: unit price times quantity
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Order status; wire values match the original app's raw strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Payment Processing")]
    PaymentProcessing,
    #[serde(rename = "Confirmed")]
    Confirmed,
    #[serde(rename = "Meeting Scheduled")]
    MeetingScheduled,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Check whether a transition to `next` is a permitted edge
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, PaymentProcessing) => true,
            (PaymentProcessing, Confirmed) => true,
            (Confirmed, MeetingScheduled) => true,
            (MeetingScheduled, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Human-readable name, identical to the wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::PaymentProcessing => "Payment Processing",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::MeetingScheduled => "Meeting Scheduled",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A captured transaction between a buyer and a seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<LineItem>,
    pub buyer_id: UserId,
    pub buyer_name: String,
    pub seller_id: UserId,
    pub seller_name: String,
    /// Exact sum of line subtotals at creation, immutable
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub meeting_location: Option<String>,
    #[serde(with = "crate::timestamp::iso8601::option", default)]
    pub meeting_time: Option<DateTime<Utc>>,
    #[serde(with = "crate::timestamp::iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::timestamp::iso8601")]
    pub updated_at: DateTime<Utc>,
    /// Optimistic locking counter, bumped on every mutation
    pub version: u64,
}

impl Order {
    /// Create a new pending order from a cart snapshot
    ///
    /// Fails with `OrderError::Validation` on an empty cart, a zero
    /// quantity, or a non-positive unit price.
    pub fn new(
        buyer_id: UserId,
        buyer_name: String,
        seller_id: UserId,
        seller_name: String,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::Validation(
                "Order must contain at least one item".to_string(),
            ));
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::Validation(format!(
                    "Quantity for {} must be positive",
                    item.product_id
                )));
            }
            if item.unit_price <= Decimal::ZERO {
                return Err(OrderError::Validation(format!(
                    "Unit price for {} must be positive",
                    item.product_id
                )));
            }
        }

        let total_amount = items.iter().map(LineItem::subtotal).sum();

        Ok(Self {
            id: OrderId::new(),
            items,
            buyer_id,
            buyer_name,
            seller_id,
            seller_name,
            total_amount,
            status: OrderStatus::Pending,
            payment_intent_id: None,
            meeting_location: None,
            meeting_time: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Check if the given user is a party to this order
    pub fn involves(&self, user: &UserId) -> bool {
        self.buyer_id == *user || self.seller_id == *user
    }

    /// Attach the external payment correlation id
    ///
    /// Allowed only from Pending; transitions to PaymentProcessing.
    pub fn attach_payment_intent(
        &mut self,
        intent_id: String,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(self.transition_error(OrderStatus::PaymentProcessing));
        }
        self.payment_intent_id = Some(intent_id);
        self.status = OrderStatus::PaymentProcessing;
        self.touch(now);
        Ok(())
    }

    /// Advance to `target` along a permitted edge
    pub fn advance(&mut self, target: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(self.transition_error(target));
        }
        self.status = target;
        self.touch(now);
        Ok(())
    }

    /// Record the agreed meeting place and time
    ///
    /// Allowed while Confirmed or MeetingScheduled; moves to
    /// MeetingScheduled if not already there.
    pub fn schedule_meeting(
        &mut self,
        location: String,
        time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if !matches!(
            self.status,
            OrderStatus::Confirmed | OrderStatus::MeetingScheduled
        ) {
            return Err(self.transition_error(OrderStatus::MeetingScheduled));
        }
        self.meeting_location = Some(location);
        self.meeting_time = Some(time);
        self.status = OrderStatus::MeetingScheduled;
        self.touch(now);
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }

    fn transition_error(&self, to: OrderStatus) -> OrderError {
        OrderError::InvalidTransition {
            from: self.status.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }
}
