//! Order models, status transitions, and price computation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{StudentPublic, VendorPublic};
use crate::models::menu::MenuItem;

/// Order lifecycle states
///
/// The transition policy is deliberately permissive: the vendor picks the
/// next status freely as long as the order is not terminal. Tightening to a
/// strict forward-only table is a change to `can_transition_to` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether the vendor-driven status update may move to `next`
    pub fn can_transition_to(&self, _next: OrderStatus) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "ACCEPTED" => Ok(OrderStatus::Accepted),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "READY" => Ok(OrderStatus::Ready),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub student_id: Uuid,
    pub vendor_id: Uuid,
    pub total_amount: i64,
    pub delivery_location: String,
    pub delivery_notes: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line entity with its price snapshot
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

/// Order line with its resolved menu item
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemWithMenu {
    #[serde(flatten)]
    pub item: OrderItem,
    pub menu_item: MenuItem,
}

/// Order with lines and the counterparty's public profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub order_items: Vec<OrderItemWithMenu>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorPublic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentPublic>,
}

/// Order as returned right after creation, lines without menu resolution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub order_items: Vec<OrderItem>,
}

/// Minimal status projection for order tracking
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTracking {
    pub id: Uuid,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

/// Order creation payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub vendor_id: Uuid,
    pub items: Vec<OrderLineRequest>,
    pub delivery_location: String,
    pub delivery_notes: Option<String>,
}

/// One requested order line
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

/// Status update payload for the vendor
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// An order line priced at creation time
#[derive(Debug, Clone)]
pub struct PricedOrderLine {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

impl PricedOrderLine {
    pub fn total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// Sum of line totals, snapshotted into the order at creation
pub fn order_total(lines: &[PricedOrderLine]) -> i64 {
    lines.iter().map(PricedOrderLine::total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_admit_no_transition() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Completed.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_non_terminal_states_transition_freely() {
        for from in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ] {
            assert!(from.can_transition_to(OrderStatus::Completed));
            assert!(from.can_transition_to(OrderStatus::Cancelled));
            // Backward moves are allowed under the permissive policy
            assert!(from.can_transition_to(OrderStatus::Pending));
        }
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("DELIVERED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_total_sums_line_totals() {
        let lines = vec![
            PricedOrderLine {
                menu_item_id: Uuid::new_v4(),
                quantity: 2,
                unit_price: 1500,
            },
            PricedOrderLine {
                menu_item_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: 700,
            },
            PricedOrderLine {
                menu_item_id: Uuid::new_v4(),
                quantity: 3,
                unit_price: 250,
            },
        ];

        assert_eq!(order_total(&lines), 2 * 1500 + 700 + 3 * 250);
    }

    #[test]
    fn test_order_total_of_no_lines_is_zero() {
        assert_eq!(order_total(&[]), 0);
    }
}
