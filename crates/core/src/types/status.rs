//! Order and payment status enums.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Payment status recorded on an order.
///
/// Payments are simulated: no gateway is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
    /// Cash on delivery.
    Cod,
}

impl PaymentMethod {
    /// Status an order starts with for this method.
    ///
    /// Cash on delivery stays pending until the parcel is handed over; the other
    /// methods are treated as captured at checkout.
    #[must_use]
    pub const fn initial_status(&self) -> PaymentStatus {
        match self {
            Self::Cod => PaymentStatus::Pending,
            Self::Card | Self::Upi => PaymentStatus::Paid,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::Upi => write!(f, "upi"),
            Self::Cod => write!(f, "cod"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_payment_status() {
        assert_eq!(PaymentMethod::Cod.initial_status(), PaymentStatus::Pending);
        assert_eq!(PaymentMethod::Card.initial_status(), PaymentStatus::Paid);
        assert_eq!(PaymentMethod::Upi.initial_status(), PaymentStatus::Paid);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).ok().as_deref(),
            Some("\"cancelled\"")
        );
        assert_eq!(PaymentMethod::Upi.to_string(), "upi");
    }
}
