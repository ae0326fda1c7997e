//! Order lifecycle state machine.
//!
//! The pipeline only answers whether a requested transition is legal; the
//! dashboard and supplier callbacks decide when to ask.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    SentToSupplier,
    ConfirmedBySupplier,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        Self::Pending, Self::Processing, Self::SentToSupplier, Self::ConfirmedBySupplier,
        Self::Shipped, Self::Delivered, Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::SentToSupplier => "sent_to_supplier",
            Self::ConfirmedBySupplier => "confirmed_by_supplier",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Allowed next states. Every non-terminal state may be cancelled.
    pub fn successors(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::SentToSupplier, Self::Cancelled],
            Self::SentToSupplier => &[Self::ConfirmedBySupplier, Self::Cancelled],
            Self::ConfirmedBySupplier => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered, Self::Cancelled],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool { self.successors().contains(&target) }

    pub fn check_transition(&self, target: OrderStatus) -> Result<(), TransitionError> {
        if self.can_transition_to(target) { Ok(()) } else { Err(TransitionError { from: *self, to: target }) }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid", Self::Failed => "failed", Self::Refunded => "refunded" }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition from `{from}` to `{to}`")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}`")]
pub struct UnknownStatus(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let path = [
            OrderStatus::Pending, OrderStatus::Processing, OrderStatus::SentToSupplier,
            OrderStatus::ConfirmedBySupplier, OrderStatus::Shipped, OrderStatus::Delivered,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_soundness_over_all_pairs() {
        let allowed = [
            (OrderStatus::Pending, OrderStatus::Processing),
            (OrderStatus::Processing, OrderStatus::SentToSupplier),
            (OrderStatus::SentToSupplier, OrderStatus::ConfirmedBySupplier),
            (OrderStatus::ConfirmedBySupplier, OrderStatus::Shipped),
            (OrderStatus::Shipped, OrderStatus::Delivered),
        ];
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = allowed.contains(&(from, to)) || (to == OrderStatus::Cancelled && !from.is_terminal());
                assert_eq!(from.check_transition(to).is_ok(), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_terminal_states_are_dead_ends() {
        assert!(OrderStatus::Delivered.successors().is_empty());
        assert!(OrderStatus::Cancelled.successors().is_empty());
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_error_names_states() {
        let err = OrderStatus::Pending.check_transition(OrderStatus::Shipped).unwrap_err();
        assert_eq!(err.to_string(), "invalid transition from `pending` to `shipped`");
    }

    #[test]
    fn test_parse_round_trip_names() {
        assert_eq!("sent_to_supplier".parse::<OrderStatus>().unwrap(), OrderStatus::SentToSupplier);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!("refunded".parse::<PaymentStatus>().unwrap(), PaymentStatus::Refunded);
    }
}
