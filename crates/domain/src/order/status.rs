//! Line-item state machine and the order-level status derived from it.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// Fulfillment status of a single line item.
///
/// ```text
/// Pending ──► Accepted ──► Shipped ──► Delivered
///    │           │
///    └───────────┴──► Cancelled
/// ```
///
/// `Shipped` can only move on to `Delivered`; it can no longer be cancelled.
/// `Delivered` and `Cancelled` accept no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    #[default]
    Pending,
    Accepted,
    Shipped,
    Delivered,
    Cancelled,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 5] = [
        ItemStatus::Pending,
        ItemStatus::Accepted,
        ItemStatus::Shipped,
        ItemStatus::Delivered,
        ItemStatus::Cancelled,
    ];

    /// The single status a farmer may advance to from here, if any.
    pub fn next_forward(&self) -> Option<ItemStatus> {
        match self {
            ItemStatus::Pending => Some(ItemStatus::Accepted),
            ItemStatus::Accepted => Some(ItemStatus::Shipped),
            ItemStatus::Shipped => Some(ItemStatus::Delivered),
            ItemStatus::Delivered | ItemStatus::Cancelled => None,
        }
    }

    /// Returns true if the item may still be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, ItemStatus::Pending | ItemStatus::Accepted)
    }

    /// Returns true if no further transitions are accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Delivered | ItemStatus::Cancelled)
    }

    /// Validates a forward step to `target`.
    pub fn check_advance(&self, target: ItemStatus) -> Result<(), OrderError> {
        if self.is_terminal() || self.next_forward() != Some(target) {
            return Err(OrderError::InvalidTransition {
                from: *self,
                to: target,
            });
        }
        Ok(())
    }

    /// Validates a cancellation.
    pub fn check_cancel(&self) -> Result<(), OrderError> {
        if !self.can_cancel() {
            return Err(OrderError::InvalidTransition {
                from: *self,
                to: ItemStatus::Cancelled,
            });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Accepted => "Accepted",
            ItemStatus::Shipped => "Shipped",
            ItemStatus::Delivered => "Delivered",
            ItemStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// Order-level status. Never set directly: always derived from the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Derives the order status from the current item statuses.
    ///
    /// Precedence: all cancelled, then all delivered, then any shipped, then
    /// any accepted, else pending. Recomputed from scratch on every change.
    pub fn derive(items: impl IntoIterator<Item = ItemStatus>) -> OrderStatus {
        let mut all_cancelled = true;
        let mut all_delivered = true;
        let mut any_shipped = false;
        let mut any_accepted = false;
        let mut seen = false;

        for status in items {
            seen = true;
            all_cancelled &= status == ItemStatus::Cancelled;
            all_delivered &= status == ItemStatus::Delivered;
            any_shipped |= status == ItemStatus::Shipped;
            any_accepted |= status == ItemStatus::Accepted;
        }

        if !seen {
            OrderStatus::Pending
        } else if all_cancelled {
            OrderStatus::Cancelled
        } else if all_delivered {
            OrderStatus::Delivered
        } else if any_shipped {
            OrderStatus::Shipped
        } else if any_accepted {
            OrderStatus::Accepted
        } else {
            OrderStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ItemStatus::*;

    #[test]
    fn forward_path_is_one_step_at_a_time() {
        assert!(Pending.check_advance(Accepted).is_ok());
        assert!(Accepted.check_advance(Shipped).is_ok());
        assert!(Shipped.check_advance(Delivered).is_ok());

        assert!(matches!(
            Pending.check_advance(Shipped),
            Err(OrderError::InvalidTransition {
                from: Pending,
                to: Shipped
            })
        ));
        assert!(Pending.check_advance(Delivered).is_err());
        assert!(Accepted.check_advance(Accepted).is_err());
        assert!(Accepted.check_advance(Pending).is_err());
        assert!(Shipped.check_advance(Shipped).is_err());
        assert!(Shipped.check_advance(Accepted).is_err());
    }

    #[test]
    fn shipped_items_can_be_delivered_but_not_cancelled() {
        assert!(!Shipped.is_terminal());
        assert_eq!(Shipped.next_forward(), Some(Delivered));
        assert!(Shipped.check_advance(Delivered).is_ok());
        assert!(matches!(
            Shipped.check_cancel(),
            Err(OrderError::InvalidTransition {
                from: Shipped,
                to: Cancelled
            })
        ));
    }

    #[test]
    fn terminal_states_reject_everything() {
        for from in [Delivered, Cancelled] {
            assert!(from.is_terminal());
            for to in ItemStatus::ALL {
                assert!(from.check_advance(to).is_err(), "{from} -> {to}");
            }
            assert!(from.check_cancel().is_err());
        }
    }

    #[test]
    fn cancellation_only_from_pending_or_accepted() {
        assert!(Pending.check_cancel().is_ok());
        assert!(Accepted.check_cancel().is_ok());
        assert!(!Shipped.can_cancel());
        assert!(!Delivered.can_cancel());
        assert!(!Cancelled.can_cancel());
    }

    #[test]
    fn parse_accepts_known_names_case_insensitively() {
        assert_eq!("Accepted".parse::<ItemStatus>().unwrap(), Accepted);
        assert_eq!("shipped".parse::<ItemStatus>().unwrap(), Shipped);
        assert!(matches!(
            "Lost".parse::<ItemStatus>(),
            Err(OrderError::UnknownStatus(s)) if s == "Lost"
        ));
    }

    #[test]
    fn derive_follows_precedence_chain() {
        let cases: &[(&[ItemStatus], OrderStatus)] = &[
            (&[Shipped, Accepted], OrderStatus::Shipped),
            (&[Delivered, Cancelled], OrderStatus::Pending),
            (&[Cancelled, Cancelled], OrderStatus::Cancelled),
            (&[Delivered, Delivered], OrderStatus::Delivered),
            (&[Pending, Accepted], OrderStatus::Accepted),
            (&[Pending, Pending], OrderStatus::Pending),
            (&[Shipped, Cancelled], OrderStatus::Shipped),
            (&[Delivered, Shipped], OrderStatus::Shipped),
            (&[Accepted, Cancelled], OrderStatus::Accepted),
        ];

        for (items, expected) in cases {
            assert_eq!(
                OrderStatus::derive(items.iter().copied()),
                *expected,
                "{items:?}"
            );
        }
    }

    #[test]
    fn derive_is_order_independent() {
        let a = OrderStatus::derive([Pending, Shipped, Cancelled]);
        let b = OrderStatus::derive([Cancelled, Pending, Shipped]);
        assert_eq!(a, b);
    }

    #[test]
    fn default_is_pending() {
        assert_eq!(ItemStatus::default(), Pending);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }
}
