//! Value objects for the order domain.

use chrono::{DateTime, Utc};
use common::{BuyerId, FarmerId, ItemId, ProductId};
use serde::{Deserialize, Serialize};

use super::ItemStatus;

/// Money amount held in minor currency units (paise) to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    minor: i64,
}

impl Money {
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates an amount from whole currency units.
    pub fn from_major(major: i64) -> Self {
        Self { minor: major * 100 }
    }

    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns the whole-unit portion.
    pub fn major(&self) -> i64 {
        self.minor / 100
    }

    /// Returns the minor-unit remainder after [`Money::major`].
    pub fn minor_part(&self) -> i64 {
        self.minor.abs() % 100
    }

    pub fn is_negative(&self) -> bool {
        self.minor < 0
    }

    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            minor: self.minor * i64::from(quantity),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        write!(f, "{sign}₹{}.{:02}", self.major().abs(), self.minor_part())
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor + rhs.minor,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.minor += rhs.minor;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// How the buyer pays. Only cash on delivery is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
}

/// Who is asking for a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "lowercase")]
pub enum Actor {
    Buyer(BuyerId),
    Farmer(FarmerId),
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Buyer(id) => write!(f, "buyer:{id}"),
            Actor::Farmer(id) => write!(f, "farmer:{id}"),
        }
    }
}

/// Line item input at checkout, before the order assigns status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub farmer_id: FarmerId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl NewLineItem {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        farmer_id: FarmerId,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            farmer_id,
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// One product-farmer-quantity record inside an order.
///
/// Everything except `status` and `cancelled_at` is fixed at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: ItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub farmer_id: FarmerId,
    pub quantity: u32,
    /// Price snapshotted at checkout.
    pub unit_price: Money,
    pub status: ItemStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl LineItem {
    pub fn pending(item_id: ItemId, new: NewLineItem) -> Self {
        Self {
            item_id,
            product_id: new.product_id,
            product_name: new.product_name,
            farmer_id: new.farmer_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
            status: ItemStatus::Pending,
            cancelled_at: None,
        }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    pub fn is_owned_by(&self, farmer_id: FarmerId) -> bool {
        self.farmer_id == farmer_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_accessors() {
        let money = Money::from_minor(1234);
        assert_eq!(money.minor(), 1234);
        assert_eq!(money.major(), 12);
        assert_eq!(money.minor_part(), 34);
        assert_eq!(Money::from_major(50).minor(), 5000);
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_minor(1234).to_string(), "₹12.34");
        assert_eq!(Money::from_minor(5).to_string(), "₹0.05");
        assert_eq!(Money::from_minor(-1234).to_string(), "-₹12.34");
    }

    #[test]
    fn money_sums_and_multiplies() {
        let total: Money = [Money::from_minor(100), Money::from_minor(30)]
            .into_iter()
            .sum();
        assert_eq!(total.minor(), 130);
        assert_eq!(Money::from_minor(50).multiply(2).minor(), 100);
    }

    #[test]
    fn money_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_minor(999)).unwrap();
        assert_eq!(json, "999");
    }

    #[test]
    fn actor_wire_shape() {
        let farmer = FarmerId::new();
        let json = serde_json::to_value(Actor::Farmer(farmer)).unwrap();
        assert_eq!(json["role"], "farmer");
        assert_eq!(json["id"], farmer.to_string());

        let parsed: Actor = serde_json::from_value(serde_json::json!({
            "role": "buyer",
            "id": "7f0c3c59-2c1e-4c36-9a53-2f6f6f0a6a11",
        }))
        .unwrap();
        assert!(matches!(parsed, Actor::Buyer(_)));
    }

    #[test]
    fn pending_line_item_snapshots_input() {
        let farmer = FarmerId::new();
        let new = NewLineItem::new(ProductId::new(), "Tomatoes", farmer, 3, Money::from_minor(40));
        let item = LineItem::pending(ItemId::new(), new);

        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.cancelled_at, None);
        assert_eq!(item.line_total().minor(), 120);
        assert!(item.is_owned_by(farmer));
        assert!(!item.is_owned_by(FarmerId::new()));
    }
}
