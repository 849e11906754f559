//! Item records.

use crate::error::DomainError;
use crate::id::{ItemId, UserId};

/// A persisted item, always owned by exactly one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub owner_id: UserId,
}

/// An item accepted for creation but not yet stored.
///
/// # Invariants
/// - `price` is finite and strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    title: String,
    description: Option<String>,
    price: f64,
}

impl NewItem {
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        price: f64,
    ) -> Result<Self, DomainError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(DomainError::invariant("price must be greater than 0"));
        }
        Ok(Self {
            title: title.into(),
            description,
            price,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Attach store-assigned identity.
    pub fn into_item(self, id: ItemId, owner_id: UserId) -> Item {
        Item {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            owner_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_price_is_an_invariant_violation() {
        for price in [0.0, -0.01, -100.0, f64::NAN] {
            assert!(NewItem::new("t", None, price).is_err(), "price {price} accepted");
        }
    }

    #[test]
    fn into_item_keeps_fields() {
        let new_item = NewItem::new("Lamp", Some("desk".into()), 9.5).unwrap();
        let item = new_item.into_item(ItemId::new(3).unwrap(), UserId::new(7).unwrap());
        assert_eq!(item.title, "Lamp");
        assert_eq!(item.description.as_deref(), Some("desk"));
        assert_eq!(item.owner_id.get(), 7);
    }
}
