use serde::Serialize;

use crate::ValidationError;

/// A redeemable reward from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gift {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: i64,
}

impl Gift {
    /// # Errors
    ///
    /// Returns [`ValidationError::InsufficientPoints`] when `balance` is below the cost.
    pub fn check_affordable(&self, balance: i64) -> Result<(), ValidationError> {
        if balance < self.cost {
            return Err(ValidationError::InsufficientPoints {
                available: balance,
                required: self.cost,
            });
        }
        Ok(())
    }
}

pub const GIFT_CATALOG: [Gift; 4] = [
    Gift {
        id: "americano",
        name: "Starbucks Americano",
        cost: 500,
    },
    Gift {
        id: "convenience-3000",
        name: "Convenience store 3,000 KRW voucher",
        cost: 300,
    },
    Gift {
        id: "burger-set",
        name: "McDonald's Big Mac set",
        cost: 700,
    },
    Gift {
        id: "movie-ticket",
        name: "CGV movie ticket",
        cost: 1000,
    },
];

#[must_use]
pub fn find_gift(id: &str) -> Option<&'static Gift> {
    GIFT_CATALOG.iter().find(|g| g.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let ids: HashSet<_> = GIFT_CATALOG.iter().map(|g| g.id).collect();
        assert_eq!(ids.len(), GIFT_CATALOG.len());
    }

    #[test]
    fn find_gift_by_id() {
        assert_eq!(find_gift("movie-ticket").map(|g| g.cost), Some(1000));
        assert!(find_gift("yacht").is_none());
    }

    #[test]
    fn affordability_is_inclusive() {
        let gift = find_gift("americano").unwrap();
        assert!(gift.check_affordable(500).is_ok());
        assert_eq!(
            gift.check_affordable(499).unwrap_err(),
            ValidationError::InsufficientPoints {
                available: 499,
                required: 500
            }
        );
    }
}
