//! Suggested transaction categories.
//!
//! Categories are free text on a transaction; these lists are what front-ends
//! offer by default for each kind. The `code` is what gets stored.

use serde::{Deserialize, Serialize};

use crate::TransactionKind;

/// Category attached to the opening transaction of a new asset.
pub const OPENING_BALANCE_CATEGORY: &str = "OPENING_BALANCE";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WasteCategory {
    Products,
    CafeAndRestaurants,
    Transport,
    Hcs,
    Leisure,
    ClothingAndShoes,
    Sport,
    HealthAndBeauty,
    Subscriptions,
    TaxesAndPenalties,
    Learning,
    Gifts,
    Technique,
    Traveling,
    Realty,
    #[serde(rename = "OTHER_WASTE")]
    Other,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 16] = [
        Self::Products,
        Self::CafeAndRestaurants,
        Self::Transport,
        Self::Hcs,
        Self::Leisure,
        Self::ClothingAndShoes,
        Self::Sport,
        Self::HealthAndBeauty,
        Self::Subscriptions,
        Self::TaxesAndPenalties,
        Self::Learning,
        Self::Gifts,
        Self::Technique,
        Self::Traveling,
        Self::Realty,
        Self::Other,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Products => "PRODUCTS",
            Self::CafeAndRestaurants => "CAFE_AND_RESTAURANTS",
            Self::Transport => "TRANSPORT",
            Self::Hcs => "HCS",
            Self::Leisure => "LEISURE",
            Self::ClothingAndShoes => "CLOTHING_AND_SHOES",
            Self::Sport => "SPORT",
            Self::HealthAndBeauty => "HEALTH_AND_BEAUTY",
            Self::Subscriptions => "SUBSCRIPTIONS",
            Self::TaxesAndPenalties => "TAXES_AND_PENALTIES",
            Self::Learning => "LEARNING",
            Self::Gifts => "GIFTS",
            Self::Technique => "TECHNIQUE",
            Self::Traveling => "TRAVELING",
            Self::Realty => "REALTY",
            Self::Other => "OTHER_WASTE",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Products => "Products",
            Self::CafeAndRestaurants => "Cafe and restaurants",
            Self::Transport => "Transport",
            // Housing and communal services.
            Self::Hcs => "HCS",
            Self::Leisure => "Leisure",
            Self::ClothingAndShoes => "Clothing and shoes",
            Self::Sport => "Sport",
            Self::HealthAndBeauty => "Health and beauty",
            Self::Subscriptions => "Subscriptions",
            Self::TaxesAndPenalties => "Taxes and penalties",
            Self::Learning => "Learning",
            Self::Gifts => "Gifts",
            Self::Technique => "Technique",
            Self::Traveling => "Traveling",
            Self::Realty => "Realty",
            Self::Other => "Other waste",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefillCategory {
    Salary,
    Bonus,
    Cashback,
    Sale,
    Investment,
    #[serde(rename = "OTHER_REFILL")]
    Other,
}

impl RefillCategory {
    pub const ALL: [RefillCategory; 6] = [
        Self::Salary,
        Self::Bonus,
        Self::Cashback,
        Self::Sale,
        Self::Investment,
        Self::Other,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Salary => "SALARY",
            Self::Bonus => "BONUS",
            Self::Cashback => "CASHBACK",
            Self::Sale => "SALE",
            Self::Investment => "INVESTMENT",
            Self::Other => "OTHER_REFILL",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Salary => "Salary",
            Self::Bonus => "Bonus",
            Self::Cashback => "Cashback",
            Self::Sale => "Sale",
            Self::Investment => "Investment",
            Self::Other => "Other refill",
        }
    }
}

/// A category offered to the user: stored code plus display label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SuggestedCategory {
    pub code: &'static str,
    pub label: &'static str,
}

/// Default categories for a transaction kind. Transfers have none.
#[must_use]
pub fn suggested_categories(kind: TransactionKind) -> Vec<SuggestedCategory> {
    match kind {
        TransactionKind::Waste => WasteCategory::ALL
            .iter()
            .map(|c| SuggestedCategory {
                code: c.code(),
                label: c.label(),
            })
            .collect(),
        TransactionKind::Refill => RefillCategory::ALL
            .iter()
            .map(|c| SuggestedCategory {
                code: c.code(),
                label: c.label(),
            })
            .collect(),
        TransactionKind::Transfer => Vec::new(),
    }
}
