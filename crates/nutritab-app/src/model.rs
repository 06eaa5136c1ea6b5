// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::iter::Sum;
use std::ops::Add;

use crate::{IngredientId, ReferenceDataset, rule_of_three};

/// Legacy identity reported for rows that are not linked to a reference entry.
pub const UNMATCHED_ID: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Nutrients {
    pub protein: f64,
    pub carbs: f64,
    pub lipids: f64,
    pub kcal: f64,
}

impl Nutrients {
    pub const ZERO: Self = Self {
        protein: 0.0,
        carbs: 0.0,
        lipids: 0.0,
        kcal: 0.0,
    };

    /// Scales every nutrient from `reference_weight` to `target_weight`.
    pub fn scaled(self, target_weight: f64, reference_weight: f64) -> Self {
        Self {
            protein: rule_of_three(target_weight, reference_weight, self.protein),
            carbs: rule_of_three(target_weight, reference_weight, self.carbs),
            lipids: rule_of_three(target_weight, reference_weight, self.lipids),
            kcal: rule_of_three(target_weight, reference_weight, self.kcal),
        }
    }

    pub const fn get(self, column: NutrientColumn) -> f64 {
        match column {
            NutrientColumn::Protein => self.protein,
            NutrientColumn::Carbs => self.carbs,
            NutrientColumn::Lipids => self.lipids,
            NutrientColumn::Kcal => self.kcal,
        }
    }
}

impl Add for Nutrients {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            lipids: self.lipids + rhs.lipids,
            kcal: self.kcal + rhs.kcal,
        }
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientColumn {
    Protein,
    Carbs,
    Lipids,
    Kcal,
}

impl NutrientColumn {
    /// Render and export order.
    pub const ALL: [Self; 4] = [Self::Protein, Self::Carbs, Self::Lipids, Self::Kcal];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Protein => "protein",
            Self::Carbs => "carbs",
            Self::Lipids => "lipids",
            Self::Kcal => "kcal",
        }
    }
}

/// A reference dataset entry. Nutrients are valid for `weight` grams.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub weight: f64,
    pub nutrients: Nutrients,
}

/// One line of the selection list.
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientRow {
    /// Free text. Nutrients are stored as-is and never recalculated.
    Unmatched {
        name: String,
        weight: f64,
        nutrients: Nutrients,
    },
    /// Linked to a reference entry; nutrients are derived from it.
    Matched {
        reference_id: IngredientId,
        name: String,
        weight: f64,
    },
}

impl IngredientRow {
    pub fn empty() -> Self {
        Self::Unmatched {
            name: String::new(),
            weight: 0.0,
            nutrients: Nutrients::ZERO,
        }
    }

    pub fn from_reference(reference: &Ingredient) -> Self {
        Self::Matched {
            reference_id: reference.id,
            name: reference.name.clone(),
            weight: reference.weight,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Unmatched { name, .. } | Self::Matched { name, .. } => name,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Self::Unmatched { weight, .. } | Self::Matched { weight, .. } => *weight,
        }
    }

    pub fn reference_id(&self) -> Option<IngredientId> {
        match self {
            Self::Unmatched { .. } => None,
            Self::Matched { reference_id, .. } => Some(*reference_id),
        }
    }

    pub fn id(&self) -> i64 {
        self.reference_id().map_or(UNMATCHED_ID, IngredientId::get)
    }

    pub fn nutrients(&self, dataset: &ReferenceDataset) -> Nutrients {
        match self {
            Self::Unmatched { nutrients, .. } => *nutrients,
            Self::Matched {
                reference_id,
                weight,
                ..
            } => dataset
                .get(*reference_id)
                .map_or(Nutrients::ZERO, |reference| {
                    // At the reference weight the row is the reference entry.
                    if *weight == reference.weight {
                        reference.nutrients
                    } else {
                        reference.nutrients.scaled(*weight, reference.weight)
                    }
                }),
        }
    }

    pub(crate) fn set_name(&mut self, value: String) {
        match self {
            Self::Unmatched { name, .. } | Self::Matched { name, .. } => *name = value,
        }
    }

    pub(crate) fn set_weight(&mut self, value: f64) {
        match self {
            Self::Unmatched { weight, .. } | Self::Matched { weight, .. } => *weight = value,
        }
    }
}

/// Rounds half away from zero at two decimals using a decimal exponent shift,
/// so `1.005` becomes `1.01` rather than suffering binary representation error.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let shifted = format!("{value}e2")
        .parse::<f64>()
        .unwrap_or(value * 100.0);
    let rounded = shifted.round();
    format!("{rounded}e-2").parse::<f64>().unwrap_or(rounded / 100.0)
}

/// Shortest round-trip text for a number, spelled the way spreadsheets read it.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if value == 0.0 {
        return "0".to_owned();
    }
    value.to_string()
}
