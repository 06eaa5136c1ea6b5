// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Ingredient, IngredientId, filter_by_prefix};

/// The read-only list of known ingredients, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceDataset {
    entries: Vec<Ingredient>,
}

impl ReferenceDataset {
    pub fn new(entries: Vec<Ingredient>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Ingredient] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry carrying `id`.
    pub fn get(&self, id: IngredientId) -> Option<&Ingredient> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn search(&self, query: &str) -> Vec<&Ingredient> {
        filter_by_prefix(query, &self.entries)
    }
}
