// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    Ingredient, IngredientId, IngredientRow, Nutrients, ReferenceDataset, format_number,
};

/// Suggestions shown under one row's name field.
#[derive(Debug, Clone, PartialEq)]
pub struct Autocomplete<'d> {
    pub row: usize,
    pub options: Vec<&'d Ingredient>,
    pub highlighted: usize,
}

impl<'d> Autocomplete<'d> {
    pub fn highlighted_option(&self) -> Option<&'d Ingredient> {
        self.options.get(self.highlighted).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCommand {
    EditName { row: usize, value: String },
    EditWeight { row: usize, raw: String },
    SelectSuggestion { row: usize, reference_id: IngredientId },
    MoveSuggestion(isize),
    DismissSuggestions,
    AddRow,
    RemoveRow(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    RowUpdated(usize),
    RowMatched { row: usize, reference_id: IngredientId },
    RowAdded(usize),
    RowRemoved(usize),
    SuggestionsShown { row: usize, count: usize },
    SuggestionHighlighted(usize),
    SuggestionsCleared,
}

/// The selection list plus its suggestion state, bound to one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState<'d> {
    dataset: &'d ReferenceDataset,
    rows: Vec<IngredientRow>,
    autocomplete: Option<Autocomplete<'d>>,
}

impl<'d> TableState<'d> {
    pub fn new(dataset: &'d ReferenceDataset) -> Self {
        Self::with_rows(dataset, vec![IngredientRow::empty()])
    }

    pub fn with_rows(dataset: &'d ReferenceDataset, rows: Vec<IngredientRow>) -> Self {
        Self {
            dataset,
            rows,
            autocomplete: None,
        }
    }

    pub fn dataset(&self) -> &'d ReferenceDataset {
        self.dataset
    }

    pub fn rows(&self) -> &[IngredientRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_nutrients(&self, index: usize) -> Option<Nutrients> {
        self.rows
            .get(index)
            .map(|row| row.nutrients(self.dataset))
    }

    pub fn autocomplete(&self) -> Option<&Autocomplete<'d>> {
        self.autocomplete.as_ref()
    }

    pub fn suggestions_for(&self, row: usize) -> Option<&Autocomplete<'d>> {
        self.autocomplete
            .as_ref()
            .filter(|autocomplete| autocomplete.row == row)
    }

    /// Unrounded per-nutrient sums over every row.
    pub fn totals(&self) -> Nutrients {
        self.rows
            .iter()
            .map(|row| row.nutrients(self.dataset))
            .sum()
    }

    /// Tab-separated rows ready to paste into a spreadsheet:
    /// `name, weight, protein, carbs, lipids, kcal`, one line per row.
    pub fn export_tsv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let nutrients = row.nutrients(self.dataset);
            let fields = [
                row.name().to_owned(),
                format_number(row.weight()),
                format_number(nutrients.protein),
                format_number(nutrients.carbs),
                format_number(nutrients.lipids),
                format_number(nutrients.kcal),
            ];
            out.push_str(&fields.join("\t"));
            out.push('\n');
        }
        out
    }

    pub fn dispatch(&mut self, command: TableCommand) -> Vec<TableEvent> {
        match command {
            TableCommand::EditName { row, value } => self.edit_name(row, value),
            TableCommand::EditWeight { row, raw } => self.edit_weight(row, &raw),
            TableCommand::SelectSuggestion { row, reference_id } => {
                self.select_suggestion(row, reference_id)
            }
            TableCommand::MoveSuggestion(delta) => self.move_suggestion(delta),
            TableCommand::DismissSuggestions => self.clear_suggestions(),
            TableCommand::AddRow => {
                self.rows.push(IngredientRow::empty());
                vec![TableEvent::RowAdded(self.rows.len() - 1)]
            }
            TableCommand::RemoveRow(index) => self.remove_row(index),
        }
    }

    fn edit_name(&mut self, index: usize, value: String) -> Vec<TableEvent> {
        let dataset = self.dataset;
        let Some(row) = self.rows.get_mut(index) else {
            return Vec::new();
        };
        let options = dataset.search(&value);
        row.set_name(value);

        let mut events = vec![TableEvent::RowUpdated(index)];
        if options.is_empty() {
            events.extend(self.clear_suggestions());
        } else {
            events.push(TableEvent::SuggestionsShown {
                row: index,
                count: options.len(),
            });
            self.autocomplete = Some(Autocomplete {
                row: index,
                options,
                highlighted: 0,
            });
        }
        events
    }

    fn edit_weight(&mut self, index: usize, raw: &str) -> Vec<TableEvent> {
        let Some(row) = self.rows.get_mut(index) else {
            return Vec::new();
        };
        row.set_weight(parse_weight(raw));
        vec![TableEvent::RowUpdated(index)]
    }

    fn select_suggestion(&mut self, index: usize, reference_id: IngredientId) -> Vec<TableEvent> {
        let Some(reference) = self.dataset.get(reference_id) else {
            return Vec::new();
        };
        let Some(row) = self.rows.get_mut(index) else {
            return Vec::new();
        };
        *row = IngredientRow::from_reference(reference);

        let mut events = vec![TableEvent::RowMatched {
            row: index,
            reference_id,
        }];
        events.extend(self.clear_suggestions());
        events
    }

    fn move_suggestion(&mut self, delta: isize) -> Vec<TableEvent> {
        let Some(autocomplete) = self.autocomplete.as_mut() else {
            return Vec::new();
        };
        let len = autocomplete.options.len() as isize;
        if len == 0 {
            return Vec::new();
        }
        let next = (autocomplete.highlighted as isize + delta).rem_euclid(len) as usize;
        autocomplete.highlighted = next;
        vec![TableEvent::SuggestionHighlighted(next)]
    }

    fn remove_row(&mut self, index: usize) -> Vec<TableEvent> {
        if index >= self.rows.len() {
            return Vec::new();
        }
        self.rows.remove(index);

        let mut events = vec![TableEvent::RowRemoved(index)];
        match self.autocomplete.as_ref().map(|autocomplete| autocomplete.row) {
            Some(owner) if owner == index => events.extend(self.clear_suggestions()),
            Some(owner) if owner > index => {
                if let Some(autocomplete) = self.autocomplete.as_mut() {
                    autocomplete.row = owner - 1;
                }
            }
            _ => {}
        }
        events
    }

    fn clear_suggestions(&mut self) -> Vec<TableEvent> {
        match self.autocomplete.take() {
            Some(_) => vec![TableEvent::SuggestionsCleared],
            None => Vec::new(),
        }
    }
}

/// Best-effort numeric reading of a weight field: blank or unparsable input
/// reads as zero.
pub fn parse_weight(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}
