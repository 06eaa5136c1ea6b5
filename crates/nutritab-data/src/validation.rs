// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidId,
    NegativeId,
    EmptyName,
    InvalidWeight,
    NonPositiveWeight,
    InvalidNutrient,
    NegativeNutrient,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId => f.write_str("invalid id value"),
            Self::NegativeId => f.write_str("negative id value"),
            Self::EmptyName => f.write_str("empty name"),
            Self::InvalidWeight => f.write_str("invalid weight value"),
            Self::NonPositiveWeight => f.write_str("weight must be positive"),
            Self::InvalidNutrient => f.write_str("invalid nutrient value"),
            Self::NegativeNutrient => f.write_str("negative nutrient value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn parse_id(input: &str) -> ValidationResult<i64> {
    let id = input
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidId)?;
    if id < 0 {
        return Err(ValidationError::NegativeId);
    }
    Ok(id)
}

pub fn parse_name(input: &str) -> ValidationResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

/// Reference weights divide every scaled value, so zero is rejected here.
pub fn parse_reference_weight(input: &str) -> ValidationResult<f64> {
    let weight = parse_finite(input).ok_or(ValidationError::InvalidWeight)?;
    if weight <= 0.0 {
        return Err(ValidationError::NonPositiveWeight);
    }
    Ok(weight)
}

/// Blank nutrient cells read as zero.
pub fn parse_nutrient(input: &str) -> ValidationResult<f64> {
    if input.trim().is_empty() {
        return Ok(0.0);
    }
    let value = parse_finite(input).ok_or(ValidationError::InvalidNutrient)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeNutrient);
    }
    Ok(value)
}

fn parse_finite(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
