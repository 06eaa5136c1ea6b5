// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Proportional value for `target_weight`, given `reference_value` at
/// `reference_weight`. A zero reference weight is not special-cased and
/// yields an IEEE infinity or NaN.
pub fn rule_of_three(target_weight: f64, reference_weight: f64, reference_value: f64) -> f64 {
    target_weight * reference_value / reference_weight
}
