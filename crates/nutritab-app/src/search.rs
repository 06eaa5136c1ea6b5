// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::Ingredient;

/// Lower-cased, diacritic-free form of `input` used for name matching.
///
/// Canonical decomposition strips accents (`Ó` -> `O`); Latin letters that
/// have no decomposition (`ø`, `ß`, `æ`, ...) are folded explicitly.
pub fn normalize_for_match(input: &str) -> String {
    let mut folded = String::with_capacity(input.len());
    for ch in input.nfd().filter(|ch| !is_combining_mark(*ch)) {
        match fold_latin_letter(ch) {
            Some(replacement) => folded.push_str(replacement),
            None => folded.push(ch),
        }
    }
    folded.to_lowercase()
}

fn fold_latin_letter(ch: char) -> Option<&'static str> {
    let replacement = match ch {
        'Æ' => "Ae",
        'æ' => "ae",
        'Ð' | 'Đ' => "D",
        'ð' | 'đ' => "d",
        'Ø' => "O",
        'ø' => "o",
        'Þ' => "Th",
        'þ' => "th",
        'ß' => "ss",
        'Ħ' => "H",
        'ħ' => "h",
        'ı' => "i",
        'Ĳ' => "IJ",
        'ĳ' => "ij",
        'Ŀ' | 'Ł' => "L",
        'ŀ' | 'ł' => "l",
        'Ŋ' => "N",
        'ŋ' => "n",
        'Œ' => "Oe",
        'œ' => "oe",
        'Ŧ' => "T",
        'ŧ' => "t",
        'ſ' => "s",
        _ => return None,
    };
    Some(replacement)
}

/// Entries whose normalized name starts with the normalized `query`, in
/// dataset order. A blank query matches nothing.
///
/// Blankness is judged on the trimmed query, but the prefix test uses the
/// query as typed, so a trailing space narrows the match.
pub fn filter_by_prefix<'d>(query: &str, dataset: &'d [Ingredient]) -> Vec<&'d Ingredient> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = normalize_for_match(query);
    dataset
        .iter()
        .filter(|entry| normalize_for_match(&entry.name).starts_with(&needle))
        .collect()
}
