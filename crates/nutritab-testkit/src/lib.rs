// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use nutritab_app::{Ingredient, IngredientId, IngredientRow, Nutrients, ReferenceDataset};
use std::path::PathBuf;

const FOOD_NAMES: [&str; 16] = [
    "Arroz", "Avena", "Brócoli", "Camote", "Frijol", "Garbanzo", "Huevo", "Lenteja", "Manzana",
    "Nuez", "Papa", "Plátano", "Pollo", "Queso", "Salmón", "Tofu",
];

const FOOD_STYLES: [&str; 8] = [
    "cocido",
    "crudo",
    "asado",
    "al vapor",
    "integral",
    "light",
    "orgánico",
    "en polvo",
];

/// Header and rows in the column order of the upstream dataset file.
pub const SAMPLE_CSV: &str = "\
id,name,weight,carbs,protein,kcal,lipids
1,Arroz blanco,100,28,2.7,130,0.3
2,Avena,40,27,5,150,2.5
5,Pollo,100,0,20,150,2
6,Plátano,120,27,1.3,105,0.4
7,Huevo,50,0.5,6,70,5
";

pub fn ingredient(id: i64, name: &str, weight: f64, nutrients: [f64; 4]) -> Ingredient {
    let [protein, carbs, lipids, kcal] = nutrients;
    Ingredient {
        id: IngredientId::new(id),
        name: name.to_owned(),
        weight,
        nutrients: Nutrients {
            protein,
            carbs,
            lipids,
            kcal,
        },
    }
}

/// Reference entry 5: 100 g with 20 protein, 0 carbs, 2 lipids, 150 kcal.
pub fn chicken() -> Ingredient {
    ingredient(5, "Pollo", 100.0, [20.0, 0.0, 2.0, 150.0])
}

/// Same entries as [`SAMPLE_CSV`].
pub fn sample_dataset() -> ReferenceDataset {
    ReferenceDataset::new(vec![
        ingredient(1, "Arroz blanco", 100.0, [2.7, 28.0, 0.3, 130.0]),
        ingredient(2, "Avena", 40.0, [5.0, 27.0, 2.5, 150.0]),
        chicken(),
        ingredient(6, "Plátano", 120.0, [1.3, 27.0, 0.4, 105.0]),
        ingredient(7, "Huevo", 50.0, [6.0, 0.5, 5.0, 70.0]),
    ])
}

pub fn unmatched_row(name: &str, weight: f64, nutrients: Nutrients) -> IngredientRow {
    IngredientRow::Unmatched {
        name: name.to_owned(),
        weight,
        nutrients,
    }
}

/// Renders entries back into dataset CSV.
pub fn dataset_csv(entries: &[Ingredient]) -> String {
    let mut out = String::from("id,name,weight,carbs,protein,kcal,lipids\n");
    for entry in entries {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            entry.id.get(),
            entry.name,
            entry.weight,
            entry.nutrients.carbs,
            entry.nutrients.protein,
            entry.nutrients.kcal,
            entry.nutrients.lipids,
        ));
    }
    out
}

pub fn write_dataset_csv(contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("ingredients.csv");
    std::fs::write(&path, contents)
        .with_context(|| format!("write dataset fixture {}", path.display()))?;
    Ok((dir, path))
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of plausible reference entries and selection rows.
#[derive(Debug, Clone)]
pub struct PantryFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl PantryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// Entry with quarter-gram amounts so sums stay exact in binary.
    pub fn ingredient(&mut self) -> Ingredient {
        let id = self.next_id;
        self.next_id += 1;
        let name = format!(
            "{} {}",
            self.pick(&FOOD_NAMES),
            self.pick(&FOOD_STYLES)
        );
        let weight = self.quarters(40, 400);
        let protein = self.quarters(0, 120);
        let carbs = self.quarters(0, 320);
        let lipids = self.quarters(0, 80);
        let kcal = protein * 4.0 + carbs * 4.0 + lipids * 9.0;
        ingredient(id, &name, weight, [protein, carbs, lipids, kcal])
    }

    pub fn dataset(&mut self, size: usize) -> ReferenceDataset {
        ReferenceDataset::new((0..size).map(|_| self.ingredient()).collect())
    }

    pub fn unmatched_row(&mut self) -> IngredientRow {
        let name = self.pick(&FOOD_NAMES).to_lowercase();
        let weight = self.quarters(0, 400);
        let nutrients = Nutrients {
            protein: self.quarters(0, 80),
            carbs: self.quarters(0, 80),
            lipids: self.quarters(0, 80),
            kcal: self.quarters(0, 2000),
        };
        unmatched_row(&name, weight, nutrients)
    }

    /// Fisher-Yates shuffle driven by the seeded generator.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for upper in (1..items.len()).rev() {
            let swap_with = self.int_n(upper + 1);
            items.swap(upper, swap_with);
        }
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }

    fn quarters(&mut self, min: usize, max: usize) -> f64 {
        let span = (max - min) * 4 + 1;
        (min * 4 + self.int_n(span)) as f64 / 4.0
    }
}
