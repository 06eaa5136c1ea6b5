// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod validation;

use anyhow::{Context, Result, anyhow, bail};
use nutritab_app::{Ingredient, IngredientId, Nutrients, ReferenceDataset};
use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

pub use validation::ValidationError;

pub const APP_NAME: &str = "nutritab";
pub const DATASET_PATH_ENV: &str = "NUTRITAB_DATASET_PATH";
pub const DATASET_FILE_NAME: &str = "ingredients.csv";

/// Required header columns; order in the file is free.
pub const DATASET_COLUMNS: [&str; 7] = ["id", "name", "weight", "carbs", "protein", "kcal", "lipids"];

const BUNDLED_CSV: &str = include_str!("../data/ingredients.csv");

static REFERENCE: OnceLock<ReferenceDataset> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Bundled,
    File(PathBuf),
}

impl DatasetSource {
    pub fn load(&self) -> Result<ReferenceDataset> {
        match self {
            Self::Bundled => parse_dataset_csv(BUNDLED_CSV.as_bytes())
                .context("parse bundled ingredient dataset"),
            Self::File(path) => load_dataset(path),
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => f.write_str("bundled"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// `NUTRITAB_DATASET_PATH`, then `<data dir>/nutritab/ingredients.csv` when it
/// exists, then the dataset compiled into the binary.
pub fn default_dataset_source() -> DatasetSource {
    if let Some(path) = env::var_os(DATASET_PATH_ENV) {
        return DatasetSource::File(PathBuf::from(path));
    }

    dirs::data_local_dir()
        .map(|root| root.join(APP_NAME).join(DATASET_FILE_NAME))
        .filter(|path| path.is_file())
        .map_or(DatasetSource::Bundled, DatasetSource::File)
}

pub fn bundled_dataset() -> Result<ReferenceDataset> {
    DatasetSource::Bundled.load()
}

pub fn load_dataset(path: &Path) -> Result<ReferenceDataset> {
    let file = File::open(path).with_context(|| {
        format!(
            "open ingredient dataset {} -- set [data].dataset_path or {DATASET_PATH_ENV} to a readable CSV file",
            path.display()
        )
    })?;
    let dataset = parse_dataset_csv(file)
        .with_context(|| format!("parse ingredient dataset {}", path.display()))?;
    debug!(path = %path.display(), entries = dataset.len(), "loaded ingredient dataset");
    Ok(dataset)
}

/// Parses `id,name,weight,carbs,protein,kcal,lipids` rows. Blank lines are
/// skipped; every other row must validate.
pub fn parse_dataset_csv<R: Read>(reader: R) -> Result<ReferenceDataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("read dataset header row")?.clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let mut indexes = [0usize; DATASET_COLUMNS.len()];
    for (slot, name) in indexes.iter_mut().zip(DATASET_COLUMNS) {
        *slot = col(name).ok_or_else(|| {
            anyhow!(
                "dataset is missing the {name:?} column; expected columns: {}",
                DATASET_COLUMNS.join(",")
            )
        })?;
    }
    let [idx_id, idx_name, idx_weight, idx_carbs, idx_protein, idx_kcal, idx_lipids] = indexes;

    let mut entries = Vec::new();
    let mut seen = BTreeSet::new();
    for (index, record) in rdr.records().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let record = record.with_context(|| format!("read dataset line {line}"))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let field = |column: usize| record.get(column).unwrap_or("");
        let at = |column: &str, error: ValidationError| {
            anyhow!("dataset line {line}: {column}: {error}")
        };

        let id = validation::parse_id(field(idx_id)).map_err(|e| at("id", e))?;
        if !seen.insert(id) {
            bail!("dataset line {line}: duplicate id {id}");
        }
        let name = validation::parse_name(field(idx_name)).map_err(|e| at("name", e))?;
        let weight = validation::parse_reference_weight(field(idx_weight))
            .map_err(|e| at("weight", e))?;
        let nutrients = Nutrients {
            protein: validation::parse_nutrient(field(idx_protein))
                .map_err(|e| at("protein", e))?,
            carbs: validation::parse_nutrient(field(idx_carbs)).map_err(|e| at("carbs", e))?,
            lipids: validation::parse_nutrient(field(idx_lipids))
                .map_err(|e| at("lipids", e))?,
            kcal: validation::parse_nutrient(field(idx_kcal)).map_err(|e| at("kcal", e))?,
        };

        entries.push(Ingredient {
            id: IngredientId::new(id),
            name,
            weight,
            nutrients,
        });
    }

    Ok(ReferenceDataset::new(entries))
}

/// Makes `dataset` the process-wide reference. Only the first call succeeds.
pub fn install(dataset: ReferenceDataset) -> Result<&'static ReferenceDataset> {
    let entries = dataset.len();
    REFERENCE
        .set(dataset)
        .map_err(|_| anyhow!("reference dataset is already installed"))?;
    info!(entries, "reference dataset installed");
    installed().ok_or_else(|| anyhow!("reference dataset missing after install"))
}

pub fn installed() -> Option<&'static ReferenceDataset> {
    REFERENCE.get()
}

pub fn validate_dataset_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        bail!("dataset path must not be empty");
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "dataset path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    Ok(())
}
