// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod cell;
pub mod dataset;
pub mod ids;
pub mod model;
pub mod scale;
pub mod search;
pub mod state;

pub use cell::*;
pub use dataset::*;
pub use ids::*;
pub use model::*;
pub use scale::*;
pub use search::*;
pub use state::*;
