// Application context - built once at startup, passed explicitly to every handler

use crate::aggregate::{BarMode, ControlState};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::LoadResult;
use serde::Serialize;
use std::sync::Arc;

pub struct AppContext {
    pub dataset: Arc<Dataset>,
    pub config: Config,
}

/// Everything a front end needs to populate its controls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOptions {
    pub years: Vec<i32>,
    pub countries: Vec<String>,
    pub bar_modes: Vec<BarModeOption>,
    pub defaults: ControlState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarModeOption {
    pub value: BarMode,
    pub label: &'static str,
}

impl AppContext {
    pub fn new(dataset: Dataset, config: Config) -> Self {
        AppContext {
            dataset: Arc::new(dataset),
            config,
        }
    }

    /// Load the dataset named by the config. Any failure here is fatal.
    pub fn load(config: Config) -> LoadResult<Self> {
        let dataset = Dataset::load(&config.data_path, config.encoding)?;
        Ok(Self::new(dataset, config))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Initial control values: configured defaults when present in the data,
    /// otherwise the first available option
    pub fn default_state(&self) -> ControlState {
        let years = self.dataset.years();
        let countries = self.dataset.countries();

        let year = if years.is_empty() || years.contains(&self.config.default_year) {
            self.config.default_year
        } else {
            years[0]
        };

        let country = if countries.is_empty() || countries.contains(&self.config.default_country) {
            self.config.default_country.clone()
        } else {
            countries[0].clone()
        };

        ControlState {
            year,
            country,
            bar_mode: self.config.default_bar_mode,
        }
    }

    pub fn options(&self) -> DashboardOptions {
        DashboardOptions {
            years: self.dataset.years(),
            countries: self.dataset.countries(),
            bar_modes: BarMode::ALL
                .iter()
                .map(|&mode| BarModeOption {
                    value: mode,
                    label: mode.label(),
                })
                .collect(),
            defaults: self.default_state(),
        }
    }
}
