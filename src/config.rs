/*
 * This file is part of Clevofan.
 *
 * Copyright (C) 2025 Clevofan contributors
 *
 * Clevofan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Clevofan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Clevofan. If not, see <https://www.gnu.org/licenses/>.
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClevofanError, Result};
use crate::fan::FanSpec;

pub const DEFAULT_INTERVAL_US: u64 = 1_000_000;
pub const MAX_INTERVAL_US: u64 = 60_000_000;
pub const MAX_SPECS: usize = 4;

/// Settings fixed at startup and read by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlConfig {
    /// Write computed duties; when false the loop only reads and reports.
    pub modify: bool,
    /// Print per-fan diagnostic lines on stderr.
    pub debug: bool,
    pub interval: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            modify: true,
            debug: false,
            interval: Duration::from_micros(DEFAULT_INTERVAL_US),
        }
    }
}

fn default_true() -> bool { true }
fn default_interval_us() -> u64 { DEFAULT_INTERVAL_US }

/// On-disk configuration, `/etc/clevofan/config.json` by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedConfig {
    /// Fan specifications in `index[/temp,duty[...]]` form.
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default = "default_true")]
    pub modify: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_interval_us")]
    pub interval_us: u64,
    /// Write the JSON event log.
    #[serde(default)]
    pub logging: bool,
}

impl Default for SavedConfig {
    fn default() -> Self {
        Self {
            specs: Vec::new(),
            modify: true,
            debug: false,
            interval_us: DEFAULT_INTERVAL_US,
            logging: false,
        }
    }
}

/// Command-line values layered over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub specs: Vec<String>,
    pub no_modify: bool,
    pub debug: bool,
    pub interval_us: Option<u64>,
    pub logging: bool,
}

impl SavedConfig {
    /// Specs are appended; flags can only switch things on (or modification off).
    pub fn merge(mut self, cli: CliOverrides) -> Self {
        self.specs.extend(cli.specs);
        if cli.no_modify {
            self.modify = false;
        }
        self.debug |= cli.debug;
        self.logging |= cli.logging;
        if let Some(us) = cli.interval_us {
            self.interval_us = us;
        }
        self
    }

    pub fn control(&self) -> ControlConfig {
        ControlConfig {
            modify: self.modify,
            debug: self.debug,
            interval: Duration::from_micros(self.interval_us),
        }
    }

    pub fn fan_specs(&self) -> Result<Vec<FanSpec>> {
        self.specs.iter().map(|s| FanSpec::parse(s)).collect()
    }
}

pub fn system_config_path() -> PathBuf { PathBuf::from("/etc/clevofan/config.json") }

pub fn validate_saved_config(cfg: &SavedConfig) -> Result<()> {
    if cfg.specs.len() > MAX_SPECS {
        return Err(ClevofanError::TooManySpecs { max: MAX_SPECS });
    }
    if cfg.interval_us == 0 || cfg.interval_us > MAX_INTERVAL_US {
        return Err(ClevofanError::Config(format!(
            "interval_us must be within 1..={}",
            MAX_INTERVAL_US
        )));
    }
    for s in &cfg.specs {
        FanSpec::parse(s)?;
    }
    Ok(())
}

pub fn load_config(path: &Path) -> Result<SavedConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: SavedConfig = serde_json::from_str(&data)?;
    validate_saved_config(&cfg)?;
    Ok(cfg)
}

/// The system file if it exists, `None` if it does not.
pub fn try_load_system_config() -> Result<Option<SavedConfig>> {
    match load_config(&system_config_path()) {
        Ok(cfg) => Ok(Some(cfg)),
        Err(ClevofanError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Merge, validate and split into loop settings plus fan specs.
pub fn resolve(base: SavedConfig, cli: CliOverrides) -> Result<(SavedConfig, ControlConfig, Vec<FanSpec>)> {
    let merged = base.merge(cli);
    validate_saved_config(&merged)?;
    let specs = merged.fan_specs()?;
    if specs.is_empty() {
        return Err(ClevofanError::NoSpecs);
    }
    let control = merged.control();
    Ok((merged, control, specs))
}
