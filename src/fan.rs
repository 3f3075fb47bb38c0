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

//! Per-fan curve specification and runtime state.
//!
//! A specification is written as `index[/temp0,duty0[/temp1,duty1[...]]]`.
//! Parsing stops at the first segment that is empty or has no comma, keeping
//! the points read so far, and a `(120, 100)` end point is always appended.
//! A bare `index` has no curve of its own and follows the default line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ec::{FanTelemetry, ALL_FANS};
use crate::error::{ClevofanError, Result};

/// Upper bound on table entries, end point included.
pub const MAX_BREAKPOINTS: usize = 62;

/// End point appended after the parsed breakpoints.
pub const END_POINT: Breakpoint = Breakpoint { temp: 120, duty: 100 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// °C
    pub temp: u8,
    /// Percent, 0..=100
    pub duty: u8,
}

impl Breakpoint {
    pub const fn new(temp: u8, duty: u8) -> Self {
        Self { temp, duty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanSpec {
    index: u8,
    breakpoints: Vec<Breakpoint>,
    /// No `/` after the index.
    index_only: bool,
}

impl FanSpec {
    pub fn parse(text: &str) -> Result<Self> {
        let index = atoi(text);
        if !(0..=ALL_FANS as i64).contains(&index) {
            return Err(ClevofanError::InvalidFanId(index));
        }

        let tail = text.split_once('/').map(|(_, tail)| tail);
        let mut breakpoints = Vec::new();
        if let Some(tail) = tail {
            for segment in tail.split('/') {
                if breakpoints.len() == MAX_BREAKPOINTS - 1 {
                    break;
                }
                let Some((temp, duty)) = segment.split_once(',') else {
                    // empty or comma-less segment ends the table
                    break;
                };
                breakpoints.push(Breakpoint {
                    temp: atoi(temp).clamp(0, u8::MAX as i64) as u8,
                    duty: atoi(duty).clamp(0, 100) as u8,
                });
            }
        }
        breakpoints.push(END_POINT);

        Ok(Self { index: index as u8, breakpoints, index_only: tail.is_none() })
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Full table, end point included.
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Table handed to the curve evaluator. Empty for a bare index, so the
    /// fan follows the default line at every temperature; `"1/"` keeps its
    /// end point and with it the below-first-point threshold.
    pub fn curve(&self) -> &[Breakpoint] {
        if self.index_only {
            &[]
        } else {
            &self.breakpoints
        }
    }
}

impl FromStr for FanSpec {
    type Err = ClevofanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FanSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)?;
        let user = match self.breakpoints.split_last() {
            Some((last, rest)) if *last == END_POINT => rest,
            _ => &self.breakpoints[..],
        };
        for bp in user {
            write!(f, "/{},{}", bp.temp, bp.duty)?;
        }
        Ok(())
    }
}

/// Leading decimal integer of `s`, or 0 when there is none.
fn atoi(s: &str) -> i64 {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
    }
    if neg { -value } else { value }
}

/// A configured fan plus what the loop last saw and did.
#[derive(Debug, Clone)]
pub struct FanState {
    pub spec: FanSpec,
    pub last_temperature: u8,
    pub last_local_temperature: u8,
    pub last_duty: u8,
    /// Last target written while modification was enabled (0 auto, 1 hold, else duty).
    pub last_commanded_mode: u8,
}

impl FanState {
    pub fn new(spec: FanSpec) -> Self {
        Self {
            spec,
            last_temperature: 0,
            last_local_temperature: 0,
            last_duty: 0,
            last_commanded_mode: 0,
        }
    }

    pub fn index(&self) -> u8 {
        self.spec.index()
    }

    pub fn record(&mut self, telemetry: FanTelemetry) {
        self.last_temperature = telemetry.temperature;
        self.last_local_temperature = telemetry.local_temperature;
        self.last_duty = telemetry.duty;
    }
}
