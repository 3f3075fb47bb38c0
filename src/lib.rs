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

//! Clevofan - fan control for Clevo laptops through the embedded controller
//!
//! The EC is driven over its two legacy I/O ports. Each configured fan is
//! polled for its temperature, run through a piecewise-linear duty curve, and
//! either handed back to the EC, held, or set to a manual duty.

pub mod error;
pub mod port;
pub mod handshake;
pub mod ec;
pub mod fan;
pub mod curves;
pub mod config;
pub mod service;
pub mod logger;

#[cfg(test)]
pub mod test_utils;
