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

//! Fan commands understood by the Clevo embedded controller.
//!
//! Commands with an out-of-range fan index are dropped without sending a
//! single byte. That is not an error.

use serde::Serialize;
use serde_json::json;

use crate::handshake::{Handshake, PollPolicy};
use crate::logger;
use crate::port::PortIo;

const CMD_FAN_WRITE: u8 = 0x99;
const CMD_FAN_READ: u8 = 0x9e;
const CMD_DIAG: u8 = 0x80;
const DIAG_FAN_COUNT: u8 = 0xc8;
const AUTO_MARKER: u8 = 0xff;

/// Highest fan index addressable on its own.
pub const MAX_FAN: u8 = 4;
/// Pseudo index addressing every fan, only valid for [`EmbeddedController::set_auto_mode`].
pub const ALL_FANS: u8 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanTelemetry {
    /// Sensor temperature driving this fan, in °C.
    pub temperature: u8,
    /// Secondary local temperature, in °C.
    pub local_temperature: u8,
    /// Current duty on the EC's native 0..=255 scale.
    pub duty: u8,
}

#[derive(Debug)]
pub struct EmbeddedController<P> {
    hs: Handshake<P>,
}

impl<P: PortIo> EmbeddedController<P> {
    pub fn new(ports: P) -> Self {
        Self::with_policy(ports, PollPolicy::default())
    }

    pub fn with_policy(ports: P, policy: PollPolicy) -> Self {
        Self { hs: Handshake::new(ports, policy) }
    }

    /// Hold `fan` (1..=4) at `duty` on the native 0..=255 scale.
    pub fn set_manual_duty(&mut self, fan: u8, duty: u8) {
        if !(1..=MAX_FAN).contains(&fan) {
            return;
        }

        self.hs.write_command(CMD_FAN_WRITE);
        self.hs.write_data(fan);
        self.hs.write_data(duty);

        logger::log_event("fan_manual", json!({ "index": fan, "duty": duty }));
    }

    /// Hand `fan` (1..=4) back to the EC's own control, or every fan for [`ALL_FANS`].
    pub fn set_auto_mode(&mut self, fan: u8) {
        if !(1..=ALL_FANS).contains(&fan) {
            return;
        }

        self.hs.write_command(CMD_FAN_WRITE);
        self.hs.write_data(AUTO_MARKER);

        if fan == ALL_FANS {
            self.hs.write_data(AUTO_MARKER);
            self.hs.write_data(AUTO_MARKER);
        } else {
            self.hs.write_data(fan);
        }

        logger::log_event("fan_auto", json!({ "index": fan }));
    }

    /// Returns `None` without touching the ports when `fan` is outside 1..=4.
    pub fn read_fan_telemetry(&mut self, fan: u8) -> Option<FanTelemetry> {
        if !(1..=MAX_FAN).contains(&fan) {
            return None;
        }

        self.hs.write_command(CMD_FAN_READ);
        self.hs.write_data(fan);

        let temperature = self.hs.read_data();
        let local_temperature = self.hs.read_data();
        let duty = self.hs.read_data();

        Some(FanTelemetry { temperature, local_temperature, duty })
    }

    pub fn read_fan_count(&mut self) -> u8 {
        self.hs.write_command(CMD_DIAG);
        self.hs.write_data(DIAG_FAN_COUNT);
        self.hs.read_data()
    }

    pub fn ports(&self) -> &P {
        self.hs.ports()
    }

    pub fn ports_mut(&mut self) -> &mut P {
        self.hs.ports_mut()
    }
}
