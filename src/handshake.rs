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

//! IBF/OBF handshake with the embedded controller.
//!
//! Every byte sent to the EC waits for the input buffer to drain first, and
//! every byte read waits for the output buffer to fill. Both waits poll the
//! status port with a bounded budget and give up silently: the transaction
//! carries on whether or not the EC answered in time.

use std::thread;
use std::time::Duration;

use serde_json::json;

use crate::logger;
use crate::port::{PortIo, EC_DATA, EC_SC, EC_SC_IBF, EC_SC_OBF};

/// Bounded retry budget for one status wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Status reads before giving up.
    pub max_attempts: u32,
    /// Sleep after each status read that did not show the wanted state.
    pub delay: Duration,
}

impl PollPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 101;
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1);

    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Same budget semantics without sleeping between polls.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts, delay: Duration::ZERO }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

#[derive(Debug)]
pub struct Handshake<P> {
    ports: P,
    policy: PollPolicy,
}

impl<P: PortIo> Handshake<P> {
    pub fn new(ports: P, policy: PollPolicy) -> Self {
        Self { ports, policy }
    }

    /// Wait until the EC has consumed the previous input byte.
    /// Returns `false` if the budget ran out; callers proceed regardless.
    pub fn wait_input_clear(&mut self) -> bool {
        self.poll("ibf", |status| status & EC_SC_IBF == 0)
    }

    /// Wait until the EC has a response byte ready.
    /// Returns `false` if the budget ran out; callers proceed regardless.
    pub fn wait_output_ready(&mut self) -> bool {
        self.poll("obf", |status| status & EC_SC_OBF != 0)
    }

    fn poll(&mut self, wait: &str, ready: impl Fn(u8) -> bool) -> bool {
        for _ in 0..self.policy.max_attempts {
            if ready(self.ports.read_byte(EC_SC)) {
                return true;
            }
            if !self.policy.delay.is_zero() {
                thread::sleep(self.policy.delay);
            }
        }
        logger::log_event("handshake_timeout", json!({ "wait": wait }));
        false
    }

    pub fn write_command(&mut self, command: u8) {
        self.wait_input_clear();
        self.ports.write_byte(EC_SC, command);
    }

    pub fn write_data(&mut self, value: u8) {
        self.wait_input_clear();
        self.ports.write_byte(EC_DATA, value);
    }

    pub fn read_data(&mut self) -> u8 {
        self.wait_output_ready();
        self.ports.read_byte(EC_DATA)
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }
}
