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

use std::io::{self, Write};
use std::thread;

use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use serde_json::json;

use crate::config::ControlConfig;
use crate::curves::{evaluate, FanAction};
use crate::ec::EmbeddedController;
use crate::fan::{FanSpec, FanState};
use crate::logger;
use crate::port::PortIo;

/// Polls every configured fan, applies its curve and sleeps, forever.
///
/// Diagnostic lines go to `diag` (stderr in the binary) and are erased with
/// cursor-up escapes after each pass so the output stays in place.
pub struct Controller<P, W> {
    ec: EmbeddedController<P>,
    fans: Vec<FanState>,
    config: ControlConfig,
    diag: W,
}

impl<P: PortIo, W: Write> Controller<P, W> {
    pub fn new(ec: EmbeddedController<P>, specs: Vec<FanSpec>, config: ControlConfig, diag: W) -> Self {
        Self {
            ec,
            fans: specs.into_iter().map(FanState::new).collect(),
            config,
            diag,
        }
    }

    pub fn fans(&self) -> &[FanState] {
        &self.fans
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn ec(&self) -> &EmbeddedController<P> {
        &self.ec
    }

    pub fn ec_mut(&mut self) -> &mut EmbeddedController<P> {
        &mut self.ec
    }

    pub fn diagnostics(&self) -> &W {
        &self.diag
    }

    /// Query the EC's fan count and, in debug mode, print it.
    pub fn report_fan_count(&mut self) -> io::Result<u8> {
        let count = self.ec.read_fan_count();
        logger::log_event("fan_count", json!({ "count": count }));
        if self.config.debug {
            writeln!(self.diag, "DEBUG: fan count: {}", count)?;
            self.diag.flush()?;
        }
        Ok(count)
    }

    /// One pass over all fans, without the trailing sleep.
    pub fn tick(&mut self) -> io::Result<()> {
        for fan in &mut self.fans {
            let index = fan.index();

            if let Some(telemetry) = self.ec.read_fan_telemetry(index) {
                fan.record(telemetry);
            }

            let target = evaluate(fan.last_temperature, fan.spec.curve(), fan.last_commanded_mode);

            if self.config.debug {
                queue!(self.diag, Clear(ClearType::CurrentLine))?;
                writeln!(
                    self.diag,
                    "DEBUG: fan{}: temp[{}] duty[{} -> {}]",
                    index, fan.last_temperature, fan.last_duty, target
                )?;
            }

            if !self.config.modify || target == fan.last_duty {
                continue;
            }

            match FanAction::from_target(target) {
                FanAction::Auto => self.ec.set_auto_mode(index),
                FanAction::Hold => {}
                FanAction::Manual(duty) => self.ec.set_manual_duty(index, duty),
            }
            fan.last_commanded_mode = target;
        }

        if self.config.debug && !self.fans.is_empty() {
            queue!(self.diag, MoveUp(self.fans.len() as u16))?;
            self.diag.flush()?;
        }
        Ok(())
    }

    /// Runs until the process is killed; only a diagnostics write error returns.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.tick()?;
            thread::sleep(self.config.interval);
        }
    }
}
