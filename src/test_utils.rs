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

//! Test utilities and fixtures shared by the unit tests

pub mod fixtures {
    use std::time::Duration;

    use crate::config::ControlConfig;
    use crate::ec::{EmbeddedController, FanTelemetry};
    use crate::fan::{Breakpoint, FanSpec};
    use crate::handshake::PollPolicy;
    use crate::port::ScriptedPorts;
    use crate::service::Controller;

    /// Curve used throughout the tests: (40,30) (60,50) (80,70).
    pub const SAMPLE_SPEC: &str = "1/40,30/60,50/80,70";

    pub fn sample_breakpoints() -> Vec<Breakpoint> {
        FanSpec::parse(SAMPLE_SPEC).unwrap().breakpoints().to_vec()
    }

    pub fn parse_specs(specs: &[&str]) -> Vec<FanSpec> {
        specs.iter().map(|s| FanSpec::parse(s).unwrap()).collect()
    }

    /// Ports answering one telemetry read per entry, in order.
    pub fn telemetry_ports(readings: &[FanTelemetry]) -> ScriptedPorts {
        ScriptedPorts::with_responses(
            readings.iter().flat_map(|t| [t.temperature, t.local_temperature, t.duty]),
        )
    }

    pub fn reading(temperature: u8, duty: u8) -> FanTelemetry {
        FanTelemetry { temperature, local_temperature: temperature.saturating_sub(10), duty }
    }

    /// No sleeping in the handshake.
    pub fn fast_ec(ports: ScriptedPorts) -> EmbeddedController<ScriptedPorts> {
        EmbeddedController::with_policy(ports, PollPolicy::immediate(PollPolicy::DEFAULT_ATTEMPTS))
    }

    pub fn control(modify: bool, debug: bool) -> ControlConfig {
        ControlConfig { modify, debug, interval: Duration::ZERO }
    }

    pub fn test_controller(
        specs: &[&str],
        ports: ScriptedPorts,
        config: ControlConfig,
    ) -> Controller<ScriptedPorts, Vec<u8>> {
        Controller::new(fast_ec(ports), parse_specs(specs), config, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::port::PortIo;
    use crate::port::EC_DATA;

    #[test]
    fn test_telemetry_ports_flattens_readings() {
        let mut ports = telemetry_ports(&[reading(50, 90), reading(60, 100)]);
        let got: Vec<u8> = (0..6).map(|_| ports.read_byte(EC_DATA)).collect();
        assert_eq!(got, vec![50, 40, 90, 60, 50, 100]);
    }

    #[test]
    fn test_sample_breakpoints() {
        assert_eq!(sample_breakpoints().len(), 4);
    }

    #[test]
    fn test_controller_fixture() {
        let c = test_controller(&[SAMPLE_SPEC, "2"], telemetry_ports(&[]), control(true, false));
        assert_eq!(c.fans().len(), 2);
        assert!(c.config().modify);
    }
}
