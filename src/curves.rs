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

use crate::fan::Breakpoint;

/// Target meaning "give the fan back to the EC".
pub const TARGET_AUTO: u8 = 0;
/// Target meaning "leave the fan as it is".
pub const TARGET_HOLD: u8 = 1;

const DEFAULT_TEMP_MIN: u8 = 0;
const DEFAULT_DUTY_MIN: u8 = 40;
const DEFAULT_TEMP_MAX: u8 = 120;
const DEFAULT_DUTY_MAX: u8 = 100;

/// What the control loop should do with a computed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanAction {
    Auto,
    Hold,
    Manual(u8),
}

impl FanAction {
    pub fn from_target(target: u8) -> Self {
        match target {
            TARGET_AUTO => FanAction::Auto,
            TARGET_HOLD => FanAction::Hold,
            duty => FanAction::Manual(duty),
        }
    }
}

/// Entries up to, not including, the first one at 0 °C.
fn active(breakpoints: &[Breakpoint]) -> &[Breakpoint] {
    let end = breakpoints.iter().position(|bp| bp.temp == 0).unwrap_or(breakpoints.len());
    &breakpoints[..end]
}

/// Interpolated duty in percent, or `None` below the first breakpoint.
///
/// An empty table has no lower threshold and follows the 0 °C / 40 % to
/// 120 °C / 100 % default. A zero-width span yields the lower point's duty.
pub fn duty_percent(temperature: u8, breakpoints: &[Breakpoint]) -> Option<f64> {
    let table = active(breakpoints);

    if let Some(first) = table.first() {
        if temperature < first.temp {
            return None;
        }
    }

    let (mut temp_min, mut duty_min) = (DEFAULT_TEMP_MIN, DEFAULT_DUTY_MIN);
    let (mut temp_max, mut duty_max) = (DEFAULT_TEMP_MAX, DEFAULT_DUTY_MAX);

    for bp in table {
        if temperature < bp.temp {
            temp_max = bp.temp;
            duty_max = bp.duty;
            break;
        }
        temp_min = bp.temp;
        duty_min = bp.duty;
    }

    if temp_max == temp_min {
        return Some(duty_min as f64);
    }

    let span = (temperature as f64 - temp_min as f64) / (temp_max as f64 - temp_min as f64);
    Some(span * (duty_max as f64 - duty_min as f64) + duty_min as f64)
}

/// Percent to the EC's 0..=255 scale, truncating.
pub fn to_native(percent: f64) -> u8 {
    (percent * 2.55) as u8
}

/// Raw target for one fan: [`TARGET_AUTO`], [`TARGET_HOLD`] or a native duty.
///
/// Below the first breakpoint the fan goes back to auto if the previous
/// command was a real duty, otherwise it is held where it is.
pub fn evaluate(temperature: u8, breakpoints: &[Breakpoint], previous_mode: u8) -> u8 {
    match duty_percent(temperature, breakpoints) {
        Some(percent) => to_native(percent),
        None if previous_mode > TARGET_HOLD => TARGET_AUTO,
        None => TARGET_HOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fan::{FanSpec, END_POINT};
    use crate::test_utils::fixtures::sample_breakpoints as table;

    #[test]
    fn test_below_first_breakpoint_depends_only_on_previous_mode() {
        let bps = table();
        for temp in 0..40u8 {
            assert_eq!(duty_percent(temp, &bps), None);
            assert_eq!(evaluate(temp, &bps, 0), TARGET_HOLD);
            assert_eq!(evaluate(temp, &bps, 1), TARGET_HOLD);
            assert_eq!(evaluate(temp, &bps, 2), TARGET_AUTO);
            assert_eq!(evaluate(temp, &bps, 180), TARGET_AUTO);
        }
    }

    #[test]
    fn test_boundary_exactness() {
        let bps = table();
        assert_eq!(duty_percent(40, &bps), Some(30.0));
        assert_eq!(duty_percent(60, &bps), Some(50.0));
        assert_eq!(duty_percent(80, &bps), Some(70.0));
    }

    #[test]
    fn test_interpolation_between_points() {
        let bps = table();
        assert_eq!(duty_percent(45, &bps), Some(35.0));
        assert_eq!(duty_percent(50, &bps), Some(40.0));
        assert_eq!(duty_percent(65, &bps), Some(55.0));
    }

    #[test]
    fn test_monotonic_between_points() {
        let bps = table();
        let mut last = 0.0;
        for temp in 40..=119u8 {
            let pct = duty_percent(temp, &bps).unwrap();
            assert!(pct >= last, "duty dropped at {}°C", temp);
            last = pct;
        }
    }

    #[test]
    fn test_above_last_point_heads_to_default_max() {
        let bps = table();
        // (80,70) -> (120,100)
        assert_eq!(duty_percent(100, &bps), Some(85.0));
        assert_eq!(duty_percent(120, &bps), Some(100.0));
        assert_eq!(duty_percent(200, &bps), Some(100.0));
    }

    #[test]
    fn test_native_scaling_truncates() {
        let bps = table();
        assert_eq!(evaluate(45, &bps, 0), 89);
        assert_eq!(evaluate(65, &bps, 0), 140);
        assert_eq!(evaluate(40, &bps, 0), 76);
        assert_eq!(evaluate(60, &bps, 0), 127);
        assert_eq!(to_native(0.0), 0);
        assert_eq!(to_native(-5.0), 0);
    }

    #[test]
    fn test_index_only_spec_uses_default_curve() {
        let spec = FanSpec::parse("1").unwrap();
        assert_eq!(duty_percent(0, spec.curve()), Some(40.0));
        assert_eq!(duty_percent(60, spec.curve()), Some(70.0));
    }

    #[test]
    fn test_trailing_slash_spec_holds_below_end_point() {
        let spec = FanSpec::parse("1/").unwrap();
        assert_eq!(duty_percent(60, spec.curve()), None);
        assert_eq!(evaluate(60, spec.curve(), 0), TARGET_HOLD);
        assert_eq!(evaluate(60, spec.curve(), 178), TARGET_AUTO);
        assert_eq!(duty_percent(120, spec.curve()), Some(100.0));
    }

    #[test]
    fn test_end_point_alone_is_a_threshold() {
        assert_eq!(duty_percent(60, &[END_POINT]), None);
        assert_eq!(duty_percent(60, &[]), Some(70.0));
    }

    #[test]
    fn test_zero_temperature_terminates_table() {
        let bps = vec![Breakpoint::new(50, 60), Breakpoint::new(0, 0), Breakpoint::new(90, 10)];
        // (50,60) -> default (120,100)
        assert_eq!(duty_percent(85, &bps), Some(80.0));
        assert_eq!(duty_percent(49, &bps), None);
    }

    #[test]
    fn test_empty_table_uses_defaults() {
        assert_eq!(duty_percent(0, &[]), Some(40.0));
        assert_eq!(duty_percent(30, &[]), Some(55.0));
    }

    #[test]
    fn test_duplicate_temperatures_use_last_entry() {
        let bps = vec![Breakpoint::new(50, 30), Breakpoint::new(50, 60), Breakpoint::new(120, 100)];
        // both 50s are at or below 50, so the span is (50,60) -> (120,100)
        assert_eq!(duty_percent(50, &bps), Some(60.0));

        let explicit = vec![Breakpoint::new(120, 100), END_POINT];
        assert_eq!(duty_percent(120, &explicit), Some(100.0));
    }

    #[test]
    fn test_action_from_target() {
        assert_eq!(FanAction::from_target(0), FanAction::Auto);
        assert_eq!(FanAction::from_target(1), FanAction::Hold);
        assert_eq!(FanAction::from_target(2), FanAction::Manual(2));
        assert_eq!(FanAction::from_target(255), FanAction::Manual(255));
    }
}
