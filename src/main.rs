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

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use serde_json::json;

use clevofan::config::{load_config, resolve, try_load_system_config, CliOverrides};
use clevofan::ec::{EmbeddedController, ALL_FANS};
use clevofan::error::ClevofanError;
use clevofan::logger;
use clevofan::port::SystemPorts;
use clevofan::service::Controller;

#[derive(Parser, Debug)]
#[command(name = "clevofan")]
#[command(version)]
#[command(about = "Drive Clevo laptop fans from temperature/duty curves")]
#[command(long_about = "Drive Clevo laptop fans from temperature/duty curves

SPEC is index[/temp0,duty0[/temp1,duty1[...]]] with index 1-4 (5 = all fans),
temperatures in °C and duties in percent. Below the first point the fan is
left to the EC; above the last one the curve heads to 100% at 120°C.

EXAMPLES:
    clevofan -s 1                          Default curve on fan 1
    clevofan -s 1/45,30/60,50/80,90 -d     Custom curve with live output
    clevofan -s 1 -s 2/50,40 -t 500000     Two fans, poll every 0.5s
    clevofan -a                            Hand every fan back to the EC

FILES:
    /etc/clevofan/config.json       Optional defaults (specs, interval_us, ...)
    /var/log/clevofan/events.json   JSON event log when --logging is set")]
struct Cli {
    /// Fan curve specification (repeatable, at most 4)
    #[arg(short = 's', long = "spec", value_name = "SPEC")]
    specs: Vec<String>,

    /// Put every fan back into automatic mode and exit
    #[arg(short = 'a', long = "auto")]
    auto: bool,

    /// Only read and report, never change fan duty
    #[arg(short = 'm', long = "no-modify")]
    no_modify: bool,

    /// Print live per-fan diagnostics on stderr
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Poll interval in microseconds
    #[arg(short = 't', long = "interval", value_name = "MICROS")]
    interval: Option<u64>,

    /// Configuration file (default: /etc/clevofan/config.json if present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append JSON events to /var/log/clevofan/events.json
    #[arg(long)]
    logging: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("ERROR: {:#}", err);
        logger::log_event("fatal_error", json!({ "error": format!("{:#}", err) }));
        std::process::exit(1);
    }
}

fn acquire_ports() -> anyhow::Result<SystemPorts> {
    if unsafe { libc::geteuid() } != 0 {
        eprintln!("clevofan needs root to access the EC ports.");
        eprintln!("Please run with: sudo {}", std::env::args().next().unwrap_or_else(|| "clevofan".to_string()));
    }
    SystemPorts::acquire().context("initialize failed")
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let base = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display()))?,
        None => try_load_system_config()
            .context("loading /etc/clevofan/config.json")?
            .unwrap_or_default(),
    };

    if cli.logging || base.logging {
        logger::init_logging();
    }

    let overrides = CliOverrides {
        specs: cli.specs,
        no_modify: cli.no_modify,
        debug: cli.debug,
        interval_us: cli.interval,
        logging: cli.logging,
    };

    if cli.auto {
        let mut ec = EmbeddedController::new(acquire_ports()?);
        ec.set_auto_mode(ALL_FANS);
        logger::log_event("auto_all", json!({}));
        return Ok(());
    }

    let (merged, control, specs) = match resolve(base, overrides) {
        Ok(resolved) => resolved,
        Err(ClevofanError::NoSpecs) => {
            let _ = Cli::command().print_help();
            bail!("no fan specification given");
        }
        Err(e) => return Err(e.into()),
    };

    logger::log_event(
        "startup",
        json!({
            "specs": merged.specs,
            "modify": control.modify,
            "debug": control.debug,
            "interval_us": merged.interval_us,
        }),
    );

    let ec = EmbeddedController::new(acquire_ports()?);
    let mut controller = Controller::new(ec, specs, control, io::stderr());

    if control.debug {
        controller.report_fan_count()?;
    }

    controller.run()?;
    Ok(())
}
