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

//! Register channel to the embedded controller.
//!
//! The EC is reached through two legacy x86 I/O ports: a status/command port
//! and a data port. [`SystemPorts`] talks to the real hardware after the kernel
//! granted access with `ioperm(2)`. [`ScriptedPorts`] is an in-memory stand-in
//! that records writes and replays scripted reads.

use std::collections::VecDeque;

use crate::error::Result;

/// Status (read) / command (write) port.
pub const EC_SC: u16 = 0x66;
/// Data port.
pub const EC_DATA: u16 = 0x62;

/// Status bit: output buffer full, a response byte is waiting on [`EC_DATA`].
pub const EC_SC_OBF: u8 = 0x01;
/// Status bit: input buffer full, the EC has not consumed the last byte yet.
pub const EC_SC_IBF: u8 = 0x02;

/// Single-byte access to an I/O port.
///
/// Implementations have no failure mode: once access has been granted a port
/// read or write always completes immediately.
#[cfg_attr(test, mockall::automock)]
pub trait PortIo {
    fn read_byte(&mut self, port: u16) -> u8;
    fn write_byte(&mut self, port: u16, value: u8);
}

impl<P: PortIo + ?Sized> PortIo for &mut P {
    fn read_byte(&mut self, port: u16) -> u8 {
        (**self).read_byte(port)
    }

    fn write_byte(&mut self, port: u16, value: u8) {
        (**self).write_byte(port, value)
    }
}

/// Privileged access to the EC ports of the running machine.
///
/// Permission is requested once in [`SystemPorts::acquire`] and given back
/// when the value is dropped.
#[derive(Debug)]
pub struct SystemPorts {
    granted: Vec<u16>,
}

impl SystemPorts {
    /// Request exclusive access to [`EC_SC`] and [`EC_DATA`].
    pub fn acquire() -> Result<Self> {
        Self::acquire_ports(&[EC_SC, EC_DATA])
    }

    fn acquire_ports(ports: &[u16]) -> Result<Self> {
        let mut this = SystemPorts { granted: Vec::with_capacity(ports.len()) };
        for &port in ports {
            raw::grant(port, true)?;
            this.granted.push(port);
        }
        Ok(this)
    }
}

impl Drop for SystemPorts {
    fn drop(&mut self) {
        for &port in &self.granted {
            let _ = raw::grant(port, false);
        }
    }
}

impl PortIo for SystemPorts {
    fn read_byte(&mut self, port: u16) -> u8 {
        // SAFETY: `self` only exists after ioperm granted these ports.
        unsafe { raw::inb(port) }
    }

    fn write_byte(&mut self, port: u16, value: u8) {
        // SAFETY: see `read_byte`.
        unsafe { raw::outb(port, value) }
    }
}

#[cfg(all(target_os = "linux", any(target_arch = "x86", target_arch = "x86_64")))]
mod raw {
    use std::io;

    use crate::error::{ClevofanError, Result};

    extern "C" {
        fn ioperm(from: libc::c_ulong, num: libc::c_ulong, turn_on: libc::c_int) -> libc::c_int;
    }

    pub(super) fn grant(port: u16, on: bool) -> Result<()> {
        let rc = unsafe { ioperm(port as libc::c_ulong, 1, on as libc::c_int) };
        if rc != 0 {
            return Err(ClevofanError::PermissionDenied { port, source: io::Error::last_os_error() });
        }
        Ok(())
    }

    pub(super) unsafe fn inb(port: u16) -> u8 {
        let value: u8;
        core::arch::asm!("in al, dx", in("dx") port, out("al") value, options(nomem, nostack, preserves_flags));
        value
    }

    pub(super) unsafe fn outb(port: u16, value: u8) {
        core::arch::asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack, preserves_flags));
    }
}

#[cfg(not(all(target_os = "linux", any(target_arch = "x86", target_arch = "x86_64"))))]
mod raw {
    use crate::error::{ClevofanError, Result};

    pub(super) fn grant(_port: u16, _on: bool) -> Result<()> {
        Err(ClevofanError::Unsupported)
    }

    // Unreachable in practice: a SystemPorts cannot be built on these targets.
    pub(super) unsafe fn inb(_port: u16) -> u8 {
        0xff
    }

    pub(super) unsafe fn outb(_port: u16, _value: u8) {}
}

/// In-memory EC used to exercise the protocol without hardware.
///
/// Status reads first drain `status_script`, then return the steady `status`
/// byte (IBF clear, OBF set by default). Data reads pop scripted responses
/// and yield 0 once the script is exhausted. Every write is recorded.
#[derive(Debug, Clone)]
pub struct ScriptedPorts {
    status: u8,
    status_script: VecDeque<u8>,
    responses: VecDeque<u8>,
    writes: Vec<(u16, u8)>,
    status_reads: usize,
}

impl Default for ScriptedPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedPorts {
    pub fn new() -> Self {
        Self {
            status: EC_SC_OBF,
            status_script: VecDeque::new(),
            responses: VecDeque::new(),
            writes: Vec::new(),
            status_reads: 0,
        }
    }

    pub fn with_responses<I: IntoIterator<Item = u8>>(responses: I) -> Self {
        let mut ports = Self::new();
        ports.push_responses(responses);
        ports
    }

    /// Steady status byte returned once the status script is drained.
    pub fn set_status(&mut self, status: u8) {
        self.status = status;
    }

    /// Status bytes returned, in order, before falling back to the steady one.
    pub fn script_status<I: IntoIterator<Item = u8>>(&mut self, statuses: I) {
        self.status_script.extend(statuses);
    }

    pub fn push_responses<I: IntoIterator<Item = u8>>(&mut self, responses: I) {
        self.responses.extend(responses);
    }

    pub fn writes(&self) -> &[(u16, u8)] {
        &self.writes
    }

    /// Bytes written to the data port, in order.
    pub fn data_writes(&self) -> Vec<u8> {
        self.writes.iter().filter(|(p, _)| *p == EC_DATA).map(|(_, v)| *v).collect()
    }

    /// Bytes written to the command port, in order.
    pub fn command_writes(&self) -> Vec<u8> {
        self.writes.iter().filter(|(p, _)| *p == EC_SC).map(|(_, v)| *v).collect()
    }

    pub fn status_reads(&self) -> usize {
        self.status_reads
    }

    pub fn pending_responses(&self) -> usize {
        self.responses.len()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl PortIo for ScriptedPorts {
    fn read_byte(&mut self, port: u16) -> u8 {
        if port == EC_SC {
            self.status_reads += 1;
            return self.status_script.pop_front().unwrap_or(self.status);
        }
        self.responses.pop_front().unwrap_or(0)
    }

    fn write_byte(&mut self, port: u16, value: u8) {
        self.writes.push((port, value));
    }
}
