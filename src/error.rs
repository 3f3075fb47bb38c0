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

//! Error type shared by the library modules.
//!
//! Only startup failures are errors. Per-command range violations and
//! handshake timeouts are absorbed by the EC layer and never reach here.

use std::io;

/// Result type alias using ClevofanError
pub type Result<T> = std::result::Result<T, ClevofanError>;

#[derive(thiserror::Error, Debug)]
pub enum ClevofanError {
    #[error("permission denied for I/O port {port:#04x}: {source}")]
    PermissionDenied {
        port: u16,
        source: io::Error,
    },

    #[error("raw port I/O is not supported on this platform")]
    Unsupported,

    #[error("invalid fan id: {0}")]
    InvalidFanId(i64),

    #[error("only supports at most {max} specs")]
    TooManySpecs { max: usize },

    #[error("no fan specification given")]
    NoSpecs,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_fan_id_message() {
        let err = ClevofanError::InvalidFanId(9);
        assert_eq!(err.to_string(), "invalid fan id: 9");
    }

    #[test]
    fn test_permission_denied_formats_port() {
        let err = ClevofanError::PermissionDenied {
            port: 0x66,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("permission denied for I/O port 0x66"));
    }

    #[test]
    fn test_io_conversion() {
        let err: ClevofanError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ClevofanError::Io(_)));
    }

    #[test]
    fn test_too_many_specs_message() {
        let err = ClevofanError::TooManySpecs { max: 4 };
        assert_eq!(err.to_string(), "only supports at most 4 specs");
    }
}
