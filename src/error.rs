//! Error taxonomy for config resolution and server startup.
//!
//! Config errors fail fast before any resource is touched; startup errors
//! are returned to `main` and logged rather than crashing the process.

use std::fmt;
use std::io;

/// A command-line argument the server cannot accept.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required flag was not supplied.
    MissingRequiredArgument(String),
    /// A flag the argument table does not know about.
    UnrecognizedArgument(String),
    /// A flag that takes a value was supplied without one.
    MissingArgumentValue(String),
    /// Anything else the parser rejected, with its message.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequiredArgument(flag) => {
                write!(f, "missing required argument: {flag}")
            }
            ConfigError::UnrecognizedArgument(flag) => {
                write!(f, "unrecognized argument: {flag}")
            }
            ConfigError::MissingArgumentValue(flag) => {
                write!(f, "argument {flag} requires a value but none was supplied")
            }
            ConfigError::Invalid(msg) => write!(f, "invalid arguments: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure while bringing the HTTP container up.
#[derive(Debug)]
pub enum StartError {
    /// The server is already running; the start call was a no-op.
    AlreadyStarted,
    /// The configured port is not a number in 1..=65535.
    InvalidPort(String),
    /// Could not create the temporary base directory.
    BaseDir(io::Error),
    /// Another process is already bound to the port.
    PortInUse(u16),
    /// Any other bind failure.
    Bind(io::Error),
    /// The container stopped serving with an error.
    Serve(io::Error),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::AlreadyStarted => {
                write!(f, "unable to start, the server is already started")
            }
            StartError::InvalidPort(value) => {
                write!(f, "invalid port {value:?}, expected a number in 1-65535")
            }
            StartError::BaseDir(e) => {
                write!(f, "unable to create temporary base directory: {e}")
            }
            StartError::PortInUse(port) => {
                write!(f, "unable to start, a process is already bound to port {port}")
            }
            StartError::Bind(e) => write!(f, "unable to bind listener: {e}"),
            StartError::Serve(e) => write!(f, "server stopped unexpectedly: {e}"),
        }
    }
}

impl std::error::Error for StartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartError::BaseDir(e) | StartError::Bind(e) | StartError::Serve(e) => Some(e),
            _ => None,
        }
    }
}
