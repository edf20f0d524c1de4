//! Command-line configuration for the host server.
//!
//! All supported arguments live in one static table; the clap `Command` and
//! the help text are both derived from it. Resolution happens once, before
//! any server resource is touched, and yields an immutable `ResolvedConfig`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, Command};

use crate::error::ConfigError;

/// One supported command-line argument.
pub struct ArgumentSpec {
    pub key: &'static str,
    pub short: char,
    pub long: &'static str,
    pub required: bool,
    pub takes_value: bool,
    pub help: &'static str,
    pub default: Option<&'static str>,
}

/// Every argument the server understands, in help-text order.
pub const ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        key: "help",
        short: 'h',
        long: "help",
        required: false,
        takes_value: false,
        help: "displays the help text you're seeing now",
        default: None,
    },
    ArgumentSpec {
        key: "port",
        short: 'p',
        long: "port",
        required: false,
        takes_value: true,
        help: "sets the port to listen on  eg. 80",
        default: Some("80"),
    },
    ArgumentSpec {
        key: "tempDirPrefix",
        short: 't',
        long: "tempDirPrefix",
        required: false,
        takes_value: true,
        help: "sets the prefix for the temporary base directory name  eg. prefix",
        default: Some("tomcat-base-dir"),
    },
    ArgumentSpec {
        key: "webapproot",
        short: 'w',
        long: "webapproot",
        required: true,
        takes_value: true,
        help: "sets the web application root. A directory named 'webroot' should be \
               located inside, which is where content will be served from",
        default: None,
    },
];

/// Immutable configuration resolved from the command line.
///
/// `port` stays a string here; the bootstrap parses it right before binding
/// so a bad value is reported as a startup failure, never a bind attempt.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub port: String,
    pub temp_dir_prefix: String,
    pub web_app_root: PathBuf,
}

impl ResolvedConfig {
    /// Directory content is served from.
    pub fn webroot(&self) -> PathBuf {
        self.web_app_root.join("webroot")
    }

    /// Script engine working directory.
    pub fn web_inf(&self) -> PathBuf {
        self.web_app_root.join("WEB-INF")
    }

    /// Script engine server root.
    pub fn server_root(&self) -> PathBuf {
        self.web_app_root.join("lucee-server")
    }
}

/// Outcome of a successful resolution.
pub enum Resolution {
    /// `-h`/`--help` was given: print this text and exit 0 without starting.
    Help(String),
    Config(ResolvedConfig),
}

/// Builds the clap command from the argument table.
fn command() -> Command {
    let mut cmd = Command::new("cfmhost")
        .about("Hosts a CFML script engine behind an embedded HTTP server")
        .disable_help_flag(true)
        .disable_version_flag(true);
    for spec in ARGUMENTS {
        let mut arg = Arg::new(spec.key)
            .short(spec.short)
            .long(spec.long)
            .help(spec.help);
        arg = if !spec.takes_value {
            // Only the help flag is valueless today.
            arg.action(ArgAction::Help)
        } else {
            arg.action(ArgAction::Set)
                .value_name(spec.key)
                .required(spec.required)
        };
        if let Some(default) = spec.default {
            arg = arg.default_value(default);
        }
        cmd = cmd.arg(arg);
    }
    cmd
}

/// Resolves raw CLI tokens into a configuration.
///
/// The first token is the program name, as in `std::env::args`.
pub fn resolve<I, T>(argv: I) -> Result<Resolution, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match command().try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            return Ok(Resolution::Help(e.to_string()));
        }
        Err(e) => return Err(classify(e)),
    };

    let value = |key: &str| -> Result<String, ConfigError> {
        matches
            .get_one::<String>(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingRequiredArgument(format!("--{key}")))
    };

    Ok(Resolution::Config(ResolvedConfig {
        port: value("port")?,
        temp_dir_prefix: value("tempDirPrefix")?,
        web_app_root: PathBuf::from(value("webapproot")?),
    }))
}

/// Maps a clap parse failure onto the config error taxonomy.
fn classify(err: clap::Error) -> ConfigError {
    let flag = offending_flag(&err);
    match err.kind() {
        ErrorKind::UnknownArgument => ConfigError::UnrecognizedArgument(flag),
        ErrorKind::MissingRequiredArgument => ConfigError::MissingRequiredArgument(flag),
        ErrorKind::InvalidValue => {
            // clap reports a flag given without its value as an invalid
            // (empty) value; a genuinely bad value keeps clap's message.
            let value = match err.get(ContextKind::InvalidValue) {
                Some(ContextValue::String(s)) => s.clone(),
                _ => String::new(),
            };
            if value.is_empty() {
                ConfigError::MissingArgumentValue(flag)
            } else {
                ConfigError::Invalid(err.to_string())
            }
        }
        _ => ConfigError::Invalid(err.to_string()),
    }
}

fn offending_flag(err: &clap::Error) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(s)) => s.clone(),
        Some(ContextValue::Strings(all)) => all.join(", "),
        _ => String::new(),
    }
}
