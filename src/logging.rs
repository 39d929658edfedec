/// Constant for the environment variable selecting the link log level
pub const ENV_LOG_LEVEL: &str = "CFX_LOG_LEVEL";

/// Verbosity of the link driver
///
/// Read from [ENV_LOG_LEVEL] when the driver starts, either as a level
/// name (`"debug"`) or as a number (`"4"`). Unrecognized values fall back
/// to the default.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    Off = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl From<u32> for LogLevel {
    fn from(level: u32) -> Self {
        match level {
            0 => Self::Off,
            1 => Self::Error,
            2 => Self::Warn,
            3 => Self::Info,
            4 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(level: &str) -> Self {
        let level = level.trim();

        if let Ok(num) = level.parse::<u32>() {
            return num.into();
        }

        match level.to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::default(),
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

/// Gets the link log level from the environment.
///
/// Returns `None` when [ENV_LOG_LEVEL] is unset, leaving whatever maximum
/// level the host application configured untouched.
#[cfg(feature = "std")]
pub fn cfx_log_level() -> Option<LogLevel> {
    std::env::var(ENV_LOG_LEVEL)
        .ok()
        .map(|level| LogLevel::from(level.as_str()))
}

#[cfg(not(feature = "std"))]
pub fn cfx_log_level() -> Option<LogLevel> {
    None
}
