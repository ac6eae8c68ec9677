//! Conversion from the `[logging]` config section.

use eventpool_config::LoggingSection;

use crate::logging::{LogConfig, LogFormat};

impl From<&LoggingSection> for LogConfig {
    /// Validated sections always carry a known format; anything else falls
    /// back to [`LogFormat::Pretty`].
    fn from(section: &LoggingSection) -> Self {
        let format = section.format.parse().unwrap_or(LogFormat::Pretty);
        let mut config = Self::new(section.level.to_ascii_lowercase()).with_format(format);
        config.directives.clone_from(&section.directives);
        if let Some(directory) = &section.directory {
            config = config.with_file_logging(directory, "eventpool");
        }
        config
    }
}
