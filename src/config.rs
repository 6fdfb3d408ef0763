//! Configuration for report generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`],
//! built via its [`GenerationConfigBuilder`]. Keeping every knob in one
//! struct makes it trivial to share a config across requests and to log
//! exactly what a run was configured with.
//!
//! The template and destination ids are the only required inputs; they name
//! fixed remote objects (one read-only template, one folder clones are
//! created in) and have no sensible defaults.

use crate::document::DEFAULT_IMAGE_WIDTH_EMU;
use crate::error::ReportError;
use crate::remote::{DocumentId, FolderId};
use crate::sheets::{BILLING_WORKSHEET, STATION_WORKSHEET};

/// Configuration for one report-generation pipeline.
///
/// # Example
/// ```rust
/// use bbnt_docgen::GenerationConfig;
///
/// let config = GenerationConfig::builder("template-doc-id", "dest-folder-id")
///     .file_prefix("BBNT")
///     .api_timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// The read-only template document all clones are made from.
    pub template: DocumentId,

    /// Folder the clones are created in. Append-only from this crate's
    /// perspective: distinct clone titles, no contention.
    pub destination: FolderId,

    /// Prefix for clone titles and download file names. Default: `BBNT`.
    pub file_prefix: String,

    /// Worksheet with station profiles and credentials. Default: `CSDL`.
    pub station_worksheet: String,

    /// Worksheet with per-period billing rows. Default: `Taichinh`.
    pub billing_worksheet: String,

    /// Width of embedded photos in EMU. Default: 3 inches.
    ///
    /// Height is never configured — it follows each photo's own aspect
    /// ratio at this width.
    pub image_width_emu: u32,

    /// HTTP timeout for remote calls in seconds. Default: 120.
    ///
    /// This is the transport-level ceiling of the injected client; the
    /// pipeline itself imposes no deadline and never retries.
    pub api_timeout_secs: u64,
}

impl GenerationConfig {
    /// Create a builder with the two required remote ids.
    pub fn builder(
        template: impl Into<String>,
        destination: impl Into<String>,
    ) -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: GenerationConfig {
                template: DocumentId(template.into()),
                destination: FolderId(destination.into()),
                file_prefix: "BBNT".to_string(),
                station_worksheet: STATION_WORKSHEET.to_string(),
                billing_worksheet: BILLING_WORKSHEET.to_string(),
                image_width_emu: DEFAULT_IMAGE_WIDTH_EMU,
                api_timeout_secs: 120,
            },
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    pub fn station_worksheet(mut self, name: impl Into<String>) -> Self {
        self.config.station_worksheet = name.into();
        self
    }

    pub fn billing_worksheet(mut self, name: impl Into<String>) -> Self {
        self.config.billing_worksheet = name.into();
        self
    }

    pub fn image_width_emu(mut self, emu: u32) -> Self {
        self.config.image_width_emu = emu;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, ReportError> {
        let c = &self.config;
        if c.template.as_str().is_empty() {
            return Err(ReportError::InvalidConfig(
                "template document id must not be empty".into(),
            ));
        }
        if c.destination.0.is_empty() {
            return Err(ReportError::InvalidConfig(
                "destination folder id must not be empty".into(),
            ));
        }
        if c.file_prefix.is_empty() {
            return Err(ReportError::InvalidConfig(
                "file prefix must not be empty".into(),
            ));
        }
        if c.image_width_emu == 0 {
            return Err(ReportError::InvalidConfig(
                "image width must be positive".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployment() {
        let config = GenerationConfig::builder("tpl", "folder").build().unwrap();
        assert_eq!(config.file_prefix, "BBNT");
        assert_eq!(config.station_worksheet, "CSDL");
        assert_eq!(config.billing_worksheet, "Taichinh");
        assert_eq!(config.image_width_emu, DEFAULT_IMAGE_WIDTH_EMU);
    }

    #[test]
    fn rejects_empty_template() {
        assert!(matches!(
            GenerationConfig::builder("", "folder").build(),
            Err(ReportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_image_width() {
        assert!(GenerationConfig::builder("tpl", "folder")
            .image_width_emu(0)
            .build()
            .is_err());
    }
}
