//! Pagination settings shared by list views.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Default half-width of the page-number window
pub const DEFAULT_PAGE_SLIDE: f64 = 2.0;

/// Pagination settings for the views built by [`Views::standard`](crate::Views::standard)
///
/// Missing fields take their defaults when deserialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Items per page
    pub page_size: usize,
    /// Initial half-width of the page-number window
    pub page_slide: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_slide: DEFAULT_PAGE_SLIDE,
        }
    }
}

impl ViewConfig {
    /// Check the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if !self.page_slide.is_finite() || self.page_slide < 0.0 {
            return Err(ConfigError::InvalidPageSlide(self.page_slide));
        }
        Ok(())
    }

    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
