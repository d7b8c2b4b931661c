// Application state module
// Immutable per-process state shared by every connection

use super::types::Config;
use crate::error::TemplateError;
use crate::vanity::MetaTemplate;

/// Application state
///
/// Built once at start-up and shared read-only through an `Arc`; nothing in
/// it is written after construction.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub template: MetaTemplate,
    pub access_log: bool,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, TemplateError> {
        Ok(Self {
            config: config.clone(),
            template: MetaTemplate::go_import()?,
            access_log: config.logging.access_log,
        })
    }
}
