//! Configuration: typed settings plus figment-based multi-source loading.

mod file_config;
mod loader;

pub use file_config::{
    AutomationSection, CatalogSection, EventsSection, FileConfig, GraphSection, LlmSection,
    StorageSection,
};
pub use loader::ConfigLoader;
