pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::BlocklistConfig;
pub use core::{
    blocklist::{Blocklist, Builder},
    catalog::TypeCatalog,
    guard::Screened,
    Annotation, AnnotationRule, BlockedType, RuleOrigin, RuleSource, TypeInfo, TypeRule,
};
pub use utils::error::{BlocklistError, Result};
