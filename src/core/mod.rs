pub mod blocklist;
pub mod catalog;
pub mod guard;

pub use crate::domain::model::{
    AnnotationInfo, AnnotationRule, BlockedType, RuleOrigin, TypeInfo, TypeRule,
};
pub use crate::domain::ports::{Annotation, RuleSource};
pub use crate::utils::error::Result;
