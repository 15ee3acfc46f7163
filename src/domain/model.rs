use crate::domain::ports::Annotation;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;

/// Strips leading references, `dyn` and generic arguments from a type path.
///
/// `&mut my_app::geo::Point<i32>` becomes `my_app::geo::Point`.
pub fn normalize_type_path(raw: &str) -> String {
    let mut path = raw.trim();
    loop {
        let stripped = path
            .strip_prefix("&mut ")
            .or_else(|| path.strip_prefix('&'))
            .or_else(|| path.strip_prefix("dyn "))
            .map(str::trim_start);
        match stripped {
            Some(rest) => path = rest,
            None => break,
        }
    }
    match path.find('<') {
        Some(idx) => path[..idx].to_string(),
        None => path.to_string(),
    }
}

/// Last `::` segment of a path.
pub fn simple_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Recursive module match: `a::b` contains `a::b::C` and `a::b::c::D`.
pub fn module_contains(module: &str, path: &str) -> bool {
    path.len() > module.len()
        && path.starts_with(module)
        && path[module.len()..].starts_with("::")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationInfo {
    pub id: TypeId,
    pub path: String,
    pub name: String,
}

impl AnnotationInfo {
    pub fn of<A: Annotation>() -> Self {
        let path = normalize_type_path(std::any::type_name::<A>());
        let name = simple_name(&path).to_string();
        Self {
            id: TypeId::of::<A>(),
            path,
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub id: TypeId,
    pub path: String,
    /// Container name serde hands to the serializer.
    pub name: String,
    pub annotations: Vec<AnnotationInfo>,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        let path = normalize_type_path(std::any::type_name::<T>());
        let name = simple_name(&path).to_string();
        Self {
            id: TypeId::of::<T>(),
            path,
            name,
            annotations: Vec::new(),
        }
    }

    pub fn renamed(mut self, serde_name: impl Into<String>) -> Self {
        self.name = serde_name.into();
        self
    }

    pub fn has_annotation(&self, rule: &AnnotationRule) -> bool {
        self.annotations.iter().any(|a| rule.matches(a))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRule {
    Type(TypeInfo),
    Path(String),
    Name(String),
}

impl TypeRule {
    /// `a::b::C` becomes a path rule, anything else a serde name.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains("::") {
            TypeRule::Path(normalize_type_path(raw))
        } else {
            TypeRule::Name(raw.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationRule {
    Type(AnnotationInfo),
    Name(String),
}

impl AnnotationRule {
    pub fn of<A: Annotation>() -> Self {
        AnnotationRule::Type(AnnotationInfo::of::<A>())
    }

    pub fn matches(&self, annotation: &AnnotationInfo) -> bool {
        match self {
            AnnotationRule::Type(info) => info.id == annotation.id,
            AnnotationRule::Name(name) => *name == annotation.name || *name == annotation.path,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            AnnotationRule::Type(info) => &info.name,
            AnnotationRule::Name(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "source", rename_all = "snake_case")]
pub enum RuleOrigin {
    Type,
    Package(String),
    Annotation(String),
}

impl fmt::Display for RuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOrigin::Type => write!(f, "blocked by type"),
            RuleOrigin::Package(module) => write!(f, "blocked by package {}", module),
            RuleOrigin::Annotation(name) => write!(f, "blocked by annotation {}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub origin: RuleOrigin,
}

impl BlockedType {
    pub fn message(&self) -> String {
        format!("Attempted to serialize disallowed type {}", self.name)
    }
}
