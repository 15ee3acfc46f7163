use crate::core::catalog::TypeCatalog;
use crate::core::guard::Screened;
use crate::core::{
    Annotation, AnnotationRule, BlockedType, Result, RuleOrigin, RuleSource, TypeInfo, TypeRule,
};
use crate::domain::model::{normalize_type_path, simple_name};
use crate::utils::error::BlocklistError;
use crate::utils::validation::validate_module_path;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::io;

/// A resolved set of types that must never be serialized.
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    by_name: BTreeMap<String, BlockedType>,
    by_path: BTreeMap<String, String>,
}

impl Blocklist {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn is_blocked(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn rule_for(&self, name: &str) -> Option<&BlockedType> {
        self.by_name.get(name)
    }

    pub fn is_path_blocked(&self, path: &str) -> bool {
        self.rule_for_path(path).is_some()
    }

    pub(crate) fn rule_for_path(&self, path: &str) -> Option<&BlockedType> {
        self.by_path
            .get(&normalize_type_path(path))
            .and_then(|name| self.by_name.get(name))
    }

    /// Blocked types ordered by serde name.
    pub fn blocked_types(&self) -> impl Iterator<Item = &BlockedType> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Wraps `value` so that any serde format refuses blocked types inside it.
    pub fn screen<'a, T: ?Sized + Serialize>(&'a self, value: &'a T) -> Screened<'a, T> {
        Screened::new(self, value)
    }

    pub fn serialize<T, S>(&self, value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        T: ?Sized + Serialize,
        S: Serializer,
    {
        self.screen(value).serialize(serializer)
    }

    pub fn to_writer<W: io::Write, T: ?Sized + Serialize>(&self, writer: W, value: &T) -> Result<()> {
        let screened = self.screen(value);
        let result = serde_json::to_writer(writer, &screened);
        screened.finish(result)
    }

    pub fn to_vec<T: ?Sized + Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let screened = self.screen(value);
        let result = serde_json::to_vec(&screened);
        screened.finish(result)
    }

    pub fn to_string<T: ?Sized + Serialize>(&self, value: &T) -> Result<String> {
        let screened = self.screen(value);
        let result = serde_json::to_string(&screened);
        screened.finish(result)
    }

    pub fn to_string_pretty<T: ?Sized + Serialize>(&self, value: &T) -> Result<String> {
        let screened = self.screen(value);
        let result = serde_json::to_string_pretty(&screened);
        screened.finish(result)
    }

    pub fn to_value<T: ?Sized + Serialize>(&self, value: &T) -> Result<serde_json::Value> {
        let screened = self.screen(value);
        let result = serde_json::to_value(&screened);
        screened.finish(result)
    }

    fn insert(&mut self, name: &str, path: Option<&str>, origin: RuleOrigin) {
        if let Some(path) = path {
            self.by_path
                .entry(path.to_string())
                .or_insert_with(|| name.to_string());
        }
        if !self.by_name.contains_key(name) {
            tracing::debug!("Blocking {} ({})", name, origin);
            self.by_name.insert(
                name.to_string(),
                BlockedType {
                    name: name.to_string(),
                    path: path.map(str::to_string),
                    origin,
                },
            );
        }
    }
}

/// Collects rules for a [`Blocklist`]. Duplicate rules are ignored.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    types: Vec<TypeRule>,
    packages: Vec<String>,
    annotations: Vec<AnnotationRule>,
    catalog: TypeCatalog,
}

impl Builder {
    pub fn block<T: ?Sized + 'static>(self) -> Self {
        self.types([TypeRule::Type(TypeInfo::of::<T>())])
    }

    pub fn types<I: IntoIterator<Item = TypeRule>>(mut self, rules: I) -> Self {
        for rule in rules {
            if !self.types.contains(&rule) {
                self.types.push(rule);
            }
        }
        self
    }

    pub fn type_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.types(names.into_iter().map(|n| TypeRule::parse(n.as_ref())))
    }

    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for package in packages {
            let package = package.into();
            if !self.packages.contains(&package) {
                self.packages.push(package);
            }
        }
        self
    }

    pub fn annotation<A: Annotation>(self) -> Self {
        self.annotations([AnnotationRule::of::<A>()])
    }

    pub fn annotations<I: IntoIterator<Item = AnnotationRule>>(mut self, rules: I) -> Self {
        for rule in rules {
            if !self.annotations.contains(&rule) {
                self.annotations.push(rule);
            }
        }
        self
    }

    pub fn annotation_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotations(names.into_iter().map(|n| AnnotationRule::Name(n.into())))
    }

    pub fn catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn rules_from<R: RuleSource + ?Sized>(self, source: &R) -> Self {
        self.type_names(source.type_names())
            .packages(source.packages().iter().cloned())
            .annotation_names(source.annotation_names().iter().cloned())
    }

    pub fn build(self) -> Result<Blocklist> {
        for package in &self.packages {
            validate_module_path("packages", package)?;
        }

        let mut blocklist = Blocklist::default();

        for rule in &self.types {
            match rule {
                TypeRule::Type(info) => {
                    // A catalogued entry carries any `register_as` rename.
                    let info = self.catalog.get(info.id).unwrap_or(info);
                    blocklist.insert(&info.name, Some(info.path.as_str()), RuleOrigin::Type);
                }
                TypeRule::Path(path) => match self.catalog.find_path(path) {
                    Some(info) => blocklist.insert(&info.name, Some(info.path.as_str()), RuleOrigin::Type),
                    None => blocklist.insert(simple_name(path), Some(path.as_str()), RuleOrigin::Type),
                },
                TypeRule::Name(name) => {
                    if name.is_empty() {
                        return Err(BlocklistError::InvalidConfigValueError {
                            field: "types".to_string(),
                            value: name.clone(),
                            reason: "Type name cannot be empty".to_string(),
                        });
                    }
                    blocklist.insert(name, None, RuleOrigin::Type);
                }
            }
        }

        for package in &self.packages {
            let mut matched = 0usize;
            for info in self.catalog.types_in_module(package) {
                blocklist.insert(
                    &info.name,
                    Some(info.path.as_str()),
                    RuleOrigin::Package(package.clone()),
                );
                matched += 1;
            }
            if matched == 0 {
                tracing::warn!("Package {} matches no catalogued type", package);
            }
        }

        if !self.annotations.is_empty() {
            for rule in &self.annotations {
                if self.catalog.annotated_with(std::slice::from_ref(rule)).next().is_none() {
                    tracing::warn!("Annotation {} matches no catalogued type", rule.label());
                }
            }
            for info in self.catalog.annotated_with(&self.annotations) {
                let label = self
                    .annotations
                    .iter()
                    .find(|rule| info.has_annotation(rule))
                    .map(|rule| rule.label().to_string())
                    .unwrap_or_default();
                blocklist.insert(&info.name, Some(info.path.as_str()), RuleOrigin::Annotation(label));
            }
        }

        tracing::debug!(
            "Resolved blocklist with {} types from {} type rules, {} packages, {} annotations",
            blocklist.len(),
            self.types.len(),
            self.packages.len(),
            self.annotations.len()
        );
        Ok(blocklist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod vault {
        pub struct Secret;
        pub mod keys {
            pub struct Key;
        }
    }

    struct Plain;

    struct Sensitive;
    impl Annotation for Sensitive {}

    fn vault() -> String {
        format!("{}::vault", module_path!())
    }

    #[test]
    fn test_empty_builder() {
        let blocklist = Blocklist::builder().build().unwrap();
        assert!(blocklist.is_empty());
        assert!(!blocklist.is_blocked("Plain"));
    }

    #[test]
    fn test_block_by_type() {
        let blocklist = Blocklist::builder().block::<Plain>().block::<Plain>().build().unwrap();
        assert_eq!(blocklist.len(), 1);
        assert!(blocklist.is_blocked("Plain"));
        assert!(blocklist.is_path_blocked(&format!("{}::Plain", module_path!())));
        assert_eq!(blocklist.rule_for("Plain").unwrap().origin, RuleOrigin::Type);
    }

    #[test]
    fn test_type_names_without_catalog() {
        let blocklist = Blocklist::builder()
            .type_names(["Point", "geo::Polygon"])
            .build()
            .unwrap();
        assert!(blocklist.is_blocked("Point"));
        assert!(blocklist.is_blocked("Polygon"));
        assert!(blocklist.is_path_blocked("geo::Polygon"));
        assert!(!blocklist.is_path_blocked("Point"));
    }

    #[test]
    fn test_empty_type_name_rejected() {
        let err = Blocklist::builder().type_names([""]).build().unwrap_err();
        assert!(matches!(err, BlocklistError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_package_resolution_is_recursive() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register::<vault::Secret>()
            .register::<vault::keys::Key>()
            .register::<Plain>();

        let blocklist = Blocklist::builder()
            .catalog(catalog)
            .packages([vault()])
            .build()
            .unwrap();

        let names: Vec<&str> = blocklist.blocked_types().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Key", "Secret"]);
        assert_eq!(
            blocklist.rule_for("Secret").unwrap().origin,
            RuleOrigin::Package(vault())
        );
    }

    #[test]
    fn test_invalid_package_rejected() {
        let err = Blocklist::builder()
            .packages(["not a module"])
            .build()
            .unwrap_err();
        assert!(matches!(err, BlocklistError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_first_rule_decides_origin() {
        let mut catalog = TypeCatalog::new();
        catalog.annotate::<vault::Secret, Sensitive>();
        catalog.annotate::<Plain, Sensitive>();

        let blocklist = Blocklist::builder()
            .catalog(catalog)
            .annotation::<Sensitive>()
            .packages([vault()])
            .block::<vault::Secret>()
            .build()
            .unwrap();

        assert_eq!(blocklist.rule_for("Secret").unwrap().origin, RuleOrigin::Type);
        assert_eq!(
            blocklist.rule_for("Plain").unwrap().origin,
            RuleOrigin::Annotation("Sensitive".to_string())
        );
    }

    #[test]
    fn test_block_by_type_uses_catalogued_rename() {
        let mut catalog = TypeCatalog::new();
        catalog.register_as::<vault::Secret>("secret_v2");

        let blocklist = Blocklist::builder()
            .catalog(catalog)
            .block::<vault::Secret>()
            .build()
            .unwrap();

        assert!(blocklist.is_blocked("secret_v2"));
        assert!(!blocklist.is_blocked("Secret"));
        assert!(blocklist.is_path_blocked(&format!("{}::Secret", vault())));
    }

    #[test]
    fn test_annotation_by_name() {
        let mut catalog = TypeCatalog::new();
        catalog.annotate::<Plain, Sensitive>().register::<vault::Secret>();

        let blocklist = Blocklist::builder()
            .catalog(catalog)
            .annotation_names(["Sensitive"])
            .build()
            .unwrap();
        assert!(blocklist.is_blocked("Plain"));
        assert!(!blocklist.is_blocked("Secret"));
    }
}
