use crate::core::{Annotation, AnnotationInfo, AnnotationRule, TypeInfo};
use crate::domain::model::{module_contains, normalize_type_path};
use std::any::TypeId;

/// The set of types a program makes known to the blocklist.
///
/// Package and annotation rules resolve against this catalog only, since
/// nothing enumerates a crate's types at runtime.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    entries: Vec<TypeInfo>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.entry(TypeInfo::of::<T>());
        self
    }

    /// Registers a type whose container is renamed with `#[serde(rename)]`.
    pub fn register_as<T: ?Sized + 'static>(&mut self, serde_name: &str) -> &mut Self {
        let info = TypeInfo::of::<T>().renamed(serde_name);
        self.entry(info).name = serde_name.to_string();
        self
    }

    pub fn annotate<T: ?Sized + 'static, A: Annotation>(&mut self) -> &mut Self {
        let annotation = AnnotationInfo::of::<A>();
        let entry = self.entry(TypeInfo::of::<T>());
        if !entry.annotations.contains(&annotation) {
            entry.annotations.push(annotation);
        }
        self
    }

    fn entry(&mut self, info: TypeInfo) -> &mut TypeInfo {
        let idx = match self.entries.iter().position(|e| e.id == info.id) {
            Some(idx) => idx,
            None => {
                tracing::trace!("Cataloguing {} as {}", info.path, info.name);
                self.entries.push(info);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeInfo> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn find_path(&self, path: &str) -> Option<&TypeInfo> {
        let path = normalize_type_path(path);
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn types_in_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a TypeInfo> + 'a {
        self.entries
            .iter()
            .filter(move |e| module_contains(module, &e.path))
    }

    pub fn annotated_with<'a>(
        &'a self,
        rules: &'a [AnnotationRule],
    ) -> impl Iterator<Item = &'a TypeInfo> + 'a {
        self.entries
            .iter()
            .filter(move |e| rules.iter().any(|rule| e.has_annotation(rule)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
