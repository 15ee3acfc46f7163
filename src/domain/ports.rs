/// Marker for annotation types.
///
/// An annotation is usually a unit struct. Attach it to catalogued types with
/// [`TypeCatalog::annotate`](crate::core::catalog::TypeCatalog::annotate) and
/// block everything carrying it with
/// [`Builder::annotation`](crate::core::blocklist::Builder::annotation).
pub trait Annotation: 'static {}

/// Textual blocklist rules, as read from configuration.
pub trait RuleSource {
    /// Serde names (`Point`) or full type paths (`my_app::geo::Point`).
    fn type_names(&self) -> &[String];
    fn packages(&self) -> &[String];
    fn annotation_names(&self) -> &[String];
}
