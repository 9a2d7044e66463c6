//! Named transformations.

use crate::error::{BoxError, ResolutionError};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::Location;
use splice_parser::SyntaxNode;
use std::fmt;
use std::sync::Arc;

/// A rewrite rule applied to a directive's target.
///
/// `apply` receives the target statement and returns its replacement. It may
/// synthesize new nodes, reuse parts of the target, or return a `begin`
/// sequence to replace one statement with several (an empty sequence removes
/// the target). It must not depend on anything but its argument.
pub trait Transformation: Send + Sync {
    /// Computes the replacement for `node`.
    fn apply(&self, node: &SyntaxNode) -> Result<SyntaxNode, BoxError>;
}

impl<F> Transformation for F
where
    F: Fn(&SyntaxNode) -> Result<SyntaxNode, BoxError> + Send + Sync,
{
    fn apply(&self, node: &SyntaxNode) -> Result<SyntaxNode, BoxError> {
        self(node)
    }
}

/// Maps transformation names to transformations.
///
/// Names are constant paths such as `Foo::Bar`. A leading `::` is ignored, so
/// `transform!(::Foo)` and `transform!(Foo)` resolve to the same entry.
#[derive(Clone, Default)]
pub struct TransformationRegistry {
    bindings: FxHashMap<SmolStr, Arc<dyn Transformation>>,
}

impl TransformationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in transformations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_all(&mut registry);
        registry
    }

    /// Binds `name` to `transformation`, replacing any previous binding.
    pub fn register(
        &mut self,
        name: impl AsRef<str>,
        transformation: impl Transformation + 'static,
    ) -> &mut Self {
        self.register_shared(name, Arc::new(transformation))
    }

    /// Binds `name` to an already shared transformation.
    pub fn register_shared(
        &mut self,
        name: impl AsRef<str>,
        transformation: Arc<dyn Transformation>,
    ) -> &mut Self {
        self.bindings
            .insert(SmolStr::from(normalize(name.as_ref())), transformation);
        self
    }

    /// Looks up the transformation a directive names.
    ///
    /// There is no fallback: an unknown name is an error.
    pub fn resolve(
        &self,
        name: &str,
        location: Option<Location>,
    ) -> Result<Arc<dyn Transformation>, ResolutionError> {
        self.bindings
            .get(normalize(name))
            .cloned()
            .ok_or_else(|| ResolutionError {
                name: SmolStr::from(name),
                location,
            })
    }

    /// Returns true if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(normalize(name))
    }

    /// Returns the bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(SmolStr::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for TransformationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn normalize(name: &str) -> &str {
    name.strip_prefix("::").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_parser::build::send;

    fn foo(_node: &SyntaxNode) -> Result<SyntaxNode, BoxError> {
        Ok(send(None, "foo", []))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TransformationRegistry::new();
        registry.register("My::Foo", foo);

        let resolved = registry.resolve("My::Foo", None).unwrap();
        let node = send(None, "bar", []);
        assert_eq!(resolved.apply(&node).unwrap().to_sexp(), "(send nil :foo)");
    }

    #[test]
    fn test_leading_colons_are_ignored() {
        let mut registry = TransformationRegistry::new();
        registry.register("::Foo", foo);
        assert!(registry.resolve("Foo", None).is_ok());
        assert!(registry.resolve("::Foo", None).is_ok());
        assert_eq!(registry.names(), vec!["Foo"]);
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let registry = TransformationRegistry::new();
        let error = match registry.resolve("::Missing", None) {
            Err(error) => error,
            Ok(_) => panic!("resolved an unregistered name"),
        };
        assert_eq!(error.name, "::Missing");
    }

    #[test]
    fn test_closures_are_transformations() {
        let mut registry = TransformationRegistry::new();
        let method = String::from("baz");
        registry.register("Baz", move |_: &SyntaxNode| -> Result<SyntaxNode, BoxError> {
            Ok(send(None, &method, []))
        });
        assert!(registry.contains("Baz"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = TransformationRegistry::with_builtins();
        assert!(registry.contains("Splice::Strip"));
        assert!(registry.contains("Splice::Unwrap"));
    }
}
