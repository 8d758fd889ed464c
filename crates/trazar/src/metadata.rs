//! Out-of-band type metadata for page-object wrapper classes.
//!
//! Type information cannot be derived from the DOM alone (class names are
//! obfuscated and shared), so a side-table keyed by wrapper type identity
//! associates each class with its logical element type string and base
//! kind. The table also drives selector generation, keeping query code free
//! of type-string literals. Lookups on an unregistered class fail loudly:
//! that is a programming error, not a runtime condition.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::dom;
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;

/// Base kind of a diagram element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    /// Generic html element
    Html,
    /// Graph node
    Node,
    /// Graph edge
    Edge,
}

impl BaseKind {
    /// The base-kind CSS class present on an element from first render,
    /// before its type attribute settles
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Html => dom::HTML_BASE_CLASS,
            Self::Node => dom::NODE_BASE_CLASS,
            Self::Edge => dom::EDGE_BASE_CLASS,
        }
    }
}

/// Metadata attached to a wrapper class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMetadata {
    /// Logical element type string (e.g. `task:manual`)
    pub element_type: String,
    /// Base kind of the element
    pub base: BaseKind,
}

impl ElementMetadata {
    /// Metadata for a node wrapper
    #[must_use]
    pub fn node(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            base: BaseKind::Node,
        }
    }

    /// Metadata for an edge wrapper
    #[must_use]
    pub fn edge(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            base: BaseKind::Edge,
        }
    }

    /// Metadata for a generic html wrapper
    #[must_use]
    pub fn html(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            base: BaseKind::Html,
        }
    }
}

/// The global wrapper-class metadata registry.
///
/// Registration happens once per class, at suite setup; lookups happen on
/// every typed query.
pub struct Metadata;

impl Metadata {
    fn registry() -> &'static RwLock<HashMap<TypeId, ElementMetadata>> {
        static REGISTRY: OnceLock<RwLock<HashMap<TypeId, ElementMetadata>>> = OnceLock::new();
        REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
    }

    /// Attach metadata to a wrapper class. Idempotent per class;
    /// re-adding overwrites.
    pub fn add<T: 'static>(metadata: ElementMetadata) {
        let mut registry = Self::registry().write().unwrap_or_else(|e| e.into_inner());
        let _ = registry.insert(TypeId::of::<T>(), metadata);
    }

    /// Metadata for a wrapper class, or a loud `MissingMetadata` error
    /// naming the class.
    pub fn assert<T: 'static>() -> TrazarResult<ElementMetadata> {
        let registry = Self::registry().read().unwrap_or_else(|e| e.into_inner());
        registry
            .get(&TypeId::of::<T>())
            .cloned()
            .ok_or(TrazarError::MissingMetadata {
                class: std::any::type_name::<T>(),
            })
    }

    /// The registered type string of a wrapper class
    pub fn get_type<T: 'static>() -> TrazarResult<String> {
        Ok(Self::assert::<T>()?.element_type)
    }

    /// Selector matching elements of the wrapper's registered type
    pub fn type_selector<T: 'static>() -> TrazarResult<Selector> {
        Ok(Selector::type_attr(Self::get_type::<T>()?))
    }

    /// Selector matching settled (non-ghost) elements of the wrapper's
    /// registered type
    pub fn settled_type_selector<T: 'static>() -> TrazarResult<Selector> {
        Ok(Self::type_selector::<T>()?.not_ghost())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct RegisteredProbe;
    struct UnregisteredProbe;
    struct OverwriteProbe;

    mod registry_tests {
        use super::*;

        #[test]
        fn test_add_and_assert() {
            Metadata::add::<RegisteredProbe>(ElementMetadata::node("task:manual"));
            let meta = Metadata::assert::<RegisteredProbe>().unwrap();
            assert_eq!(meta.element_type, "task:manual");
            assert_eq!(meta.base, BaseKind::Node);
        }

        #[test]
        fn test_missing_metadata_names_the_class() {
            let err = Metadata::assert::<UnregisteredProbe>().unwrap_err();
            let message = err.to_string();
            assert!(message.contains("UnregisteredProbe"), "got: {message}");
        }

        #[test]
        fn test_re_adding_overwrites() {
            Metadata::add::<OverwriteProbe>(ElementMetadata::edge("edge"));
            Metadata::add::<OverwriteProbe>(ElementMetadata::edge("edge:weighted"));
            assert_eq!(
                Metadata::get_type::<OverwriteProbe>().unwrap(),
                "edge:weighted"
            );
        }
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_type_selector_generation() {
            Metadata::add::<RegisteredProbe>(ElementMetadata::node("task:manual"));
            let sel = Metadata::type_selector::<RegisteredProbe>().unwrap();
            assert_eq!(
                sel.to_css().unwrap(),
                "[data-diagram-type=\"task:manual\"]"
            );
        }

        #[test]
        fn test_settled_selector_excludes_ghosts() {
            Metadata::add::<RegisteredProbe>(ElementMetadata::node("task:manual"));
            let sel = Metadata::settled_type_selector::<RegisteredProbe>().unwrap();
            assert_eq!(
                sel.to_css().unwrap(),
                "[data-diagram-type=\"task:manual\"]:not(.ghost)"
            );
        }
    }

    mod base_kind_tests {
        use super::*;

        #[test]
        fn test_base_kind_classes() {
            assert_eq!(BaseKind::Node.css_class(), "node");
            assert_eq!(BaseKind::Edge.css_class(), "edge");
            assert_eq!(BaseKind::Html.css_class(), "html-element");
        }
    }
}
