//! Composition macros for assembling wrapper classes.
//!
//! A concrete wrapper is a struct over one of the model bases ([`Node`],
//! [`Edge`], [`ModelElement`]) plus a set of capability flows. The macros
//! generate the struct, its `Locateable`/`DiagramElement` wiring, a
//! `register()` function attaching the type metadata, and an empty impl for
//! every listed capability. Leaf wrappers stay ordinary types: inherent
//! impls can add semantic accessors on top.
//!
//! [`Node`]: crate::model::Node
//! [`Edge`]: crate::model::Edge
//! [`ModelElement`]: crate::model::ModelElement

/// Define a node wrapper class.
///
/// ```ignore
/// use trazar::flows::{Clickable, Deletable, Selectable};
///
/// trazar::diagram_node! {
///     /// Manual task node.
///     pub struct TaskManual: "task:manual", capabilities = [Clickable, Selectable, Deletable];
/// }
///
/// TaskManual::register();
/// ```
#[macro_export]
macro_rules! diagram_node {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident : $element_type:literal
        $(, capabilities = [$($capability:path),* $(,)?])? ;
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            inner: $crate::model::Node,
        }

        impl $name {
            /// Attach this wrapper's type metadata to the registry
            pub fn register() {
                $crate::metadata::Metadata::add::<Self>(
                    $crate::metadata::ElementMetadata::node($element_type),
                );
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::model::Node;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        impl $crate::element::Locateable for $name {
            fn locator(&self) -> &$crate::locator::Locator {
                $crate::element::Locateable::locator(&self.inner)
            }
        }

        impl $crate::model::DiagramElement for $name {
            fn from_locator(
                graph: &$crate::model::Graph,
                locator: $crate::locator::Locator,
            ) -> Self {
                Self {
                    inner: <$crate::model::Node as $crate::model::DiagramElement>::from_locator(
                        graph, locator,
                    ),
                }
            }

            fn graph(&self) -> &$crate::model::Graph {
                $crate::model::DiagramElement::graph(&self.inner)
            }
        }

        $($(impl $capability for $name {})*)?
    };
}

/// Define an edge wrapper class; same shape as [`diagram_node!`]
#[macro_export]
macro_rules! diagram_edge {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident : $element_type:literal
        $(, capabilities = [$($capability:path),* $(,)?])? ;
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            inner: $crate::model::Edge,
        }

        impl $name {
            /// Attach this wrapper's type metadata to the registry
            pub fn register() {
                $crate::metadata::Metadata::add::<Self>(
                    $crate::metadata::ElementMetadata::edge($element_type),
                );
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::model::Edge;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        impl $crate::element::Locateable for $name {
            fn locator(&self) -> &$crate::locator::Locator {
                $crate::element::Locateable::locator(&self.inner)
            }
        }

        impl $crate::model::DiagramElement for $name {
            fn from_locator(
                graph: &$crate::model::Graph,
                locator: $crate::locator::Locator,
            ) -> Self {
                Self {
                    inner: <$crate::model::Edge as $crate::model::DiagramElement>::from_locator(
                        graph, locator,
                    ),
                }
            }

            fn graph(&self) -> &$crate::model::Graph {
                $crate::model::DiagramElement::graph(&self.inner)
            }
        }

        $($(impl $capability for $name {})*)?
    };
}

/// Define a generic labelled/markable element wrapper class; same shape as
/// [`diagram_node!`]
#[macro_export]
macro_rules! diagram_element {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident : $element_type:literal
        $(, capabilities = [$($capability:path),* $(,)?])? ;
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            inner: $crate::model::ModelElement,
        }

        impl $name {
            /// Attach this wrapper's type metadata to the registry
            pub fn register() {
                $crate::metadata::Metadata::add::<Self>(
                    $crate::metadata::ElementMetadata::html($element_type),
                );
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::model::ModelElement;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        impl $crate::element::Locateable for $name {
            fn locator(&self) -> &$crate::locator::Locator {
                $crate::element::Locateable::locator(&self.inner)
            }
        }

        impl $crate::model::DiagramElement for $name {
            fn from_locator(
                graph: &$crate::model::Graph,
                locator: $crate::locator::Locator,
            ) -> Self {
                Self {
                    inner: <$crate::model::ModelElement as $crate::model::DiagramElement>::from_locator(
                        graph, locator,
                    ),
                }
            }

            fn graph(&self) -> &$crate::model::Graph {
                $crate::model::DiagramElement::graph(&self.inner)
            }
        }

        $($(impl $capability for $name {})*)?
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::flows::{Clickable, Hoverable, Selectable};
    use crate::mock::{test_app, MockDom, MockElement};
    use crate::selector::Selector;
    use crate::{diagram_edge, diagram_node};

    // Two wrappers over the same DOM shape, with the same capabilities
    // attached in opposite order.
    diagram_node! {
        pub struct OrderAb: "probe:order", capabilities = [Clickable, Hoverable, Selectable];
    }

    diagram_node! {
        pub struct OrderBa: "probe:order", capabilities = [Selectable, Hoverable, Clickable];
    }

    diagram_edge! {
        pub struct PlainEdge: "edge";
    }

    fn order_dom() -> MockDom {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g")
                .id("order_1")
                .class("node")
                .attr(crate::dom::TYPE_ATTRIBUTE, "probe:order"),
        );
        dom
    }

    // Attachment order of independent flows must not change externally
    // observable behavior.
    #[tokio::test]
    async fn test_capability_order_is_irrelevant() {
        OrderAb::register();
        let dom_ab = order_dom();
        let app = test_app(&dom_ab).await;
        let element: OrderAb = app
            .graph()
            .get_element(Selector::id("order_1"))
            .await
            .unwrap();
        element.hover().await.unwrap();
        element.select().await.unwrap();
        assert!(element.is_selected().await.unwrap());
        let ops_ab = dom_ab.operations();

        OrderBa::register();
        let dom_ba = order_dom();
        let app = test_app(&dom_ba).await;
        let element: OrderBa = app
            .graph()
            .get_element(Selector::id("order_1"))
            .await
            .unwrap();
        element.hover().await.unwrap();
        element.select().await.unwrap();
        assert!(element.is_selected().await.unwrap());
        let ops_ba = dom_ba.operations();

        assert_eq!(ops_ab, ops_ba);
    }

    // Composed wrappers stay ordinary types: inherent impls can add
    // semantic accessors on top.
    diagram_node! {
        pub struct Labelled: "probe:labelled", capabilities = [Clickable];
    }

    impl Labelled {
        async fn shouted_label(&self) -> crate::result::TrazarResult<String> {
            Ok(self.label().await?.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_leaf_wrapper_extends_composed_base() {
        Labelled::register();
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g")
                .id("lab_1")
                .class("node")
                .attr(crate::dom::TYPE_ATTRIBUTE, "probe:labelled"),
        );
        dom.insert(
            Some("lab_1"),
            MockElement::new("text").class("label").text("quiet"),
        );
        let app = test_app(&dom).await;
        let element: Labelled = app
            .graph()
            .get_element(Selector::id("lab_1"))
            .await
            .unwrap();
        assert_eq!(element.shouted_label().await.unwrap(), "QUIET");
    }

    #[tokio::test]
    async fn test_edge_wrapper_without_capabilities() {
        PlainEdge::register();
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g")
                .id("e_1")
                .class("edge")
                .attr(crate::dom::TYPE_ATTRIBUTE, "edge")
                .attr(crate::dom::EDGE_SOURCE_ATTRIBUTE, "a")
                .attr(crate::dom::EDGE_TARGET_ATTRIBUTE, "b"),
        );
        let app = test_app(&dom).await;
        let edge: PlainEdge = app
            .graph()
            .get_element(Selector::id("e_1"))
            .await
            .unwrap();
        assert_eq!(edge.source_id().await.unwrap(), "a");
        assert_eq!(edge.target_id().await.unwrap(), "b");
    }
}
