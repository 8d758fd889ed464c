//! The graph: query root and element factory.
//!
//! Every wrapper handed out by the graph has been validated against the
//! live document: the query resolved to exactly one element, the element
//! carries an id, and (unless an internal re-validation path skips it) its
//! type attribute matches the wrapper's registered metadata. Singular
//! queries never return a "maybe": ambiguity and absence are both hard
//! failures carrying the search criteria.

use std::ops::Deref;

use crate::app::DiagramApp;
use crate::dom;
use crate::element::Locateable;
use crate::locator::Locator;
use crate::metadata::Metadata;
use crate::model::{DiagramElement, Edge, EdgeSearch, Node};
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;

/// Whether element construction verifies the type attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeCheck {
    /// Verify the live type attribute against the wrapper's metadata
    Verify,
    /// Skip verification (internal idempotent re-validation paths only)
    Skip,
}

/// The root query surface over a live diagram
#[derive(Debug, Clone)]
pub struct Graph {
    locator: Locator,
}

impl Graph {
    pub(crate) fn new(locator: Locator) -> Self {
        Self { locator }
    }

    /// The graph's root locator
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// The owning application handle
    #[must_use]
    pub fn app(&self) -> &DiagramApp {
        self.locator.app()
    }

    /// Click the canvas to give the diagram keyboard focus
    pub async fn focus(&self) -> TrazarResult<()> {
        self.locator.click().await
    }

    /// Resolve a single element of the given wrapper type by selector.
    ///
    /// Fails on zero or multiple matches, on a missing id, and on a type
    /// attribute that differs from the wrapper's registered type.
    pub async fn get_element<T: DiagramElement>(
        &self,
        query: impl Into<Selector>,
    ) -> TrazarResult<T> {
        self.locate_single(query.into(), TypeCheck::Verify).await
    }

    /// Resolve a single element without the type assertion.
    ///
    /// Internal escape hatch for idempotent re-validation paths where the
    /// query itself already encodes the type.
    pub(crate) async fn element_unchecked<T: DiagramElement>(
        &self,
        query: Selector,
    ) -> TrazarResult<T> {
        self.locate_single(query, TypeCheck::Skip).await
    }

    async fn locate_single<T: DiagramElement>(
        &self,
        query: Selector,
        check: TypeCheck,
    ) -> TrazarResult<T> {
        let metadata = Metadata::assert::<T>()?;
        let broad = self.locator.child(query.clone());
        let ids = broad.ids().await?;
        if ids.len() != 1 {
            return Err(TrazarError::Cardinality {
                expected: "exactly one",
                found: ids.len(),
                criteria: query.summary(),
            });
        }
        let id = ids
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| TrazarError::MissingAttribute {
                attribute: "id".to_string(),
                selector: query.summary(),
            })?;

        // pin the discovered id so later operations survive re-renders of
        // sibling elements
        let pinned = broad.override_query(Selector::id(id));
        if check == TypeCheck::Verify {
            let actual = pinned.attribute(dom::TYPE_ATTRIBUTE).await?.ok_or_else(|| {
                TrazarError::MissingAttribute {
                    attribute: dom::TYPE_ATTRIBUTE.to_string(),
                    selector: pinned.resolve().summary(),
                }
            })?;
            if actual != metadata.element_type {
                return Err(TrazarError::TypeMismatch {
                    expected: metadata.element_type,
                    actual,
                    selector: pinned.resolve().summary(),
                });
            }
        }
        Ok(T::from_locator(self, pinned))
    }

    /// Construct a wrapper over an id that was just read from the live
    /// document (the enclosing query already guaranteed its type)
    pub(crate) fn adopt_by_id<T: DiagramElement>(&self, id: &str) -> T {
        T::from_locator(self, self.locator.child(Selector::id(id)))
    }

    /// Ids of all settled (non-ghost) elements of the wrapper's type
    pub(crate) async fn settled_ids<T: DiagramElement>(&self) -> TrazarResult<Vec<String>> {
        let selector = Metadata::settled_type_selector::<T>()?;
        let ids = self.locator.child(selector.clone()).ids().await?;
        ids.into_iter()
            .map(|id| {
                id.ok_or_else(|| TrazarError::MissingAttribute {
                    attribute: "id".to_string(),
                    selector: selector.summary(),
                })
            })
            .collect()
    }

    /// All settled elements of the given wrapper type
    pub async fn get_elements_of_type<T: DiagramElement>(&self) -> TrazarResult<Vec<T>> {
        let ids = self.settled_ids::<T>().await?;
        Ok(ids.iter().map(|id| self.adopt_by_id::<T>(id)).collect())
    }

    /// All settled nodes of the given wrapper type
    pub async fn get_nodes_of_type<T>(&self) -> TrazarResult<Vec<T>>
    where
        T: DiagramElement + Deref<Target = Node>,
    {
        self.get_elements_of_type::<T>().await
    }

    /// All settled edges of the given wrapper type
    pub async fn get_edges_of_type<E>(&self) -> TrazarResult<Vec<E>>
    where
        E: DiagramElement + Deref<Target = Edge>,
    {
        self.get_elements_of_type::<E>().await
    }

    /// Resolve the single node of the given type whose label reads exactly
    /// `label`.
    ///
    /// Queries broadly (contains-text, which over-matches), then filters
    /// against the actual computed label. Zero or multiple survivors fail
    /// with the search criteria.
    pub async fn get_node_by_label<T>(&self, label: &str) -> TrazarResult<T>
    where
        T: DiagramElement + Deref<Target = Node>,
    {
        let metadata = Metadata::assert::<T>()?;
        let broad = Selector::type_attr(metadata.element_type.clone())
            .not_ghost()
            .with_text(label);
        let ids = self.locator.child(broad.clone()).ids().await?;

        let mut survivors = Vec::new();
        for id in ids {
            let id = id.ok_or_else(|| TrazarError::MissingAttribute {
                attribute: "id".to_string(),
                selector: broad.summary(),
            })?;
            let candidate: T = self.element_unchecked(Selector::id(id.as_str())).await?;
            if candidate.label().await? == label {
                survivors.push(candidate);
            }
        }

        if survivors.len() == 1 {
            return Ok(survivors.remove(0));
        }
        Err(TrazarError::Cardinality {
            expected: "exactly one",
            found: survivors.len(),
            criteria: format!(
                "node of type `{}` with label \"{label}\"",
                metadata.element_type
            ),
        })
    }

    /// All edges of the given wrapper type passing every populated filter
    /// of the search
    pub async fn get_edges_matching<E>(&self, search: &EdgeSearch) -> TrazarResult<Vec<E>>
    where
        E: DiagramElement + Deref<Target = Edge>,
    {
        let candidates = self.get_elements_of_type::<E>().await?;
        let mut out = Vec::new();
        for edge in candidates {
            if self.edge_matches(&edge, search).await? {
                out.push(edge);
            }
        }
        Ok(out)
    }

    /// Resolve the single edge of the given type between two live elements
    pub async fn get_edge_between<E, S, T>(&self, source: &S, target: &T) -> TrazarResult<E>
    where
        E: DiagramElement + Deref<Target = Edge>,
        S: Locateable,
        T: Locateable,
    {
        let search = EdgeSearch::new().with_source(source).with_target(target);
        let mut found = self.get_edges_matching::<E>(&search).await?;
        if found.len() == 1 {
            return Ok(found.remove(0));
        }
        Err(TrazarError::Cardinality {
            expected: "exactly one",
            found: found.len(),
            criteria: format!(
                "edge of type `{}` with {}",
                Metadata::get_type::<E>()?,
                search.describe()
            ),
        })
    }

    /// All currently-selected elements of the given wrapper type
    pub async fn get_selected_elements<T: DiagramElement>(&self) -> TrazarResult<Vec<T>> {
        let selector =
            Metadata::type_selector::<T>()?.and(Selector::has_class(dom::SELECTED_CLASS));
        let ids = self.locator.child(selector.clone()).ids().await?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.ok_or_else(|| TrazarError::MissingAttribute {
                attribute: "id".to_string(),
                selector: selector.summary(),
            })?;
            out.push(self.adopt_by_id::<T>(&id));
        }
        Ok(out)
    }

    async fn edge_matches(&self, edge: &Edge, search: &EdgeSearch) -> TrazarResult<bool> {
        let source_ref = edge.source_id().await?;
        let target_ref = edge.target_id().await?;

        if let Some(locator) = &search.source {
            if !require_id(locator).await?.ends_with(&source_ref) {
                return Ok(false);
            }
        }
        if let Some(dom_id) = &search.source_id {
            if !dom_id.ends_with(&source_ref) {
                return Ok(false);
            }
        }
        if let Some(expected) = &search.source_type {
            if self.type_of_id_suffix(&source_ref).await? != *expected {
                return Ok(false);
            }
        }
        if let Some(locator) = &search.target {
            if !require_id(locator).await?.ends_with(&target_ref) {
                return Ok(false);
            }
        }
        if let Some(dom_id) = &search.target_id {
            if !dom_id.ends_with(&target_ref) {
                return Ok(false);
            }
        }
        if let Some(expected) = &search.target_type {
            if self.type_of_id_suffix(&target_ref).await? != *expected {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn type_of_id_suffix(&self, suffix: &str) -> TrazarResult<String> {
        let locator = self.locator.child(Selector::id_suffix(suffix));
        locator
            .attribute(dom::TYPE_ATTRIBUTE)
            .await?
            .ok_or_else(|| TrazarError::MissingAttribute {
                attribute: dom::TYPE_ATTRIBUTE.to_string(),
                selector: locator.resolve().summary(),
            })
    }

    /// Resolve the single element whose id ends with `suffix` AND whose
    /// type matches the wrapper, then re-validate type equality
    pub(crate) async fn typed_element_by_id_suffix<T: DiagramElement>(
        &self,
        suffix: &str,
    ) -> TrazarResult<T> {
        let metadata = Metadata::assert::<T>()?;
        let query =
            Selector::id_suffix(suffix).and(Selector::type_attr(metadata.element_type));
        self.locate_single(query, TypeCheck::Verify).await
    }
}

async fn require_id(locator: &Locator) -> TrazarResult<String> {
    locator
        .attribute("id")
        .await?
        .ok_or_else(|| TrazarError::MissingAttribute {
            attribute: "id".to_string(),
            selector: locator.resolve().summary(),
        })
}
