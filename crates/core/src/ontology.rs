//! Ontology tag types for annotations and relations
//!
//! Classes and properties are extracted from an uploaded ontology by the
//! backend and referenced by value inside annotations and relations. Domain
//! and range constraints on properties are advisory: the UI asks for
//! confirmation before connecting incompatible classes, it never refuses.

use serde::{Deserialize, Serialize};

/// A tag type assignable to an annotation
///
/// Sourced from an uploaded ontology. The `id` is assigned by the backend
/// and is only stable for the lifetime of the uploaded ontology, which is
/// why compatibility checks use the `iri` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntoClass {
    pub id: String,

    /// Display text shown to the user
    pub text: String,

    /// IRI of the ontology this class was extracted from
    pub base_iri: String,

    /// Full IRI of the class, used for domain/range checks
    pub iri: String,

    /// Label as extracted from the ontology source
    pub label: String,

    /// Render color for bounding boxes tagged with this class
    pub color: String,
}

/// A relation type connecting two annotations
///
/// `domain` and `range` hold full class IRIs. An empty list means the
/// property is unconstrained on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntoProperty {
    pub id: String,

    /// Display text shown to the user
    pub text: String,

    /// IRI of the ontology this property was extracted from
    pub base_iri: String,

    /// Full IRI of the property
    pub iri: String,

    /// Label as extracted from the ontology source
    pub label: String,

    /// Class IRIs allowed as relation source (empty = unconstrained)
    pub domain: Vec<String>,

    /// Class IRIs allowed as relation target (empty = unconstrained)
    pub range: Vec<String>,
}

impl OntoProperty {
    /// Check whether this property may connect `source` to `target`
    ///
    /// Compatible iff each constrained side contains the respective class
    /// IRI. An empty domain or range accepts any class on that side.
    pub fn is_compatible(&self, source: &OntoClass, target: &OntoClass) -> bool {
        let domain_holds = self.domain.iter().any(|iri| iri == &source.iri);
        let range_holds = self.range.iter().any(|iri| iri == &target.iri);

        (domain_holds && range_holds)
            || (domain_holds && self.range.is_empty())
            || (self.domain.is_empty() && range_holds)
            || (self.domain.is_empty() && self.range.is_empty())
    }
}

/// Filter the properties that may connect `source` to `target`
///
/// Used to populate the property picker when editing an existing relation.
pub fn compatible_properties<'a>(
    properties: &'a [OntoProperty],
    source: &OntoClass,
    target: &OntoClass,
) -> Vec<&'a OntoProperty> {
    properties
        .iter()
        .filter(|p| p.is_compatible(source, target))
        .collect()
}
