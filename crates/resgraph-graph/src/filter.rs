//! Equality filters built from request key/value pairs.
//!
//! A [`NodeFilter`] is a conjunction of `property = literal` constraints.
//! When rendered for Cypher, property names are quoted identifiers and the
//! literals travel as bound parameters, so no value ever becomes query text.

use crate::query::{quote_identifier, QueryParam};
use resgraph_core::{Properties, PropertyValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityConstraint {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeFilter {
    constraints: Vec<EqualityConstraint>,
}

/// Cypher form of a filter: a `WHERE` clause (empty when unconstrained) and
/// the parameters it references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedFilter {
    pub clause: String,
    pub params: Vec<(String, QueryParam)>,
}

impl NodeFilter {
    /// Matches every node.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds `k1 = v1 AND k2 = v2 AND ...` from the pairs, keeping their order.
    /// Repeated keys are kept; each occurrence is its own constraint.
    pub fn equality<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            constraints: pairs
                .into_iter()
                .map(|(key, value)| EqualityConstraint {
                    key: key.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    pub fn and(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.constraints.push(EqualityConstraint {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn constraints(&self) -> &[EqualityConstraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Render against node variable `variable`. Parameters are named `f0`, `f1`, ...
    pub fn render(&self, variable: &str) -> RenderedFilter {
        if self.constraints.is_empty() {
            return RenderedFilter::default();
        }

        let mut conditions = Vec::with_capacity(self.constraints.len());
        let mut params = Vec::with_capacity(self.constraints.len());
        for (i, constraint) in self.constraints.iter().enumerate() {
            let name = format!("f{i}");
            conditions.push(format!(
                "{}.{} = ${}",
                variable,
                quote_identifier(&constraint.key),
                name
            ));
            params.push((name, QueryParam::Str(constraint.value.clone())));
        }

        RenderedFilter {
            clause: format!("WHERE {}", conditions.join(" AND ")),
            params,
        }
    }

    /// Evaluate against a property map. Literals only equal string properties,
    /// the same comparison the store performs on the bound string parameter.
    pub fn matches(&self, properties: &Properties) -> bool {
        self.constraints.iter().all(|c| {
            matches!(properties.get(&c.key), Some(PropertyValue::String(s)) if *s == c.value)
        })
    }
}

/// Shorthand for [`NodeFilter::equality`].
pub fn build_equality_filter<I, K, V>(pairs: I) -> NodeFilter
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    NodeFilter::equality(pairs)
}
