// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Design rules that prune candidates during enumeration.
//!
//! Every rule declares the properties it reads. A rule runs when it is strict
//! or switched on in [`QueryConfig`]; a rule that may not see wildcards is
//! skipped until all of its properties are resolved.

pub mod field;
pub mod spec;

use crate::config::QueryConfig;
use crate::error::ConstraintResult;
use crate::logging::log_constraint_violation;
use crate::model::{EncodingWildcards, SpecQueryModel};
use crate::property::Property;
use crate::query::EncodingQuery;
use crate::schema::Schema;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub use field::{check_encoding, ENCODING_CONSTRAINTS, ENCODING_CONSTRAINTS_BY_PROPERTY};
pub use spec::{check_spec, SPEC_CONSTRAINTS, SPEC_CONSTRAINTS_BY_PROPERTY};

pub type SpecPredicate = fn(&SpecQueryModel, &dyn Schema, &QueryConfig) -> ConstraintResult<bool>;
pub type EncodingPredicate =
    fn(&EncodingQuery, &EncodingWildcards, &dyn Schema, &QueryConfig) -> ConstraintResult<bool>;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintFamily {
    Spec,
    Encoding,
}
impl ConstraintFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintFamily::Spec => "spec",
            ConstraintFamily::Encoding => "encoding",
        }
    }
}
pub struct Constraint<P> {
    pub name: &'static str,
    pub description: &'static str,
    pub properties: &'static [Property],
    /// Whether the rule may run while some of `properties` are still open.
    pub allow_wildcard_for_properties: bool,
    pub strict: bool,
    pub satisfy: P,
}
pub type SpecConstraint = Constraint<SpecPredicate>;
pub type EncodingConstraint = Constraint<EncodingPredicate>;
impl<P> Constraint<P> {
    pub fn is_active(&self, config: &QueryConfig) -> bool {
        self.strict || config.is_enabled(self.name)
    }
}
impl<P> std::fmt::Debug for Constraint<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("allow_wildcard_for_properties", &self.allow_wildcard_for_properties)
            .field("strict", &self.strict)
            .finish()
    }
}
pub(crate) fn index_by_property<P>(
    constraints: &'static [Constraint<P>],
) -> HashMap<Property, Vec<&'static Constraint<P>>> {
    let mut index: HashMap<Property, Vec<&'static Constraint<P>>> = HashMap::new();
    for constraint in constraints {
        for property in constraint.properties {
            index.entry(*property).or_default().push(constraint);
        }
    }
    index
}
pub(crate) fn report_violation(
    family: ConstraintFamily,
    name: &'static str,
    property: Property,
    model: &SpecQueryModel,
    config: &QueryConfig,
) -> Option<&'static str> {
    log_constraint_violation(family.as_str(), name, property, &model.to_shorthand(), config.verbose);
    Some(name)
}
/// Names of every rule, spec rules first.
pub static CONSTRAINT_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    SPEC_CONSTRAINTS
        .iter()
        .map(|c| c.name)
        .chain(ENCODING_CONSTRAINTS.iter().map(|c| c.name))
        .collect()
});
