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

//! One enumeration step: resolve every wildcard of a single property.
//!
//! Each admissible value is assigned in list order, checked against the
//! encoding rules and then the spec rules that read the property, and kept
//! only if nothing is violated. The model is restored before returning, so
//! callers may reuse it.

use crate::config::QueryConfig;
use crate::constraint::{check_encoding, check_spec};
use crate::error::Result;
use crate::model::SpecQueryModel;
use crate::property::Property;
use crate::schema::Schema;
use crate::wildcard::PropertyValue;

/// Expands `property` on `model`, appending every surviving candidate to `answer_set`.
pub fn enumerate(
    property: Property,
    model: &mut SpecQueryModel,
    schema: &dyn Schema,
    config: &QueryConfig,
    answer_set: &mut Vec<SpecQueryModel>,
) -> Result<()> {
    if property == Property::Mark {
        return enumerate_mark(model, schema, config, answer_set);
    }
    let indices = model.wildcard_index().encoding_indices(property).to_vec();
    enumerate_encodings(0, &indices, property, model, schema, config, answer_set)
}
fn enumerate_mark(
    model: &mut SpecQueryModel,
    schema: &dyn Schema,
    config: &QueryConfig,
    answer_set: &mut Vec<SpecQueryModel>,
) -> Result<()> {
    let marks = match &model.wildcard_index().mark {
        Some(wildcard) => wildcard.values.clone().unwrap_or_default(),
        None => {
            answer_set.push(model.clone());
            return Ok(());
        }
    };
    for mark in marks {
        model.set_mark(mark)?;
        if check_spec(Property::Mark, model, schema, config)?.is_none() {
            answer_set.push(model.clone());
        }
    }
    model.reset_mark();
    Ok(())
}
fn enumerate_encodings(
    job: usize,
    indices: &[usize],
    property: Property,
    model: &mut SpecQueryModel,
    schema: &dyn Schema,
    config: &QueryConfig,
    answer_set: &mut Vec<SpecQueryModel>,
) -> Result<()> {
    let Some(&index) = indices.get(job) else {
        answer_set.push(model.clone());
        return Ok(());
    };
    // A nested slot whose parent was switched off is no longer open, and a
    // disabled auto count is dropped from the output anyway.
    let open = model.encoding(index).is_some_and(|enc| {
        !enc.is_value() && !enc.is_disabled_auto_count() && enc.is_wildcard(property)
    });
    if !open {
        return enumerate_encodings(job + 1, indices, property, model, schema, config, answer_set);
    }
    let values: Vec<PropertyValue> = model
        .wildcard_index()
        .encoding_wildcard(index, property)
        .and_then(|w| w.values.clone())
        .unwrap_or_default();
    for value in &values {
        model.set_encoding_property(index, property, value)?;
        if check_encoding(property, model, index, schema, config)?.is_some() {
            continue;
        }
        if check_spec(property, model, schema, config)?.is_some() {
            continue;
        }
        enumerate_encodings(job + 1, indices, property, model, schema, config, answer_set)?;
    }
    model.reset_encoding_property(index, property)?;
    Ok(())
}
