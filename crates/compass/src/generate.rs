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

use crate::config::QueryConfig;
use crate::config_error;
use crate::enumerator::enumerate;
use crate::error::Result;
use crate::logging::{log_enumeration_step, log_performance_metric};
use crate::model::SpecQueryModel;
use crate::property::Property;
use crate::query::SpecQuery;
use crate::schema::Schema;
use crate::stylize::stylize;
use std::time::Instant;
use tracing::{debug, instrument};

/// Expands every wildcard of `query`, one property at a time in precedence order.
#[instrument(level = "debug", skip_all, fields(encodings = query.encodings.len()))]
pub fn generate(query: &SpecQuery, schema: &dyn Schema, config: &QueryConfig) -> Result<Vec<SpecQueryModel>> {
    let start = Instant::now();
    let model = SpecQueryModel::build(query, schema, config)?;
    let steps: Vec<Property> = config
        .property_precedence
        .iter()
        .copied()
        .filter(|p| model.wildcard_index().has_property(*p))
        .collect();
    if let Some(skipped) = Property::ALL
        .iter()
        .find(|p| model.wildcard_index().has_property(**p) && !steps.contains(*p))
    {
        return Err(config_error!("propertyPrecedence", "leaves '{skipped}' unresolved").into());
    }
    debug!(steps = steps.len(), "Generating candidates");
    let mut answer_set = vec![model];
    for property in steps {
        let input = answer_set.len();
        let mut next = Vec::new();
        for mut model in answer_set {
            enumerate(property, &mut model, schema, config, &mut next)?;
        }
        log_enumeration_step(property, input, next.len());
        answer_set = next;
        if answer_set.is_empty() {
            break;
        }
    }
    if config.stylize {
        answer_set = stylize(answer_set, schema, config)?;
    }
    log_performance_metric("generate", start.elapsed().as_secs_f64() * 1000.0, "ms");
    Ok(answer_set)
}
