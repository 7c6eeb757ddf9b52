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

use crate::property::Property;
use tracing::{debug, error, info, trace};
pub fn log_constraint_violation(family: &str, constraint: &str, property: Property, shorthand: &str, verbose: bool) {
    if verbose {
        debug!(
            family = family,
            constraint = constraint,
            property = %property,
            shorthand = shorthand,
            "Constraint violated"
        );
    } else {
        trace!(
            family = family,
            constraint = constraint,
            property = %property,
            shorthand = shorthand,
            "Constraint violated"
        );
    }
}
pub fn log_enumeration_step(property: Property, input: usize, output: usize) {
    debug!(
        property = %property,
        input = input,
        output = output,
        "Enumeration step"
    );
}
pub fn log_ranking(ranking: &str, candidates: usize, top_score: Option<f64>) {
    debug!(
        ranking = ranking,
        candidates = candidates,
        top_score = ?top_score,
        "Ranking applied"
    );
}
pub fn log_error(context: &str, error: &dyn std::error::Error) {
    error!(
        context = context,
        error = %error,
        "Recommendation error"
    );
}
pub fn log_performance_metric(metric_name: &str, value: f64, unit: &str) {
    info!(
        metric = metric_name,
        value = value,
        unit = unit,
        "Performance metric"
    );
}
