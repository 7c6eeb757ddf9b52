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

#![allow(dead_code)]

use compass::vocabulary::PrimitiveType;
use compass::{FieldSchema, FieldType, QueryConfig, SpecQuery, SpecQueryModel, TableSchema};

/// Q, Q1, Q2 continuous; O, N, N20 categorical; T temporal.
pub fn schema() -> TableSchema {
    TableSchema::new(vec![
        FieldSchema::new("Q", FieldType::Quantitative, PrimitiveType::Number, 100),
        FieldSchema::new("Q1", FieldType::Quantitative, PrimitiveType::Number, 100),
        FieldSchema::new("Q2", FieldType::Quantitative, PrimitiveType::Number, 100),
        FieldSchema::new("O", FieldType::Ordinal, PrimitiveType::String, 6),
        FieldSchema::new("O_100", FieldType::Ordinal, PrimitiveType::String, 100),
        FieldSchema::new("N", FieldType::Nominal, PrimitiveType::String, 7),
        FieldSchema::new("N20", FieldType::Nominal, PrimitiveType::String, 20),
        FieldSchema::new("T", FieldType::Temporal, PrimitiveType::Date, 100),
    ])
    .expect("fixture schema")
}
pub fn model(shorthand: &str) -> SpecQueryModel {
    model_with(shorthand, &QueryConfig::default())
}
pub fn model_with(shorthand: &str, config: &QueryConfig) -> SpecQueryModel {
    let query: SpecQuery = compass::shorthand::parse(shorthand).expect("shorthand parses");
    SpecQueryModel::build(&query, &schema(), config).expect("model builds")
}
pub fn shorthands(models: &[SpecQueryModel]) -> Vec<String> {
    models.iter().map(SpecQueryModel::to_shorthand).collect()
}
