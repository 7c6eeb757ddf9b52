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

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
#[derive(Parser, Debug)]
#[command(
    name = "compass-demo",
    version,
    about = "Recommend charts for a partial chart query against a dataset schema"
)]
pub struct Args {
    #[arg(long, conflicts_with = "shorthand", help = "Query file (JSON or YAML), either a full query or a bare spec")]
    pub query: Option<PathBuf>,
    #[arg(long, help = "Query written as shorthand, e.g. '?|x:?,q|y:count(*,q)'")]
    pub shorthand: Option<String>,
    #[arg(long, help = "Schema file (JSON or YAML)")]
    pub schema: PathBuf,
    #[arg(long, help = "Configuration file overriding the defaults")]
    pub config: Option<PathBuf>,
    #[arg(
        long = "group-by",
        help = "Grouping key per level: field, fieldTransform, encoding, transpose, spec or a comma separated property list"
    )]
    pub group_by: Vec<String>,
    #[arg(long, default_value_t = 10, help = "How many candidates or groups to print")]
    pub top: usize,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(long, default_value_t = false, help = "Log enumeration and pruning at debug level")]
    pub verbose: bool,
}
