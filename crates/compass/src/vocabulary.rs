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

//! Closed vocabulary of marks, channels, types and scale kinds, together with
//! the compatibility tables the constraint engine consults.

use crate::error::VocabularyError;
use serde::{Deserialize, Serialize};

/// Declares a string-backed enum with `ALL`, `as_str`, `Display`, `FromStr`
/// and serde support keyed by the given text.
macro_rules! vocabulary_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
        impl std::str::FromStr for $name {
            type Err = VocabularyError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(VocabularyError::Unknown {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}
pub(crate) use vocabulary_enum;

vocabulary_enum!(
    /// Geometric primitive used to draw each row or group.
    Mark, "mark" {
        Point => "point",
        Bar => "bar",
        Line => "line",
        Area => "area",
        Tick => "tick",
        Text => "text",
        Circle => "circle",
        Square => "square",
        Rule => "rule",
        Rect => "rect",
        Geoshape => "geoshape",
    }
);
vocabulary_enum!(
    /// Visual dimension a field can be mapped to.
    Channel, "channel" {
        X => "x",
        Y => "y",
        Row => "row",
        Column => "column",
        Size => "size",
        Color => "color",
        Shape => "shape",
        Detail => "detail",
        Text => "text",
        Opacity => "opacity",
    }
);
vocabulary_enum!(
    FieldType, "type" {
        Nominal => "nominal",
        Ordinal => "ordinal",
        Quantitative => "quantitative",
        Temporal => "temporal",
    }
);
vocabulary_enum!(
    AggregateOp, "aggregate op" {
        Count => "count",
        Valid => "valid",
        Missing => "missing",
        Distinct => "distinct",
        Sum => "sum",
        Mean => "mean",
        Average => "average",
        Variance => "variance",
        Variancep => "variancep",
        Stdev => "stdev",
        Stdevp => "stdevp",
        Median => "median",
        Q1 => "q1",
        Q3 => "q3",
        Modeskew => "modeskew",
        Min => "min",
        Max => "max",
        Argmin => "argmin",
        Argmax => "argmax",
        Values => "values",
    }
);
vocabulary_enum!(
    TimeUnit, "time unit" {
        Year => "year",
        Quarter => "quarter",
        Month => "month",
        Day => "day",
        Date => "date",
        Hours => "hours",
        Minutes => "minutes",
        Seconds => "seconds",
        Milliseconds => "milliseconds",
        YearMonth => "yearmonth",
        YearMonthDate => "yearmonthdate",
        MonthDate => "monthdate",
        HoursMinutes => "hoursminutes",
    }
);
vocabulary_enum!(
    ScaleType, "scale type" {
        Linear => "linear",
        Log => "log",
        Pow => "pow",
        Sqrt => "sqrt",
        Time => "time",
        Utc => "utc",
        Sequential => "sequential",
        Quantile => "quantile",
        Quantize => "quantize",
        Ordinal => "ordinal",
        Point => "point",
        Band => "band",
        BinLinear => "bin-linear",
        BinOrdinal => "bin-ordinal",
    }
);
vocabulary_enum!(
    SortOrder, "sort order" {
        Ascending => "ascending",
        Descending => "descending",
    }
);
vocabulary_enum!(
    /// Storage type reported by the schema, independent of the encoding type.
    PrimitiveType, "primitive type" {
        String => "string",
        Number => "number",
        Integer => "integer",
        Boolean => "boolean",
        Date => "date",
    }
);
vocabulary_enum!(
    /// Scale sub-properties that may appear inside a scale query.
    ScaleProperty, "scale property" {
        Type => "type",
        Domain => "domain",
        Range => "range",
        Clamp => "clamp",
        Nice => "nice",
        Round => "round",
        Exponent => "exponent",
        Zero => "zero",
        UseRawDomain => "useRawDomain",
        BandSize => "bandSize",
    }
);
pub const STACK_GROUP_CHANNELS: [Channel; 5] = [
    Channel::Color,
    Channel::Opacity,
    Channel::Size,
    Channel::Shape,
    Channel::Detail,
];
pub const NONSPATIAL_CHANNELS: [Channel; 6] = [
    Channel::Size,
    Channel::Color,
    Channel::Shape,
    Channel::Detail,
    Channel::Text,
    Channel::Opacity,
];
impl Mark {
    pub fn is_stackable(&self) -> bool {
        matches!(self, Mark::Bar | Mark::Area)
    }
}
impl Channel {
    pub fn supports_mark(&self, mark: Mark) -> bool {
        match self {
            Channel::Size => matches!(
                mark,
                Mark::Point
                    | Mark::Tick
                    | Mark::Rule
                    | Mark::Circle
                    | Mark::Square
                    | Mark::Bar
                    | Mark::Text
                    | Mark::Line
            ),
            Channel::Shape => mark == Mark::Point,
            Channel::Text => mark == Mark::Text,
            _ => true,
        }
    }
    /// Whether a measure may be mapped to this channel. Every channel accepts dimensions.
    pub fn supports_measure(&self) -> bool {
        !matches!(
            self,
            Channel::Row | Channel::Column | Channel::Shape | Channel::Detail
        )
    }
    pub fn is_positional(&self) -> bool {
        matches!(self, Channel::X | Channel::Y)
    }
    pub fn is_facet(&self) -> bool {
        matches!(self, Channel::Row | Channel::Column)
    }
    pub fn is_stack_group(&self) -> bool {
        STACK_GROUP_CHANNELS.contains(self)
    }
    pub fn supports_scale(&self) -> bool {
        !matches!(
            self,
            Channel::Row | Channel::Column | Channel::Detail | Channel::Text
        )
    }
    pub fn supports_axis(&self) -> bool {
        matches!(self, Channel::X | Channel::Y | Channel::Row | Channel::Column)
    }
    pub fn supports_legend(&self) -> bool {
        matches!(
            self,
            Channel::Color | Channel::Opacity | Channel::Size | Channel::Shape
        )
    }
    pub fn supports_scale_property(&self, property: ScaleProperty) -> bool {
        match property {
            ScaleProperty::Range => !self.is_positional(),
            ScaleProperty::BandSize => self.is_positional(),
            ScaleProperty::Zero => matches!(self, Channel::X | Channel::Y | Channel::Size),
            _ => true,
        }
    }
}
impl FieldType {
    pub fn letter(&self) -> char {
        match self {
            FieldType::Nominal => 'n',
            FieldType::Ordinal => 'o',
            FieldType::Quantitative => 'q',
            FieldType::Temporal => 't',
        }
    }
    pub fn from_letter(letter: &str) -> Option<FieldType> {
        match letter.to_ascii_lowercase().as_str() {
            "n" => Some(FieldType::Nominal),
            "o" => Some(FieldType::Ordinal),
            "q" => Some(FieldType::Quantitative),
            "t" => Some(FieldType::Temporal),
            _ => None,
        }
    }
    pub fn is_discrete(&self) -> bool {
        matches!(self, FieldType::Nominal | FieldType::Ordinal)
    }
}
impl AggregateOp {
    /// Operations whose results can be summed, which makes them legal for stacking.
    pub fn is_sum_op(&self) -> bool {
        matches!(
            self,
            AggregateOp::Count
                | AggregateOp::Valid
                | AggregateOp::Missing
                | AggregateOp::Distinct
                | AggregateOp::Sum
        )
    }
}
impl TimeUnit {
    pub fn is_discrete_by_default(&self) -> bool {
        matches!(
            self,
            TimeUnit::Quarter
                | TimeUnit::Month
                | TimeUnit::Day
                | TimeUnit::Date
                | TimeUnit::Hours
                | TimeUnit::Minutes
                | TimeUnit::Seconds
                | TimeUnit::Milliseconds
        )
    }
    /// Size of the domain for cyclic units; `None` for units whose domain depends on the data.
    pub fn fixed_cardinality(&self) -> Option<u32> {
        match self {
            TimeUnit::Seconds | TimeUnit::Minutes => Some(60),
            TimeUnit::Hours => Some(24),
            TimeUnit::Day => Some(7),
            TimeUnit::Date => Some(31),
            TimeUnit::Month => Some(12),
            TimeUnit::Quarter => Some(4),
            TimeUnit::Milliseconds => Some(1000),
            _ => None,
        }
    }
}
impl ScaleType {
    pub fn has_discrete_domain(&self) -> bool {
        matches!(
            self,
            ScaleType::Ordinal | ScaleType::Point | ScaleType::Band | ScaleType::BinOrdinal
        )
    }
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            ScaleType::Linear
                | ScaleType::Log
                | ScaleType::Pow
                | ScaleType::Sqrt
                | ScaleType::Time
                | ScaleType::Utc
                | ScaleType::Sequential
                | ScaleType::BinLinear
        )
    }
    pub fn supports_property(&self, property: ScaleProperty) -> bool {
        match property {
            ScaleProperty::Type | ScaleProperty::Domain | ScaleProperty::Range => true,
            ScaleProperty::Clamp | ScaleProperty::UseRawDomain => self.is_continuous(),
            ScaleProperty::Nice => self.is_continuous() && *self != ScaleType::BinLinear,
            ScaleProperty::Round => {
                self.is_continuous() || matches!(self, ScaleType::Point | ScaleType::Band)
            }
            ScaleProperty::Exponent => *self == ScaleType::Pow,
            ScaleProperty::Zero => matches!(
                self,
                ScaleType::Linear | ScaleType::Pow | ScaleType::Sqrt | ScaleType::Sequential
            ),
            ScaleProperty::BandSize => {
                matches!(self, ScaleType::Ordinal | ScaleType::Point | ScaleType::Band)
            }
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_shape_only_on_point() {
        assert!(Channel::Shape.supports_mark(Mark::Point));
        assert!(!Channel::Shape.supports_mark(Mark::Bar));
        assert!(!Channel::Text.supports_mark(Mark::Point));
        assert!(Channel::Color.supports_mark(Mark::Rect));
    }
    #[test]
    fn test_vocabulary_parsing() {
        assert_eq!("bin-linear".parse::<ScaleType>(), Ok(ScaleType::BinLinear));
        assert_eq!("hours".parse::<TimeUnit>(), Ok(TimeUnit::Hours));
        assert!("sparkline".parse::<Mark>().is_err());
        assert_eq!(FieldType::from_letter("Q"), Some(FieldType::Quantitative));
    }
}
