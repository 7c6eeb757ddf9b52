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


use compass::error::{utils, ErrorSeverity};
use compass::{shorthand, CompassError, ErrorReporter};

#[test]
fn test_shorthand_errors_are_recoverable_warnings() {
    let err: CompassError = shorthand::parse("point|x").expect_err("no channel").into();
    assert_eq!(err.category(), "Shorthand");
    assert!(err.is_recoverable());
    assert_eq!(utils::error_severity(&err), ErrorSeverity::Warning);
    assert!(err.suggestions()[0].contains("mark|channel"));
}
#[test]
fn test_unsupported_combination_is_critical() {
    let err = utils::unsupported_combination("hasAllRequiredChannelsForMark", "rect");
    assert!(!err.is_recoverable());
    assert_eq!(utils::error_severity(&err), ErrorSeverity::Critical);
    assert_eq!(err.user_message(), "Mark 'rect' is not supported by the recommendation rules.");
}
#[test]
fn test_constructor_helpers() {
    assert_eq!(utils::field_not_found("price").category(), "Schema");
    assert!(utils::duplicate_wildcard("f0").to_string().contains("'f0'"));
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let wrapped = utils::wrap_error(io, "loading schema");
    assert_eq!(wrapped.category(), "Configuration");
    assert!(wrapped.to_string().contains("loading schema: gone"));
}
#[test]
fn test_reporter_renders_severity_and_suggestions() {
    let err = utils::field_not_found("price");
    let plain = ErrorReporter::plain().report(&err);
    assert!(plain.starts_with("[ERROR]"), "{plain}");
    assert!(plain.contains("(Schema)"));
    assert!(plain.contains("Suggestions:"));
    assert!(!plain.contains('\x1b'));
    let colored = ErrorReporter::new().report(&err);
    assert!(colored.starts_with(ErrorSeverity::Error.color_code()));
    assert!(ErrorSeverity::Critical > ErrorSeverity::Warning);
}
