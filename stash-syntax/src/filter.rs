use crate::{ComparisonOp, Field, FieldKind, Filter, Operator, ParseError, Value};
use jiff::{
    Timestamp,
    civil::{Date, DateTime},
    tz::TimeZone,
};

/// Checked in order; only the first match is stripped.
const EXCLUSION_PREFIXES: [&str; 6] = ["-", "!", "exclude:", "remove:", "negate:", "not:"];

const OPERATOR_GLYPHS: [char; 3] = ['<', '>', '='];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m-%d-%Y", "%m/%d/%Y", "%d-%m-%Y", "%d/%m/%Y", "%Y%m%d",
];

const KB: i64 = 1024;

/// Interprets one non-structural token as a filter leaf.
pub fn interpret(token: &str) -> Result<Filter, ParseError> {
    let (negated, core) = strip_negation(token);
    let Some((name, value)) = split_field(core) else {
        return Ok(Filter::tag(core, negated));
    };

    let field = Field::from_name(name);
    let (op, value) = match (&field, field.kind()) {
        (Field::FileSize, _) => {
            let (op, operand) = flexible_operator(value);
            (Operator::Compare(op), Value::Integer(parse_size(operand)?))
        }
        (Field::Duration, _) => {
            let (op, operand) = flexible_operator(value);
            let seconds = parse_float(operand)
                .ok_or_else(|| ParseError::InvalidDuration(operand.to_string()))?;
            (Operator::Compare(op), Value::Real(seconds))
        }
        (Field::AspectRatio, _) => {
            let (op, operand) = flexible_operator(value);
            let ratio = parse_float(operand)
                .ok_or_else(|| ParseError::InvalidAspectRatio(operand.to_string()))?;
            (Operator::Compare(op), Value::Real(ratio))
        }
        (_, Some(FieldKind::Date)) => {
            let (op, operand) = flexible_operator(value);
            (Operator::Compare(op), Value::Text(parse_date(operand)?))
        }
        (_, Some(FieldKind::Numeric)) => {
            let (op, operand) = flexible_operator(value);
            if operand.contains('*') {
                (Operator::Pattern, Value::Text(operand.to_string()))
            } else {
                let number = operand.trim().parse::<i64>().map_err(|_| {
                    ParseError::InvalidNumber {
                        field: field.column().to_string(),
                        value: operand.to_string(),
                    }
                })?;
                (Operator::Compare(op), Value::Integer(number))
            }
        }
        (Field::FileType, _) if !value.starts_with('.') && !value.starts_with('(') => (
            Operator::Compare(ComparisonOp::Eq),
            Value::Text(format!(".{value}")),
        ),
        _ => (
            Operator::Compare(ComparisonOp::Eq),
            Value::Text(value.to_string()),
        ),
    };

    Ok(Filter {
        field,
        value,
        op,
        negated,
    })
}

fn strip_negation(token: &str) -> (bool, &str) {
    EXCLUSION_PREFIXES
        .iter()
        .find_map(|prefix| token.strip_prefix(prefix))
        .map_or((false, token), |rest| (true, rest))
}

/// Splits `name:value` where the name is `[a-zA-Z_-]+` and the value is non-empty.
pub(crate) fn split_field(token: &str) -> Option<(&str, &str)> {
    let (name, value) = token.split_once(':')?;
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || matches!(c, '_' | '-'));
    if valid_name && !value.is_empty() {
        Some((name, value))
    } else {
        None
    }
}

/// Reads an operator glyph at either end of `value`.
///
/// A leading glyph is taken literally. A trailing glyph is read right to left,
/// so `10>` means "field < 10" and `5kb<` means "field > 5kb". Without a glyph
/// the comparison is equality.
pub fn flexible_operator(value: &str) -> (ComparisonOp, &str) {
    for glyph in ["<=", ">=", "<", ">", "="] {
        if let Some(rest) = value.strip_prefix(glyph) {
            if !rest.is_empty() {
                if let Some(op) = ComparisonOp::from_glyph(glyph) {
                    return (op, rest);
                }
            }
        }
    }

    // The shortest operand wins, so a two-character glyph is tried first.
    for glyph in ["<=", ">=", "<", ">", "="] {
        if let Some(rest) = value.strip_suffix(glyph) {
            if !rest.is_empty() {
                if let Some(op) = ComparisonOp::from_glyph(glyph) {
                    return (op.reversed(), rest);
                }
            }
        }
    }

    (ComparisonOp::Eq, value)
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Parses `1.5mb`, `500 kb`, `100` into whole bytes (fractions truncate).
pub fn parse_size(raw: &str) -> Result<i64, ParseError> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number_part, rest) = trimmed.split_at(split);
    let unit = rest.trim_start();

    if number_part.is_empty() || !unit.chars().all(|c| c.is_ascii_alphabetic()) {
        // Not `<number><unit>`; accept anything that still reads as a plain number.
        return match parse_float(trimmed) {
            Some(number) if number.is_finite() => Ok(number.trunc() as i64),
            _ => Err(ParseError::InvalidSize(raw.to_string())),
        };
    }

    let number: f64 = number_part
        .parse()
        .map_err(|_| ParseError::InvalidSize(raw.to_string()))?;
    let multiplier =
        size_unit_multiplier(unit).ok_or_else(|| ParseError::UnknownSizeUnit(unit.to_string()))?;
    Ok((number * multiplier as f64).trunc() as i64)
}

/// Bytes per unit; an empty unit means bytes.
pub fn size_unit_multiplier(unit: &str) -> Option<i64> {
    let normalized = unit.to_ascii_lowercase();
    let multiplier = match normalized.as_str() {
        "" | "b" | "byte" | "bytes" => 1,
        "kb" | "kilobyte" | "kilobytes" => KB,
        "mb" | "megabyte" | "megabytes" => KB.pow(2),
        "gb" | "gigabyte" | "gigabytes" => KB.pow(3),
        "tb" | "terabyte" | "terabytes" => KB.pow(4),
        _ => return None,
    };
    Some(multiplier)
}

/// Normalizes a date operand to `YYYY-MM-DD HH:MM:SS` (when a time was given)
/// or `YYYY-MM-DD`.
///
/// All-digit operands are Unix timestamps and are rendered in UTC.
pub fn parse_date(raw: &str) -> Result<String, ParseError> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        let seconds: i64 = raw
            .parse()
            .map_err(|_| ParseError::InvalidTimestamp(raw.to_string()))?;
        let timestamp = Timestamp::from_second(seconds)
            .map_err(|_| ParseError::InvalidTimestamp(raw.to_string()))?;
        return Ok(timestamp
            .to_zoned(TimeZone::UTC)
            .strftime("%Y-%m-%d %H:%M:%S")
            .to_string());
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = DateTime::strptime(format, raw) {
            return Ok(datetime.strftime("%Y-%m-%d %H:%M:%S").to_string());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = Date::strptime(format, raw) {
            return Ok(date.strftime("%Y-%m-%d").to_string());
        }
    }
    Err(ParseError::InvalidDate(raw.to_string()))
}

/// Whether `time` is the time of day of the date filter `token`, as in
/// `created_at:2023-11-14 22:13`.
///
/// The date must not carry a time yet and must not end in an operator glyph.
/// The time may carry a trailing glyph only when the date has no leading one,
/// so the joined value still has a glyph at one end at most.
pub(crate) fn continues_with_time(token: &str, time: &str) -> bool {
    let (_, core) = strip_negation(token);
    let Some((name, value)) = split_field(core) else {
        return false;
    };
    if Field::from_name(name).kind() != Some(FieldKind::Date) || value.ends_with(OPERATOR_GLYPHS) {
        return false;
    }
    if value.starts_with(OPERATOR_GLYPHS) && time.ends_with(OPERATOR_GLYPHS) {
        return false;
    }
    let (_, operand) = flexible_operator(value);
    !operand.contains(':')
        && !operand.bytes().all(|b| b.is_ascii_digit())
        && looks_like_time_of_day(time)
}

/// `22:13`, `22:13:20`, optionally followed by a trailing operator glyph.
fn looks_like_time_of_day(token: &str) -> bool {
    let time = token.trim_end_matches(OPERATOR_GLYPHS);
    let parts: Vec<&str> = time.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return false;
    }
    parts.iter().enumerate().all(|(idx, part)| {
        let len_ok = if idx == 0 {
            (1..=2).contains(&part.len())
        } else {
            part.len() == 2
        };
        len_ok && part.bytes().all(|b| b.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_tag() {
        let filter = interpret("long_hair").unwrap();
        assert_eq!(filter, Filter::tag("long_hair", false));
    }

    #[test]
    fn only_first_negation_prefix_is_stripped() {
        let filter = interpret("-!solo").unwrap();
        assert_eq!(filter, Filter::tag("!solo", true));

        let filter = interpret("not:solo").unwrap();
        assert_eq!(filter, Filter::tag("solo", true));
    }

    #[test]
    fn field_names_with_digits_are_tags() {
        let filter = interpret("2b:nier").unwrap();
        assert_eq!(filter, Filter::tag("2b:nier", false));
    }

    #[test]
    fn explicit_tag_field() {
        let filter = interpret("tag:smile").unwrap();
        assert_eq!(filter, Filter::tag("smile", false));
    }

    #[test]
    fn leading_operators() {
        assert_eq!(flexible_operator(">=5kb"), (ComparisonOp::Gte, "5kb"));
        assert_eq!(flexible_operator("<5"), (ComparisonOp::Lt, "5"));
        assert_eq!(flexible_operator("=5"), (ComparisonOp::Eq, "5"));
    }

    #[test]
    fn trailing_operators_are_reversed() {
        assert_eq!(flexible_operator("5kb<"), (ComparisonOp::Gt, "5kb"));
        assert_eq!(flexible_operator("10>"), (ComparisonOp::Lt, "10"));
        assert_eq!(flexible_operator("10>="), (ComparisonOp::Lte, "10"));
        assert_eq!(flexible_operator("10<="), (ComparisonOp::Gte, "10"));
        assert_eq!(flexible_operator("10="), (ComparisonOp::Eq, "10"));
    }

    #[test]
    fn lone_glyph_is_an_operand() {
        assert_eq!(flexible_operator(">"), (ComparisonOp::Eq, ">"));
        assert_eq!(flexible_operator("<="), (ComparisonOp::Lt, "="));
    }

    #[test]
    fn sizes() {
        assert_eq!(parse_size("1mb"), Ok(1_048_576));
        assert_eq!(parse_size("500kb"), Ok(512_000));
        assert_eq!(parse_size("100"), Ok(100));
        assert_eq!(parse_size("1.5KB"), Ok(1536));
        assert_eq!(parse_size("2 gigabytes"), Ok(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_size("0.3b"), Ok(0));
        assert_eq!(parse_size("1e3"), Ok(1000));
        assert_eq!(
            parse_size("5parsecs"),
            Err(ParseError::UnknownSizeUnit("parsecs".into()))
        );
        assert!(matches!(parse_size("1.2.3mb"), Err(ParseError::InvalidSize(_))));
        assert!(matches!(parse_size("big"), Err(ParseError::InvalidSize(_))));
    }

    #[test]
    fn unix_timestamps_render_in_utc() {
        assert_eq!(parse_date("1700000000").unwrap(), "2023-11-14 22:13:20");
        assert_eq!(parse_date("0").unwrap(), "1970-01-01 00:00:00");
    }

    #[test]
    fn datetime_formats_keep_the_time() {
        assert_eq!(
            parse_date("2023-11-14 22:13:20").unwrap(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(
            parse_date("2023/11/14 22:13").unwrap(),
            "2023-11-14 22:13:00"
        );
    }

    #[test]
    fn date_only_formats() {
        assert_eq!(parse_date("2023-11-14").unwrap(), "2023-11-14");
        assert_eq!(parse_date("2023/11/14").unwrap(), "2023-11-14");
        assert_eq!(parse_date("11/14/2023").unwrap(), "2023-11-14");
        assert_eq!(parse_date("14/11/2023").unwrap(), "2023-11-14");
    }

    #[test]
    fn garbage_dates_fail() {
        assert!(matches!(
            parse_date("yesterday-ish"),
            Err(ParseError::InvalidDate(_))
        ));
    }

    #[test]
    fn time_of_day_shapes() {
        assert!(looks_like_time_of_day("22:13"));
        assert!(looks_like_time_of_day("9:05:59"));
        assert!(looks_like_time_of_day("22:13:20<"));
        assert!(!looks_like_time_of_day("22"));
        assert!(!looks_like_time_of_day("score:5"));
        assert!(!looks_like_time_of_day("1:2:3:4"));
    }

    #[test]
    fn only_date_filters_without_time_take_one() {
        assert!(continues_with_time("created_at:2023-11-14", "22:13"));
        assert!(continues_with_time("-uploaded:>2023-11-14", "22:13:20"));
        assert!(continues_with_time("created_at:2023-11-14", "22:13<"));
        assert!(!continues_with_time("created_at:1700000000", "22:13"));
        assert!(!continues_with_time("created_at:2023-11-14 22:13", "22:14"));
        assert!(!continues_with_time("score:5", "22:13"));
        assert!(!continues_with_time("smile", "22:13"));
        assert!(!continues_with_time("created_at:2023-11-14", "cat"));
    }

    #[test]
    fn glyphs_never_end_up_between_date_and_time() {
        assert!(!continues_with_time("created_at:2023-11-14<", "22:13"));
        assert!(!continues_with_time("created_at:2023-11-14>=", "22:13"));
        assert!(!continues_with_time("created_at:>2023-11-14", "22:13<"));
    }
}
