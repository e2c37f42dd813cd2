//! The five datetime variants and the cross-type cast lattice (spec.md §3.2, §4.7).
//!
//! Parsing itself is delegated to `chrono`'s RFC-3339 / ISO-8601
//! parsers, standing in for the "datetime format library" collaborator
//! spec.md §1 describes as out of scope; this module owns only the
//! variant lattice, the comparison sentinel, and the `use_tz` gate.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};

use crate::error::Error;

#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum DateTimeValue {
	Date(NaiveDate),
	Time(NaiveTime),
	TimeTz(NaiveTime, FixedOffset),
	Timestamp(NaiveDateTime),
	TimestampTz(DateTime<FixedOffset>),
}

impl PartialEq for DateTimeValue {
	fn eq(&self, other: &Self) -> bool {
		compare(self, other, true) == Some(std::cmp::Ordering::Equal)
	}
}

impl DateTimeValue {
	pub fn type_name(&self) -> &'static str {
		match self {
			DateTimeValue::Date(_) => "date",
			DateTimeValue::Time(_) => "time without time zone",
			DateTimeValue::TimeTz(_, _) => "time with time zone",
			DateTimeValue::Timestamp(_) => "timestamp without time zone",
			DateTimeValue::TimestampTz(_) => "timestamp with time zone",
		}
	}

	pub fn to_iso8601(&self) -> String {
		match self {
			DateTimeValue::Date(d) => d.format("%Y-%m-%d").to_string(),
			DateTimeValue::Time(t) => t.format("%H:%M:%S%.f").to_string(),
			DateTimeValue::TimeTz(t, off) => {
				format!("{}{}", t.format("%H:%M:%S%.f"), fmt_offset(off))
			}
			DateTimeValue::Timestamp(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
			DateTimeValue::TimestampTz(dt) => dt.to_rfc3339(),
		}
	}
}

fn fmt_offset(off: &FixedOffset) -> String {
	let secs = off.fix().local_minus_utc();
	let sign = if secs < 0 {
		'-'
	} else {
		'+'
	};
	let secs = secs.abs();
	format!("{sign}{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
}

/// Parses the fitting-ISO-format for the given string, returning the
/// most specific variant it matches: TimestampTz, then Timestamp, then
/// TimeTz, then Time, then Date — mirroring how PostgreSQL's jsonpath
/// `.datetime()` without arguments tries formats from most to least
/// specific.
pub fn parse_auto(s: &str, precision: Option<u32>) -> Result<DateTimeValue, Error> {
	if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
		return Ok(clamp_precision_tz(dt, precision));
	}
	if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
		return Ok(DateTimeValue::Timestamp(clamp_precision_naive(ndt, precision)));
	}
	if let Ok(t) = parse_time_tz(s) {
		return Ok(t);
	}
	if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
		return Ok(DateTimeValue::Time(clamp_time_precision(t, precision)));
	}
	if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
		return Ok(DateTimeValue::Date(d));
	}
	Err(Error::DatetimeFormatNotRecognized(s.to_string()))
}

fn parse_time_tz(s: &str) -> Result<DateTimeValue, chrono::ParseError> {
	let dt = DateTime::parse_from_str(&format!("1970-01-01T{s}"), "%Y-%m-%dT%H:%M:%S%.f%:z")?;
	Ok(DateTimeValue::TimeTz(dt.time(), *dt.offset()))
}

fn clamp_precision_tz(dt: DateTime<FixedOffset>, precision: Option<u32>) -> DateTimeValue {
	DateTimeValue::TimestampTz(dt.with_nanosecond_clamped(precision))
}

fn clamp_precision_naive(dt: NaiveDateTime, precision: Option<u32>) -> NaiveDateTime {
	dt.with_nanosecond_clamped(precision)
}

fn clamp_time_precision(t: NaiveTime, precision: Option<u32>) -> NaiveTime {
	t.with_nanosecond_clamped(precision)
}

/// Extension used to round a parsed value to the requested fractional
/// second precision (0..=6, clamped; spec.md §4.7).
trait ClampNanos {
	fn with_nanosecond_clamped(self, precision: Option<u32>) -> Self;
}

fn clamp_precision(precision: Option<u32>) -> u32 {
	precision.unwrap_or(6).min(6)
}

fn round_nanos(nanos: u32, precision: u32) -> u32 {
	let divisor = 10u32.pow(9 - precision);
	(nanos / divisor) * divisor
}

impl ClampNanos for NaiveTime {
	fn with_nanosecond_clamped(self, precision: Option<u32>) -> Self {
		use chrono::Timelike;
		let p = clamp_precision(precision);
		let rounded = round_nanos(self.nanosecond(), p);
		self.with_nanosecond(rounded).unwrap_or(self)
	}
}

impl ClampNanos for NaiveDateTime {
	fn with_nanosecond_clamped(self, precision: Option<u32>) -> Self {
		use chrono::Timelike;
		let p = clamp_precision(precision);
		let rounded = round_nanos(self.nanosecond(), p);
		self.with_nanosecond(rounded).unwrap_or(self)
	}
}

impl ClampNanos for DateTime<FixedOffset> {
	fn with_nanosecond_clamped(self, precision: Option<u32>) -> Self {
		use chrono::Timelike;
		let p = clamp_precision(precision);
		let rounded = round_nanos(self.nanosecond(), p);
		self.with_nanosecond(rounded).unwrap_or(self)
	}
}

/// The kind requested by `.date()/.time()/.time_tz()/.timestamp()/.timestamp_tz()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastTarget {
	Date,
	Time,
	TimeTz,
	Timestamp,
	TimestampTz,
}

/// Casts a parsed datetime value to the requested target per the
/// lattice of spec.md §4.7. `use_tz` gates the `!tz` cells.
pub fn cast(value: DateTimeValue, target: CastTarget, use_tz: bool) -> Result<DateTimeValue, Error> {
	use CastTarget::*;
	use DateTimeValue::*;
	match (&value, target) {
		(Date(_), Date) => Ok(value),
		(Time(_), Time) => Ok(value),
		(TimeTz(_, _), TimeTz) => Ok(value),
		(Timestamp(_), Timestamp) => Ok(value),
		(TimestampTz(_), TimestampTz) => Ok(value),

		(Date(d), Timestamp) => Ok(Timestamp(d.and_hms_opt(0, 0, 0).unwrap())),
		(Date(d), TimestampTz) => {
			require_tz(use_tz, "date", "timestamp with time zone")?;
			let ndt = d.and_hms_opt(0, 0, 0).unwrap();
			Ok(TimestampTz(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc).fixed_offset()))
		}

		(Time(t), TimeTz) => {
			require_tz(use_tz, "time", "time with time zone")?;
			Ok(TimeTz(*t, FixedOffset::east_opt(0).unwrap()))
		}
		(TimeTz(t, _), Time) => {
			require_tz(use_tz, "time with time zone", "time")?;
			Ok(Time(*t))
		}

		(Timestamp(dt), Date) => Ok(Date(dt.date())),
		(Timestamp(dt), Time) => Ok(Time(dt.time())),
		(Timestamp(dt), TimestampTz) => {
			require_tz(use_tz, "timestamp", "timestamp with time zone")?;
			Ok(TimestampTz(DateTime::<Utc>::from_naive_utc_and_offset(*dt, Utc).fixed_offset()))
		}

		(TimestampTz(dt), Date) => {
			require_tz(use_tz, "timestamp with time zone", "date")?;
			Ok(Date(dt.naive_utc().date()))
		}
		(TimestampTz(dt), Time) => {
			require_tz(use_tz, "timestamp with time zone", "time")?;
			Ok(Time(dt.naive_utc().time()))
		}
		(TimestampTz(dt), TimeTz) => Ok(TimeTz(dt.time(), *dt.offset())),
		(TimestampTz(dt), Timestamp) => {
			require_tz(use_tz, "timestamp with time zone", "timestamp")?;
			Ok(Timestamp(dt.naive_utc()))
		}

		_ => Err(Error::DatetimeFormatNotRecognized(format!(
			"{} -> {target:?}",
			value.type_name()
		))),
	}
}

fn require_tz(use_tz: bool, from: &'static str, to: &'static str) -> Result<(), Error> {
	if use_tz {
		Ok(())
	} else {
		Err(Error::DatetimeRequiresTz {
			from,
			to,
		})
	}
}

/// Cross-type comparison per the lattice of spec.md §4.7. Returns
/// `None` for incomparable pairs (caller maps that to the tri-valued
/// `unknown`, the "sentinel -2" of spec.md §4.7).
pub fn compare(a: &DateTimeValue, b: &DateTimeValue, use_tz: bool) -> Option<std::cmp::Ordering> {
	use DateTimeValue::*;
	match (a, b) {
		(Date(x), Date(y)) => x.partial_cmp(y),
		(Time(x), Time(y)) => x.partial_cmp(y),
		(TimeTz(x, ox), TimeTz(y, oy)) => {
			let x = x.overflowing_sub_signed(chrono::Duration::seconds(ox.local_minus_utc() as i64)).0;
			let y = y.overflowing_sub_signed(chrono::Duration::seconds(oy.local_minus_utc() as i64)).0;
			x.partial_cmp(&y)
		}
		(Timestamp(x), Timestamp(y)) => x.partial_cmp(y),
		(TimestampTz(x), TimestampTz(y)) => x.partial_cmp(y),
		(Date(x), Timestamp(y)) => x.and_hms_opt(0, 0, 0).unwrap().partial_cmp(y),
		(Timestamp(x), Date(y)) => x.partial_cmp(&y.and_hms_opt(0, 0, 0).unwrap()),
		// Every other cross-type pairing (Time/TimeTz, Date/TimestampTz,
		// Timestamp/TimestampTz, TimestampTz/Time, ...) follows the same
		// shape as the cast lattice above (spec.md §4.7: "Comparisons
		// follow the same shape"): unify onto one side's variant via
		// `cast`, which already enforces the `!tz` gate, then recurse on
		// the now-matching pair. Two casts are attempted since the
		// lattice isn't symmetric (e.g. `Timestamp -> TimestampTz` is
		// defined but `TimestampTz -> Timestamp` is a separate cell).
		_ => {
			if let Ok(a_as_b) = cast(a.clone(), target_of(b), use_tz) {
				return compare(&a_as_b, b, use_tz);
			}
			if let Ok(b_as_a) = cast(b.clone(), target_of(a), use_tz) {
				return compare(a, &b_as_a, use_tz);
			}
			None
		}
	}
}

fn target_of(v: &DateTimeValue) -> CastTarget {
	match v {
		DateTimeValue::Date(_) => CastTarget::Date,
		DateTimeValue::Time(_) => CastTarget::Time,
		DateTimeValue::TimeTz(_, _) => CastTarget::TimeTz,
		DateTimeValue::Timestamp(_) => CastTarget::Timestamp,
		DateTimeValue::TimestampTz(_) => CastTarget::TimestampTz,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_plain_date() {
		let v = parse_auto("2020-01-02", None).unwrap();
		assert!(matches!(v, DateTimeValue::Date(_)));
	}

	#[test]
	fn parses_timestamp_tz() {
		let v = parse_auto("2020-01-03T04:05:06Z", None).unwrap();
		assert!(matches!(v, DateTimeValue::TimestampTz(_)));
	}

	#[test]
	fn date_to_timestamp_tz_requires_use_tz() {
		let d = DateTimeValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
		assert!(cast(d.clone(), CastTarget::TimestampTz, false).is_err());
		assert!(cast(d, CastTarget::TimestampTz, true).is_ok());
	}

	#[test]
	fn date_vs_time_incomparable() {
		let d = DateTimeValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
		let t = DateTimeValue::Time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
		assert_eq!(compare(&d, &t, true), None);
	}

	#[test]
	fn time_vs_time_tz_requires_use_tz() {
		let t = DateTimeValue::Time(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
		let tz = DateTimeValue::TimeTz(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), FixedOffset::east_opt(0).unwrap());
		assert_eq!(compare(&t, &tz, false), None);
		assert_eq!(compare(&t, &tz, true), Some(std::cmp::Ordering::Equal));
	}

	#[test]
	fn date_vs_timestamp_tz_requires_use_tz() {
		let d = DateTimeValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
		let ts_tz = DateTimeValue::TimestampTz(
			DateTime::<Utc>::from_naive_utc_and_offset(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(), Utc)
				.fixed_offset(),
		);
		assert_eq!(compare(&d, &ts_tz, false), None);
		assert_eq!(compare(&d, &ts_tz, true), Some(std::cmp::Ordering::Equal));
	}
}
