use thiserror::Error;

/// The full error taxonomy for path execution.
///
/// `Structural` and `Suppressible` are downgraded elsewhere (structural
/// errors to `NotFound` in lax mode, suppressible errors to a silent
/// `Failed` under [`crate::Options::with_silent`]); `Fatal` is never
/// suppressed; `Null` is the strict-mode-undefined sentinel surfaced at
/// the public boundary (spec.md §6/§7).
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
	#[error("jsonpath object accessor can only be applied to an object: {0}")]
	Structural(String),

	#[error("{0}")]
	Suppressible(String),

	#[error("{0}")]
	Fatal(String),

	#[error("jsonpath member accessor can only be applied to an object")]
	NotAnObject,

	#[error("jsonpath array accessor can only be applied to an array")]
	NotAnArray,

	#[error("object does not contain key \"{0}\"")]
	NoSuchKey(String),

	#[error("jsonpath array subscript is out of bounds")]
	SubscriptOutOfBounds,

	#[error("jsonpath array subscript is not a single numeric value")]
	SubscriptNotNumeric,

	#[error("{side} operand of jsonpath operator {op} is not a single numeric value")]
	OperandNotSingleNumeric {
		side: &'static str,
		op: &'static str,
	},

	#[error("division by zero")]
	DivisionByZero,

	#[error("{0} is not a numeric value")]
	NotNumeric(String),

	#[error("NaN or Infinity is not allowed for jsonpath item method .{0}()")]
	NotFinite(&'static str),

	#[error("argument \"{value}\" of jsonpath item method .{method}() is invalid for type {ty}")]
	InvalidArgument {
		method: &'static str,
		value: String,
		ty: &'static str,
	},

	#[error("jsonpath item method .{0}() can only be applied to a bool, string, or numeric value")]
	InvalidBooleanCoercion(&'static str),

	#[error("precision of jsonpath item method .decimal() is out of range")]
	DecimalPrecisionOutOfRange,

	#[error("scale of jsonpath item method .decimal() is out of range")]
	DecimalScaleOutOfRange,

	#[error("jsonpath item method .decimal() cannot represent the value with the requested precision and scale")]
	DecimalOverflow,

	#[error("could not find jsonpath variable \"{0}\"")]
	NoSuchVariable(String),

	#[error("jsonpath item method .datetime(template) is not yet supported")]
	DatetimeTemplateUnsupported,

	#[error("format is not recognized: \"{0}\"")]
	DatetimeFormatNotRecognized(String),

	#[error("cannot convert value from {from} to {to} without time zone usage")]
	DatetimeRequiresTz {
		from: &'static str,
		to: &'static str,
	},

	#[error("single boolean result is expected")]
	SingleBooleanResultExpected,

	#[error("LAST is allowed only in array subscripts")]
	LastOutsideSubscript,

	#[error("invalid jsonpath item type")]
	InvalidItemType,

	#[error("jsonpath node has unexpected trailing accessor chain")]
	UnexpectedNext,
}

impl Error {
	/// Whether this error belongs to the structural class (suppressed to
	/// `NotFound` under lax mode rather than surfaced as `Failed`).
	pub fn is_structural(&self) -> bool {
		matches!(
			self,
			Error::Structural(_)
				| Error::NotAnObject
				| Error::NotAnArray
				| Error::NoSuchKey(_)
				| Error::SubscriptOutOfBounds
		)
	}

	/// Whether this error belongs to the suppressible class (swallowed to
	/// a silent `Failed` under [`crate::Options::with_silent`]).
	pub fn is_suppressible(&self) -> bool {
		matches!(
			self,
			Error::Suppressible(_)
				| Error::SubscriptNotNumeric
				| Error::OperandNotSingleNumeric {
					..
				} | Error::DivisionByZero
				| Error::NotNumeric(_)
				| Error::NotFinite(_)
				| Error::InvalidArgument {
					..
				} | Error::InvalidBooleanCoercion(_)
				| Error::DecimalPrecisionOutOfRange
				| Error::DecimalScaleOutOfRange
				| Error::DecimalOverflow
				| Error::DatetimeFormatNotRecognized(_)
				| Error::DatetimeRequiresTz {
					..
				} | Error::InvalidItemType
		)
	}

	/// Fatal errors are never suppressed, in verbose or silent mode.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			Error::Fatal(_)
				| Error::DatetimeTemplateUnsupported
				| Error::LastOutsideSubscript
				| Error::UnexpectedNext
				| Error::NoSuchVariable(_)
		)
	}
}
