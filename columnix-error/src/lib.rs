#![deny(missing_docs)]

//! This crate defines error & result types for Columnix.
//! It also contains a variety of useful macros for error handling.
//!
//! Errors are split into input-validation errors, which are raised before any
//! state is mutated, and terminal errors ([`ColumnixError::IOError`],
//! [`ColumnixError::CorruptData`]) which invalidate the writer or reader that
//! produced them.

mod ext;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;
use std::{fmt, io};

pub use ext::*;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

#[allow(clippy::fallible_impl_from)]
impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for Columnix.
///
/// Backtraces are boxed: thiserror only forwards bare `Backtrace` fields through
/// `Error::provide`, which is not available on a stable compiler.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum ColumnixError {
    /// A column definition is invalid, collides with another column, or the schema was
    /// modified after rows were written.
    #[error("Schema error: {0}\nBacktrace:\n{1}")]
    SchemaError(ErrString, Box<Backtrace>),
    /// An option or column setting is outside its accepted range.
    #[error("Invalid configuration: {0}\nBacktrace:\n{1}")]
    InvalidConfiguration(ErrString, Box<Backtrace>),
    /// A row did not have one value per schema column.
    #[error("Row has {actual} values but the schema has {expected} columns\nBacktrace:\n{backtrace}")]
    RowArityError {
        /// Number of columns in the schema.
        expected: usize,
        /// Number of values in the offending row.
        actual: usize,
        /// Where the row was rejected.
        backtrace: Box<Backtrace>,
    },
    /// A value, or a typed accessor, disagrees with the column's declared type.
    #[error("Type mismatch: {0}\nBacktrace:\n{1}")]
    TypeMismatch(ErrString, Box<Backtrace>),
    /// A typed accessor was invoked on a null cell.
    #[error("Null value: {0}\nBacktrace:\n{1}")]
    NullValue(ErrString, Box<Backtrace>),
    /// An operation was invoked on a writer or reader that can no longer serve it.
    #[error("Invalid state: {0}\nBacktrace:\n{1}")]
    InvalidState(ErrString, Box<Backtrace>),
    /// The file, footer, or a row group failed structural validation.
    #[error("Corrupt data: {0}\nBacktrace:\n{1}")]
    CorruptData(ErrString, Box<Backtrace>),
    /// An index is out of bounds.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(usize, usize, usize, Box<Backtrace>),
    /// An invalid argument was provided.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Box<Backtrace>),
    /// An internal invariant did not hold.
    #[error("{0}\nBacktrace:\n{1}")]
    AssertionFailed(ErrString, Box<Backtrace>),
    /// A wrapper for IO errors.
    #[error("IO error: {0}\nBacktrace:\n{1}")]
    IOError(#[source] io::Error, Box<Backtrace>),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<ColumnixError>),
    /// An error that has been handed to more than one caller.
    #[error("{0}")]
    Shared(Arc<ColumnixError>),
}

impl ColumnixError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        ColumnixError::Context(msg.into(), Box::new(self))
    }

    /// The innermost error, looking through any [`ColumnixError::Context`] wrappers.
    pub fn root(&self) -> &ColumnixError {
        match self {
            ColumnixError::Context(_, inner) => inner.root(),
            ColumnixError::Shared(inner) => inner.root(),
            other => other,
        }
    }

    /// Whether this error invalidates the writer or reader that raised it.
    ///
    /// Input validation errors leave the instance usable; IO and corruption errors do not.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.root(),
            ColumnixError::IOError(..) | ColumnixError::CorruptData(..)
        )
    }
}

impl From<io::Error> for ColumnixError {
    fn from(err: io::Error) -> Self {
        ColumnixError::IOError(err, Box::new(Backtrace::capture()))
    }
}

impl Debug for ColumnixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return ColumnixErrors as their error type.
pub type ColumnixResult<T> = Result<T, ColumnixError>;

/// A convenient macro for creating a ColumnixError.
#[macro_export]
macro_rules! cx_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::ColumnixError::OutOfBounds($idx, $start, $stop, Box::new(Backtrace::capture()))
    }};
    (RowArityError: $expected:expr, $actual:expr) => {{
        use std::backtrace::Backtrace;
        $crate::ColumnixError::RowArityError {
            expected: $expected,
            actual: $actual,
            backtrace: Box::new(Backtrace::capture()),
        }
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::ColumnixError::Context($msg.into(), Box::new($err))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::ColumnixError::$variant(format!($fmt, $($arg),*).into(), Box::new(Backtrace::capture()))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::cx_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenient macro for returning a ColumnixError.
#[macro_export]
macro_rules! cx_bail {
    ($($tt:tt)+) => {
        return Err($crate::cx_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a ColumnixError in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! cx_panic {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::cx_panic!($crate::cx_err!(OutOfBounds: $idx, $start, $stop))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::cx_panic!($crate::cx_err!($variant: $fmt, $($arg),*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::cx_panic!($crate::cx_err!($fmt, $($arg),*))
    };
    ($err:expr) => {{
        let err: $crate::ColumnixError = $err;
        panic!("{}", err)
    }};
}

/// A trait for expect-ing a ColumnixResult or an Option.
pub trait ColumnixExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be used only in cases where the error is not expected to occur.
    fn cx_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> ColumnixExpect for Result<T, E>
where
    E: Display,
{
    type Output = T;

    #[inline(always)]
    fn cx_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|e| {
            let err = ColumnixError::AssertionFailed(
                format!("{msg}: {e}").into(),
                Box::new(Backtrace::capture()),
            );
            cx_panic!(err)
        })
    }
}

impl<T> ColumnixExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn cx_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = ColumnixError::AssertionFailed(
                msg.to_string().into(),
                Box::new(Backtrace::capture()),
            );
            cx_panic!(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn context_is_transparent_to_root() {
        let err = cx_err!(CorruptData: "bad magic {:?}", b"XXXX").with_context("opening file");
        assert!(matches!(err.root(), ColumnixError::CorruptData(..)));
        assert!(err.is_terminal());
        assert!(err.to_string().starts_with("opening file: Corrupt data: bad magic"));
    }

    #[test]
    fn validation_errors_are_not_terminal() {
        let err = cx_err!(RowArityError: 3, 2);
        assert!(!err.is_terminal());
        assert!(err.to_string().contains("2 values"));
        assert!(!cx_err!(TypeMismatch: "expected i32").is_terminal());
    }

    #[test]
    fn io_errors_convert() {
        fn fails() -> ColumnixResult<()> {
            Err::<(), _>(io::Error::other("disk full"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, ColumnixError::IOError(..)));
        assert!(err.is_terminal());
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk full");
    }

    #[test]
    fn lazy_context_wraps_error() {
        let res: ColumnixResult<()> = Err(cx_err!(CorruptData: "short chunk"));
        let err = res.with_context(|| format!("column {}", 3)).unwrap_err();
        assert!(err.to_string().starts_with("column 3: Corrupt data: short chunk"));
        assert!(err.is_terminal());
    }

    #[test]
    fn expect_accepts_foreign_errors() {
        let bytes = [1u8, 0, 0, 0];
        let word: [u8; 4] = bytes.as_slice().try_into().cx_expect("four bytes");
        assert_eq!(u32::from_le_bytes(word), 1);
    }

    #[test]
    #[should_panic(expected = "two bytes")]
    fn expect_reports_foreign_errors() {
        let bytes = [1u8, 0, 0];
        let _word: [u8; 2] = bytes.as_slice().try_into().cx_expect("two bytes");
    }

    #[test]
    fn result_ext_context() {
        let res: ColumnixResult<()> = Err(cx_err!(SchemaError: "duplicate column {}", "id"));
        let err = res.context("add_column").unwrap_err();
        assert!(matches!(err, ColumnixError::Context(..)));
        assert!(matches!(err.root(), ColumnixError::SchemaError(..)));
    }

    #[test]
    fn shared_errors_keep_their_root() {
        let err = Arc::new(cx_err!(CorruptData: "bad chunk"));
        let shared = ColumnixError::Shared(err.clone());
        assert!(shared.is_terminal());
        assert_eq!(shared.to_string(), err.to_string());
    }

    #[test]
    #[should_panic(expected = "must be present")]
    fn expect_panics_with_message() {
        let value: Option<u8> = None;
        value.cx_expect("must be present");
    }
}
