use crate::ColumnixResult;

/// Extension trait for [`ColumnixResult`]
pub trait ResultExt<T>: private::Sealed {
    /// Wrap the error, if any, in a [`Context`](crate::ColumnixError::Context) carrying `msg`.
    fn context<S: Into<String>>(self, msg: S) -> ColumnixResult<T>;

    /// Like [`ResultExt::context`], but the message is only built on the error path.
    fn with_context<F, S>(self, f: F) -> ColumnixResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

mod private {
    use crate::ColumnixResult;

    pub trait Sealed {}

    impl<T> Sealed for ColumnixResult<T> {}
}

impl<T> ResultExt<T> for ColumnixResult<T> {
    fn context<S: Into<String>>(self, msg: S) -> ColumnixResult<T> {
        self.map_err(|e| e.with_context(Into::<String>::into(msg)))
    }

    fn with_context<F, S>(self, f: F) -> ColumnixResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.with_context(Into::<String>::into(f())))
    }
}
