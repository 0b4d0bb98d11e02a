/// Error types that can be built from a plain message string.
///
/// Crates implement this for their own `Error` and then invoke
/// [`impl_context!`] inside their error module.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// Generate a crate-local `Context` trait with `.context()` and
/// `.with_context()` on `Result` and `Option`.
///
/// The invoking module must define `Error: FromMessage` and
/// `type Result<T> = std::result::Result<T, Error>`.
///
/// ```ignore
/// // crates/config/src/error.rs
/// switchyard_common::impl_context!();
/// ```
#[macro_export]
macro_rules! impl_context {
    () => {
        pub trait Context<T>: Sized {
            /// Prefix the failure with a fixed description.
            fn context(self, context: impl Into<String>) -> Result<T> {
                let context = context.into();
                self.with_context(move || context)
            }

            /// Prefix the failure with a lazily built description.
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|source| {
                    let prefix: String = f().into();
                    <Error as $crate::FromMessage>::from_message(format!("{prefix}: {source}"))
                })
            }
        }

        impl<T> Context<T> for Option<T> {
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    #[derive(Debug, PartialEq)]
    struct Error(String);

    impl crate::FromMessage for Error {
        fn from_message(message: String) -> Self {
            Self(message)
        }
    }

    type Result<T> = std::result::Result<T, Error>;

    crate::impl_context!();

    #[test]
    fn result_context_prefixes_source() {
        let failed: std::result::Result<(), &str> = Err("gone");
        assert_eq!(
            failed.context("reading endpoints").unwrap_err(),
            Error("reading endpoints: gone".into())
        );
    }

    #[test]
    fn option_context_uses_message() {
        let missing: Option<u8> = None;
        assert_eq!(
            missing.with_context(|| "no value").unwrap_err(),
            Error("no value".into())
        );
        assert_eq!(Some(3).context("unused").unwrap(), 3);
    }
}
