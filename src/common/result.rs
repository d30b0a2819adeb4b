use crate::common::error::GroveError;

/// groveプロジェクト全体で使用するResult型のエイリアス
///
/// # Examples
///
/// ```
/// use grove::common::result::GroveResult;
/// use grove::common::error::GroveError;
///
/// fn example_function() -> GroveResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> GroveResult<()> {
///     Err(GroveError::internal_error("Something went wrong"))
/// }
/// ```
pub type GroveResult<T> = Result<T, GroveError>;

/// Optionのエラー変換ヘルパー
pub trait OptionExt<T> {
    /// Noneの場合にNotFoundErrorを返す
    ///
    /// ```
    /// use grove::common::result::{GroveResult, OptionExt};
    ///
    /// let none_value: Option<String> = None;
    /// let result: GroveResult<String> = none_value.ok_or_not_found("repo github:a/b not found");
    /// assert!(result.is_err());
    /// ```
    fn ok_or_not_found(self, message: impl Into<String>) -> GroveResult<T>;

    /// Noneの場合にInternalErrorを返す
    fn ok_or_internal_error(self, message: impl Into<String>) -> GroveResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> GroveResult<T> {
        self.ok_or_else(|| GroveError::not_found_error(message))
    }

    fn ok_or_internal_error(self, message: impl Into<String>) -> GroveResult<T> {
        self.ok_or_else(|| GroveError::internal_error(message))
    }
}

/// Resultのエラー変換ヘルパー
pub trait ResultExt<T, E> {
    /// ファイルシステムエラーとしてGroveResultに変換
    ///
    /// ```
    /// use grove::common::result::{GroveResult, ResultExt};
    /// use std::path::PathBuf;
    ///
    /// let result: Result<String, std::io::Error> = Err(std::io::Error::new(
    ///     std::io::ErrorKind::NotFound, "file not found"
    /// ));
    /// let grove_result: GroveResult<String> =
    ///     result.with_filesystem_error("read index", Some(PathBuf::from("/data/repo")));
    /// assert!(grove_result.is_err());
    /// ```
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> GroveResult<T>
    where
        E: Into<std::io::Error>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> GroveResult<T>
    where
        E: Into<std::io::Error>,
    {
        self.map_err(|e| GroveError::filesystem_error_with_source(message, path, e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_option_ext_ok_or_not_found() {
        let some_value = Some("test".to_string());
        assert_eq!(some_value.ok_or_not_found("missing").unwrap(), "test");

        let none_value: Option<String> = None;
        let result = none_value.ok_or_not_found("missing");
        if let Err(GroveError::NotFoundError { message }) = result {
            assert_eq!(message, "missing");
        } else {
            panic!("Expected NotFoundError");
        }
    }

    #[test]
    fn test_result_ext_with_filesystem_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let result: Result<String, std::io::Error> = Err(io_error);
        let path = Some(PathBuf::from("/test/path"));

        let grove_result = result.with_filesystem_error("test operation", path.clone());
        if let Err(GroveError::FileSystemError { path: p, .. }) = grove_result {
            assert_eq!(p, path);
        } else {
            panic!("Expected FileSystemError");
        }
    }
}
