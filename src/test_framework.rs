use std::fmt::{Debug, Display, Formatter};
use std::panic::Location;
use std::path::Path;

/// Source position of the test line that invoked a check.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct CallerLocation {
    /// Basename of the source file
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl CallerLocation {
    /// Location of the caller of the current `#[track_caller]` chain.
    #[track_caller]
    pub fn here() -> Self {
        Self::from(Location::caller())
    }
}

impl From<&'static Location<'static>> for CallerLocation {
    fn from(location: &'static Location<'static>) -> Self {
        let path = location.file();
        let file = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path);
        Self {
            file,
            line: location.line(),
            column: location.column(),
        }
    }
}

impl Debug for CallerLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl Display for CallerLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A failed assertion: what went wrong and where the check was called from.
#[derive(Clone, PartialEq)]
pub struct TestError {
    pub(crate) text: String,
    pub(crate) location: CallerLocation,
}

impl TestError {
    #[track_caller]
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(CallerLocation::here(), text)
    }

    pub fn at(location: CallerLocation, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            location,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn location(&self) -> CallerLocation {
        self.location
    }
}

impl Debug for TestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Test failure: {self}")
    }
}

impl Display for TestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.text)
    }
}

impl std::error::Error for TestError {}

pub type TestResult = Result<(), TestError>;

#[cfg(test)]
mod tests {
    use super::{CallerLocation, TestError};

    #[test]
    fn test_location_is_basename() {
        let location = CallerLocation::here();
        assert_eq!(location.file, "test_framework.rs");
        assert_eq!(location.line, line!() - 2);
    }

    #[test]
    fn test_error_rendering() {
        let error = TestError::new("math broken");
        let line = line!() - 1;
        assert_eq!(
            format!("{error}"),
            format!("test_framework.rs:{line}: math broken")
        );
        assert_eq!(
            format!("{error:?}"),
            format!("Test failure: test_framework.rs:{line}: math broken")
        );
    }
}
