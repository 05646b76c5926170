//! Compiler configuration.
use std::time::Duration;

/// The supported dialect markers. The compiler loosely tracks 2020-12; the
/// marker records what the schema author targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Draft {
    /// JSON Schema Draft 2019-09
    Draft201909,
    /// JSON Schema Draft 2020-12
    Draft202012,
}

impl Default for Draft {
    fn default() -> Self {
        Draft::Draft202012
    }
}

/// How compilation and validation failures are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Stop at the first failure.
    First,
    /// Collect every failure.
    All,
}

impl Default for ErrorMode {
    fn default() -> Self {
        ErrorMode::All
    }
}

/// Full configuration to guide schema compilation and validation.
///
/// Using a `CompilerOptions` instance you can configure error reporting,
/// parallel subschema compilation and the remote fetch timeout:
/// ```rust
/// # use jsonbind::{Compiler, CompilerOptions, ErrorMode};
/// let compiler = Compiler::with_options(
///     CompilerOptions::default()
///         .with_error_mode(ErrorMode::First)
///         .with_parallel_children(true),
/// );
/// # drop(compiler);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    draft: Draft,
    error_mode: ErrorMode,
    parallel_children: bool,
    remote_timeout: Duration,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            draft: Draft::default(),
            error_mode: ErrorMode::default(),
            parallel_children: false,
            remote_timeout: Duration::from_secs(5),
        }
    }
}

impl CompilerOptions {
    /// The dialect marker.
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// How failures are reported.
    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    /// Whether `allOf`/`anyOf`/`oneOf`/`prefixItems` children compile on
    /// the thread pool.
    pub fn parallel_children(&self) -> bool {
        self.parallel_children
    }

    /// The bound on remote schema fetches.
    pub fn remote_timeout(&self) -> Duration {
        self.remote_timeout
    }

    /// Set the dialect marker.
    #[must_use]
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }

    /// Set the failure reporting mode.
    #[must_use]
    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    /// Compile subschema lists in parallel. The compiled order always
    /// matches the input order.
    #[must_use]
    pub fn with_parallel_children(mut self, parallel_children: bool) -> Self {
        self.parallel_children = parallel_children;
        self
    }

    /// Bound remote schema fetches. Defaults to five seconds.
    #[must_use]
    pub fn with_remote_timeout(mut self, remote_timeout: Duration) -> Self {
        self.remote_timeout = remote_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trip() {
        let options = CompilerOptions::default()
            .with_draft(Draft::Draft201909)
            .with_error_mode(ErrorMode::First)
            .with_parallel_children(true)
            .with_remote_timeout(Duration::from_millis(100));
        assert_eq!(options.draft(), Draft::Draft201909);
        assert_eq!(options.error_mode(), ErrorMode::First);
        assert!(options.parallel_children());
        assert_eq!(options.remote_timeout(), Duration::from_millis(100));
    }
}
