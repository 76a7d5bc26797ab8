use ripa::error::EtlError;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Backtrace captured when a non-pipeline error is created.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type of the loader binary.
#[derive(Debug)]
pub enum LoaderError {
    /// Failure while reading, transforming or writing records.
    Etl(EtlError),
    /// Configuration or telemetry setup failure.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// I/O failure outside the pipeline, such as building the runtime.
    Io(std::io::Error, CapturedBacktrace),
}

impl LoaderError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            LoaderError::Etl(_) => "load error",
            LoaderError::Config(_, _) => "configuration error",
            LoaderError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            LoaderError::Etl(err) => err.backtrace(),
            LoaderError::Config(_, captured) | LoaderError::Io(_, captured) => Some(&captured.0),
        }
    }

    /// Creates a configuration error from any error.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        LoaderError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a report for terminal output.
    ///
    /// Aggregated load errors already list every failure, so their cause chain is not repeated.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("ripa-loader failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        if !matches!(self, LoaderError::Etl(err) if err.errors().is_some()) {
            let mut source = Error::source(self);
            let mut index = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {index}: {err}\n"));
                source = err.source();
                index += 1;
            }
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Etl(err) => write!(f, "{err}"),
            LoaderError::Config(source, _) => write!(f, "configuration error: {source}"),
            LoaderError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for LoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoaderError::Etl(err) => err.source(),
            LoaderError::Config(source, _) => Some(source.as_ref()),
            LoaderError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<EtlError> for LoaderError {
    fn from(err: EtlError) -> Self {
        LoaderError::Etl(err)
    }
}
