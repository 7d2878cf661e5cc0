use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HazardResult<T> = Result<T, HazardError>;
pub type ConfigResult<T> = HazardResult<T>;
pub type ComputeResult<T> = HazardResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardErrorCategory {
    Success,
    ConfigurationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl HazardErrorCategory {
    pub const fn exit_status(self) -> ExitStatusMapping {
        match self {
            Self::Success => ExitStatusMapping {
                exit_code: 0,
                rust_category: "Success",
                severity_class: "SUCCESS",
            },
            Self::ConfigurationError => ExitStatusMapping {
                exit_code: 2,
                rust_category: "ConfigurationError",
                severity_class: "CONFIG_FATAL",
            },
            Self::IoSystemError => ExitStatusMapping {
                exit_code: 3,
                rust_category: "IoSystemError",
                severity_class: "IO_FATAL",
            },
            Self::ComputationError => ExitStatusMapping {
                exit_code: 4,
                rust_category: "ComputationError",
                severity_class: "RUN_FATAL",
            },
            Self::InternalError => ExitStatusMapping {
                exit_code: 5,
                rust_category: "InternalError",
                severity_class: "SYS_FATAL",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_status().exit_code
    }

    pub const fn rust_category(self) -> &'static str {
        self.exit_status().rust_category
    }

    pub const fn severity_class(self) -> &'static str {
        self.exit_status().severity_class
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatusMapping {
    pub exit_code: i32,
    pub rust_category: &'static str,
    pub severity_class: &'static str,
}

/// Where inside a calculation an error surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub source_id: String,
    pub rupture_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardError {
    category: HazardErrorCategory,
    placeholder: &'static str,
    message: String,
    location: Option<SourceLocation>,
    cause: Option<Box<HazardError>>,
}

impl HazardError {
    pub fn new(
        category: HazardErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
            location: None,
            cause: None,
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(HazardErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(HazardErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(HazardErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(HazardErrorCategory::InternalError, placeholder, message)
    }

    /// Wraps `cause` as a fatal computation error attributed to one source.
    ///
    /// The cause stays reachable through [`Error::source`], so diagnostics can
    /// walk the chain down to the GSIM or geometry failure that started it.
    pub fn in_source(
        source_id: impl Into<String>,
        rupture_index: Option<usize>,
        cause: HazardError,
    ) -> Self {
        let source_id = source_id.into();
        let message = match rupture_index {
            Some(index) => format!(
                "an error occurred with source id={source_id} at rupture #{index}: {}",
                cause.message
            ),
            None => format!(
                "an error occurred with source id={source_id}: {}",
                cause.message
            ),
        };
        Self {
            category: HazardErrorCategory::ComputationError,
            placeholder: "RUN.SOURCE",
            message,
            location: Some(SourceLocation {
                source_id,
                rupture_index,
            }),
            cause: Some(Box::new(cause)),
        }
    }

    pub const fn category(&self) -> HazardErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn cause(&self) -> Option<&HazardError> {
        self.cause.as_deref()
    }

    /// The innermost error of the chain, or `self` when nothing is wrapped.
    pub fn root_cause(&self) -> &HazardError {
        let mut current = self;
        while let Some(next) = current.cause.as_deref() {
            current = next;
        }
        current
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub const fn exit_status(&self) -> ExitStatusMapping {
        self.category.exit_status()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for HazardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.rust_category(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for HazardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}
