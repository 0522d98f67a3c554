use std::fmt;

/// Machine-readable error codes shared by the library and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    GraphParse,
    FileSystem,
    ConfigParse,
    CyclicDependency,
    IncompletePlan,
    PhaseOrderViolation,
    SourceFetchFailed,
    ResolutionLimit,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::GraphParse => "E1001",
            Self::FileSystem => "E1002",
            Self::ConfigParse => "E1003",
            Self::CyclicDependency => "E2001",
            Self::IncompletePlan => "E2002",
            Self::PhaseOrderViolation => "E2003",
            Self::SourceFetchFailed => "E3001",
            Self::ResolutionLimit => "E3002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::GraphParse => "Persisted graph could not be parsed",
            Self::FileSystem => "File read or write failed",
            Self::ConfigParse => "Config file parse error",
            Self::CyclicDependency => "Dependency cycle detected",
            Self::IncompletePlan => "Build plan is missing nodes",
            Self::PhaseOrderViolation => "Dependency scheduled too late",
            Self::SourceFetchFailed => "Fetching package dependencies failed",
            Self::ResolutionLimit => "Resolution exceeded the node limit",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint surfaced next to the error.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::GraphParse => {
                Some("Delete the cached graph file; it will be rebuilt on the next resolve.")
            }
            Self::FileSystem => Some("Check that the path exists and is writable."),
            Self::ConfigParse => Some("Fix syntax in .strata/config.toml and retry."),
            Self::CyclicDependency => {
                Some("Remove one of the listed dependencies to break the cycle.")
            }
            Self::IncompletePlan | Self::PhaseOrderViolation => {
                Some("The graph is malformed; re-resolve dependencies from scratch.")
            }
            Self::SourceFetchFailed => None,
            Self::ResolutionLimit => Some("Raise resolve.max_nodes in .strata/config.toml."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
