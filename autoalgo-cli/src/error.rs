#[derive(Debug)]
pub enum Error {
    IOError(std::io::Error),
    TOMLParseError(toml::de::Error),
    BadLogLevel(String),
    BadPathEncoding(std::path::PathBuf),
    LogConfigError(log4rs::config::runtime::ConfigErrors),
    LoggerError(log::SetLoggerError),
    CoreError(autoalgo::Error),
    NoProposalDir,
    BadProposal(std::path::PathBuf, String),
    UnknownEntry(String, Vec<String>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IOError(e) => {
                write!(f, "input/output error: {}", e)
            }
            Self::TOMLParseError(e) => {
                write!(f, "error parsing TOML: {}", e)
            }
            Self::BadLogLevel(e) => {
                write!(f, "invalid log level {}", e)
            }
            Self::BadPathEncoding(p) => {
                write!(f, "non-UTF8 path {}", p.as_path().display())
            }
            Self::LogConfigError(e) => {
                write!(f, "bad logging configuration: {}", e)
            }
            Self::LoggerError(e) => {
                write!(f, "cannot set up logging: {}", e)
            }
            Self::CoreError(e) => {
                write!(f, "{}", e)
            }
            Self::NoProposalDir => {
                write!(f, "data source is dir but proposal_dir is not set")
            }
            Self::BadProposal(p, e) => {
                write!(f, "bad proposal {}: {}", p.as_path().display(), e)
            }
            Self::UnknownEntry(e, known) => {
                write!(
                    f,
                    "no built-in solver named {}, known: {}",
                    e,
                    known.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<autoalgo::Error> for Error {
    fn from(e: autoalgo::Error) -> Self {
        Self::CoreError(e)
    }
}
