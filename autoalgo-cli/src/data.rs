use crate::prelude::*;
use autoalgo::ProposalSource;
use clap::ArgEnum;

/// Where the candidates of a batch come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Every solver compiled into autoalgo.
    Builtin,
    /// One `*.toml` proposal file per candidate in `proposal_dir`.
    Dir,
}

impl DataSource {
    pub fn open(
        self,
        proposal_dir: Option<&PathBuf>,
    ) -> Result<Box<dyn ProposalSource + Send>> {
        Ok(match self {
            Self::Builtin => Box::new(crate::data_builtin::BuiltinSource::new()),
            Self::Dir => {
                let dir = proposal_dir.ok_or(Error::NoProposalDir)?;
                Box::new(crate::data_dir::DirSource::new(dir))
            }
        })
    }
}
