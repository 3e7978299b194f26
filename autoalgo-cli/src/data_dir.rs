use crate::prelude::*;
use autoalgo::{Candidate, ProposalSource};

/// One candidate, as written by hand or by an external generator.
#[derive(Deserialize)]
struct ProposalFile {
    /// Defaults to the file stem.
    id: Option<String>,
    entry: String,
    /// Relative to the directory of the proposal file.
    src: PathBuf,
    #[serde(default)]
    prompt: String,
}

impl ProposalFile {
    fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = util::load_file(path)?;
        toml::from_str(&content).map_err(Error::TOMLParseError)
    }

    fn into_candidate(self, path: &Path) -> Result<Candidate> {
        let id = match self.id {
            Some(id) => id,
            None => path
                .file_stem()
                .and_then(|x| x.to_str())
                .ok_or_else(|| Error::BadPathEncoding(path.to_path_buf()))?
                .to_owned(),
        };
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let source = util::load_file(base.join(&self.src))?;
        Ok(Candidate::new(id, source, self.entry).with_prompt(self.prompt))
    }
}

pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn load_all(&self) -> Result<Vec<Candidate>> {
        util::enumerate_files(&self.dir, "toml")?
            .into_iter()
            .map(|p| {
                ProposalFile::load(&p)
                    .and_then(|f| f.into_candidate(&p))
                    .map_err(|e| Error::BadProposal(p.clone(), e.to_string()))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ProposalSource for DirSource {
    /// The problem statement is not used, the proposals are already
    /// written.
    async fn propose(&mut self, _problem: &str) -> autoalgo::Result<Vec<Candidate>> {
        self.load_all()
            .map_err(|e| autoalgo::Error::Proposal(e.to_string()))
    }
}
