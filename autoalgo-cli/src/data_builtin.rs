use autoalgo::{solvers::BUILTIN, Candidate, ProposalSource, Result};

/// Proposes every built-in solver, each with the design prompt it
/// answers.
pub struct BuiltinSource {}

impl BuiltinSource {
    pub fn new() -> Self {
        Self {}
    }
}

fn prompt(problem: &str, summary: &str) -> String {
    format!(
        "Problem:\n{}\n\n\
         Implement `find_shortest_path(graph, start, end)` returning the \
         total cost and the node path, with an infinite cost and an empty \
         path when `end` cannot be reached.\n\n\
         Approach: {}.\n",
        problem.trim_end(),
        summary
    )
}

#[async_trait::async_trait]
impl ProposalSource for BuiltinSource {
    async fn propose(&mut self, problem: &str) -> Result<Vec<Candidate>> {
        Ok(BUILTIN
            .iter()
            .map(|b| Candidate::new(b.entry, b.source, b.entry).with_prompt(prompt(problem, b.summary)))
            .collect())
    }
}
