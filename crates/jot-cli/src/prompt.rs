use std::io::{BufRead, Write};

use anyhow::Context;
use jot_core::{EditRequest, EditResponse};

/// Answers an edit request with replacement text or a cancellation.
pub trait EditPrompt {
    fn ask(&mut self, request: &EditRequest) -> anyhow::Result<EditResponse>;
}

/// Reads one line from `input` after writing a prompt to `output`. An empty
/// line or end of input cancels.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> EditPrompt for LinePrompt<R, W> {
    #[tracing::instrument(skip(self, request), fields(id = request.id))]
    fn ask(&mut self, request: &EditRequest) -> anyhow::Result<EditResponse> {
        write!(self.output, "Edit item [{}]: ", request.current_text)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed reading edit text")?;
        let line = line.trim_end_matches(['\r', '\n']);

        if read == 0 || line.is_empty() {
            return Ok(EditResponse::Cancel);
        }
        Ok(EditResponse::Replace(line.to_string()))
    }
}
