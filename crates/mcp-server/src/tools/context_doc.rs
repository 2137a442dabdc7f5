/// Minimal text document helpers for tool output.
///
/// The text content mirrors the structured payload in a dense, line-oriented form for clients
/// that only show text: `A:` answer, `R:` one result, `N:` note.
pub(crate) struct ContextDocBuilder {
    out: String,
}

impl ContextDocBuilder {
    const QUOTE_PREFIX: &'static str = " ";

    #[must_use]
    pub(crate) fn new() -> Self {
        let mut out = String::new();
        out.push_str("[CONTENT]\n");
        Self { out }
    }

    #[must_use]
    pub(crate) fn finish(self) -> String {
        self.out
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    pub(crate) fn push_answer(&mut self, text: &str) {
        self.push_line(&format!("A: {text}"));
    }

    pub(crate) fn push_note(&mut self, text: &str) {
        self.push_line(&format!("N: {text}"));
    }

    pub(crate) fn push_ref(&mut self, id: &str, label: &str, score: Option<f64>) {
        match score {
            Some(score) => self.push_line(&format!("R: {id} {label} (score={score:.3})")),
            None => self.push_line(&format!("R: {id} {label}")),
        }
    }

    fn line_needs_quoting(line: &str) -> bool {
        let trimmed = line.trim_start();
        trimmed.starts_with("[CONTENT]")
            || trimmed.starts_with("A:")
            || trimmed.starts_with("N:")
            || trimmed.starts_with("R:")
    }

    /// Push free text (descriptions, definitions) without letting it impersonate a marker line.
    pub(crate) fn push_block_smart(&mut self, block: &str) {
        for line in block.lines() {
            if Self::line_needs_quoting(line) {
                self.out.push_str(Self::QUOTE_PREFIX);
            }
            self.out.push_str(line);
            self.out.push('\n');
        }
    }
}
