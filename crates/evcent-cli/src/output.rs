//! Output layer: per-iteration blocks for humans, JSON lines for machines.
//!
//! # Human format
//!
//! ```text
//! Iteration 1
//! Normalized Value = 3.46
//! Vertex    EVC
//! 1         0.577
//! 2         0.577
//! 3         0.577
//!
//! ```
//!
//! Norms use 2 decimals, scores 3 decimals, ties rounded half-up. Vertex ids
//! start at 1.
//!
//! # JSON format
//!
//! One compact object per line: an optional `{"matrix": ...}` line, one
//! iteration record per iteration, then a final `{"outcome": ...}` line.
//!
//! Errors always go to stderr.

use std::io::{self, Write};

use evcent_core::{AdjacencyMatrix, IterationRecord, Outcome, Termination};
use serde::Serialize;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable iteration blocks.
    #[default]
    Human,
    /// Machine-readable JSON lines.
    Json,
}

impl OutputMode {
    /// Parse a mode name. Unknown names fall back to human output.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Human,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "invalid_value", "not_square").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)?;
    Ok(())
}

fn write_error(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Human => {
            writeln!(w, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Run rendering
// ────────────────────────────────────────────────────────────────────────────

/// Streams a run to a writer.
///
/// With `final_only` set, iteration records are held back and only the last
/// one is written when the run finishes.
pub struct Renderer<W: Write> {
    out: W,
    mode: OutputMode,
    final_only: bool,
}

impl<W: Write> Renderer<W> {
    pub const fn new(out: W, mode: OutputMode, final_only: bool) -> Self {
        Self {
            out,
            mode,
            final_only,
        }
    }

    /// Echo the parsed matrix.
    pub fn matrix(&mut self, matrix: &AdjacencyMatrix) -> anyhow::Result<()> {
        match self.mode {
            OutputMode::Human => {
                write!(self.out, "{matrix}")?;
                writeln!(self.out)?;
            }
            OutputMode::Json => {
                let line = serde_json::json!({ "matrix": matrix.to_rows() });
                self.json_line(&line)?;
            }
        }
        Ok(())
    }

    /// Write one iteration unless only the final one is wanted.
    pub fn iteration(&mut self, record: &IterationRecord) -> anyhow::Result<()> {
        if self.final_only {
            return Ok(());
        }
        self.record(record)
    }

    /// Write the end of the run.
    pub fn finish(&mut self, outcome: &Outcome) -> anyhow::Result<()> {
        if self.final_only {
            if let Some(last) = &outcome.last {
                self.record(last)?;
            }
        }

        match self.mode {
            OutputMode::Human => match outcome.termination {
                Termination::Converged => {}
                Termination::Degenerate => {
                    writeln!(self.out, "Iteration {}", outcome.iterations)?;
                    writeln!(
                        self.out,
                        "Normalized Value = 0! Can't perform more iterations."
                    )?;
                }
                Termination::IterationLimit => writeln!(
                    self.out,
                    "Stopped after {} iterations without converging.",
                    outcome.iterations
                )?,
                Termination::Cancelled => writeln!(
                    self.out,
                    "Cancelled after {} iterations.",
                    outcome.iterations
                )?,
            },
            OutputMode::Json => {
                let line = serde_json::json!({ "outcome": outcome });
                self.json_line(&line)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn record(&mut self, record: &IterationRecord) -> anyhow::Result<()> {
        match self.mode {
            OutputMode::Human => write_block(&mut self.out, record)?,
            OutputMode::Json => self.json_line(record)?,
        }
        Ok(())
    }

    fn json_line<T: Serialize>(&mut self, value: &T) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Human block for one iteration, followed by a blank line.
fn write_block(w: &mut impl Write, record: &IterationRecord) -> io::Result<()> {
    writeln!(w, "Iteration {}", record.iteration)?;
    writeln!(w, "Normalized Value = {}", fixed(record.norm, 2))?;
    writeln!(w, "Vertex    EVC")?;
    for (vertex, score) in record.scores.vertices() {
        writeln!(w, "{vertex:<10}{}", fixed(score, 3))?;
    }
    writeln!(w)
}

/// Fixed-point text with ties rounded half-up on the shortest decimal form,
/// so 0.0625 prints as `0.063` at 3 places. `{:.3}` would print `0.062`.
fn fixed(value: f64, places: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    // `Display` for f64 never uses exponent notation.
    let text = value.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut digits: Vec<u8> = int_part.bytes().collect();
    let kept = frac_part.len().min(places);
    digits.extend(frac_part.bytes().take(kept));
    digits.extend(std::iter::repeat_n(b'0', places - kept));

    if frac_part.as_bytes().get(places).is_some_and(|&d| d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let split = digits.len() - places;
    let mut out = String::with_capacity(digits.len() + 2);
    if value.is_sign_negative() && value != 0.0 {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|&d| char::from(d)));
    if places > 0 {
        out.push('.');
        out.extend(digits[split..].iter().map(|&d| char::from(d)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use evcent_core::{EngineConfig, ScoreVector, run};

    fn record(iteration: usize, norm: f64, scores: Vec<f64>) -> IterationRecord {
        IterationRecord {
            iteration,
            norm,
            previous_norm: 0.0,
            scores: ScoreVector::from(scores),
        }
    }

    fn render_run(mode: OutputMode, final_only: bool, rows: &[&[u8]]) -> String {
        let m = AdjacencyMatrix::from_rows(rows).expect("valid");
        let mut renderer = Renderer::new(Vec::new(), mode, final_only);
        let mut records = Vec::new();
        let outcome = run(&m, EngineConfig::default(), |r| records.push(r.clone())).expect("runs");
        for r in &records {
            renderer.iteration(r).expect("write");
        }
        renderer.finish(&outcome).expect("write");
        String::from_utf8(renderer.into_inner()).expect("utf8")
    }

    #[test]
    fn human_block_layout() {
        let mut buf = Vec::new();
        write_block(&mut buf, &record(1, 3.4641, vec![0.57735, 0.57735])).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            text,
            "Iteration 1\nNormalized Value = 3.46\nVertex    EVC\n1         0.577\n2         0.577\n\n"
        );
    }

    #[test]
    fn ties_round_half_up() {
        // 32 vertices: vertex 1 links to 15 others, every other row holds one 1.
        // The first iteration gives scores 15/16 and 1/16.
        let mut scores = vec![0.0625; 32];
        scores[0] = 0.9375;
        let mut buf = Vec::new();
        write_block(&mut buf, &record(1, 16.0, scores)).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("\n1         0.938\n"), "got:\n{text}");
        assert!(text.contains("\n2         0.063\n"), "got:\n{text}");
        assert!(text.contains("Normalized Value = 16.00\n"));
    }

    #[test]
    fn fixed_point_formatting() {
        assert_eq!(fixed(0.0625, 3), "0.063");
        assert_eq!(fixed(0.0624, 3), "0.062");
        assert_eq!(fixed(3.464_101_615_137_754_5, 2), "3.46");
        assert_eq!(fixed(2.0, 2), "2.00");
        assert_eq!(fixed(1.0, 3), "1.000");
        assert_eq!(fixed(0.9995, 3), "1.000");
        assert_eq!(fixed(9.995, 2), "10.00");
        assert_eq!(fixed(0.0, 3), "0.000");
        assert_eq!(fixed(-0.125, 2), "-0.13");
        assert_eq!(fixed(1e-7, 3), "0.000");
        assert_eq!(fixed(0.577_350_269_189_625_8, 3), "0.577");
    }

    #[test]
    fn vertex_column_stays_aligned_past_nine() {
        let mut buf = Vec::new();
        write_block(&mut buf, &record(1, 1.0, vec![0.1; 10])).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("\n10        0.100\n"), "got:\n{text}");
    }

    #[test]
    fn human_run_prints_every_iteration() {
        let text = render_run(OutputMode::Human, false, &[&[0, 1, 1], &[1, 0, 1], &[1, 1, 0]]);
        assert!(text.contains("Iteration 1\nNormalized Value = 3.46\n"));
        assert!(text.contains("Iteration 2\nNormalized Value = 2.00\n"));
        assert!(text.contains("Iteration 3\nNormalized Value = 2.00\n"));
        assert!(!text.contains("Iteration 4"));
    }

    #[test]
    fn final_only_prints_last_iteration() {
        let text = render_run(OutputMode::Human, true, &[&[0, 1, 1], &[1, 0, 1], &[1, 1, 0]]);
        assert!(text.starts_with("Iteration 3\n"), "got:\n{text}");
        assert_eq!(text.matches("Iteration").count(), 1);
    }

    #[test]
    fn degenerate_run_reports_stop() {
        let text = render_run(OutputMode::Human, false, &[&[0, 1], &[0, 0]]);
        assert!(text.contains("Iteration 1\nNormalized Value = 1.00\n"));
        assert!(text.ends_with("Iteration 2\nNormalized Value = 0! Can't perform more iterations.\n"));
    }

    #[test]
    fn json_run_is_one_object_per_line() {
        let text = render_run(OutputMode::Json, false, &[&[0, 1, 1], &[1, 0, 1], &[1, 1, 0]]);
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("valid json line"))
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["iteration"], 1);
        assert_eq!(lines[3]["outcome"]["termination"], "converged");
    }

    #[test]
    fn json_matrix_echo() {
        let m = AdjacencyMatrix::from_rows(&[[0_u8, 1], [1, 0]]).expect("valid");
        let mut renderer = Renderer::new(Vec::new(), OutputMode::Json, false);
        renderer.matrix(&m).expect("write");
        let text = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(text, "{\"matrix\":[[0,1],[1,0]]}\n");
    }

    #[test]
    fn human_error_has_suggestion_line() {
        let mut buf = Vec::new();
        let err = CliError::with_details("bad input", "try again", "bad_input");
        write_error(&mut buf, OutputMode::Human, &err).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "error: bad input\n  suggestion: try again\n"
        );
    }

    #[test]
    fn json_error_is_wrapped() {
        let mut buf = Vec::new();
        let err = CliError::with_details("boom", "retry", "internal");
        write_error(&mut buf, OutputMode::Json, &err).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["error"]["message"], "boom");
        assert_eq!(value["error"]["error_code"], "internal");
    }

    #[test]
    fn mode_names() {
        assert_eq!(OutputMode::from_name("JSON"), OutputMode::Json);
        assert_eq!(OutputMode::from_name("human"), OutputMode::Human);
        assert_eq!(OutputMode::from_name("yaml"), OutputMode::Human);
    }
}
