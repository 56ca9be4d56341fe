use std::sync::Arc;

use serde::Deserialize;

use crate::gemini::RelevanceOracle;
use crate::storage::{StandardsStore, StoreError};

/// Entries at or above this score get their full content inlined.
const CONTENT_INLINE_THRESHOLD: f64 = 0.7;

/// One ranked candidate produced by the oracle. The filename should name a
/// real document, but nothing enforces that; readers must tolerate entries
/// that do not.
#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceEntry {
    pub filename: String,
    #[serde(rename = "relevanceScore")]
    pub relevance_score: f64,
    pub reason: String,
}

/// The oracle's structured answer for one query. `relevant_files` is
/// conventionally sorted descending by score; that ordering is requested
/// from the oracle but never enforced here.
#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceResult {
    pub summary: String,
    #[serde(rename = "relevantFiles")]
    pub relevant_files: Vec<RelevanceEntry>,
}

/// Outcome of parsing the oracle's raw answer.
///
/// The oracle's output format is not contractually guaranteed, so parsing
/// degrades to passing the raw text through instead of failing the request.
#[derive(Debug, Clone)]
pub enum RankingOutcome {
    Structured(RelevanceResult),
    RawText(String),
}

/// Extract a structured ranking from the oracle's answer.
///
/// Models tend to wrap the JSON object in prose or markdown fences, so this
/// locates the first balanced `{...}` span and parses that. Any failure,
/// from a missing span to a non-numeric score, yields the raw text
/// unchanged.
pub fn parse_ranking(raw: &str) -> RankingOutcome {
    let Some(span) = first_brace_span(raw) else {
        return RankingOutcome::RawText(raw.to_string());
    };

    match serde_json::from_str(span) {
        Ok(result) => RankingOutcome::Structured(result),
        Err(e) => {
            tracing::debug!("Oracle answer did not match the ranking schema: {e}");
            RankingOutcome::RawText(raw.to_string())
        }
    }
}

/// First balanced `{...}` span in the text, honoring string literals and
/// escapes so braces inside JSON strings do not end the span early.
fn first_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Runs one relevance search end to end: enumerate candidates, ask the
/// oracle, parse its answer, and assemble the final text.
pub struct RelevancePipeline<O> {
    store: Arc<StandardsStore>,
    oracle: O,
}

impl<O: RelevanceOracle> RelevancePipeline<O> {
    pub fn new(store: Arc<StandardsStore>, oracle: O) -> Self {
        Self { store, oracle }
    }

    /// One terminal run per query. Oracle failures and degraded parses are
    /// reported inside the returned text; only a failure to list the
    /// standards folder itself surfaces as an error.
    pub async fn search(&self, query: &str) -> Result<String, StoreError> {
        let candidates = self.store.list_candidates()?;
        if candidates.is_empty() {
            return Ok(format!(
                "No standard files (.md) found in {}.",
                self.store.docs_dir().display()
            ));
        }

        let raw = match self.oracle.rank(query, &candidates).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Relevance oracle unavailable: {e}");
                return Ok(format!("Could not analyze relevance: {e}"));
            }
        };

        match parse_ranking(&raw) {
            RankingOutcome::RawText(text) => Ok(format!("Gemini analysis:\n{text}")),
            RankingOutcome::Structured(result) => Ok(self.render(query, &result)),
        }
    }

    /// Assemble the answer: summary first, then one section per entry in the
    /// order the oracle produced them. Entries above the inline threshold
    /// get their full content; a read failure there is reported for that
    /// entry alone and the rest still render.
    fn render(&self, query: &str, result: &RelevanceResult) -> String {
        let mut out = format!("## Relevant standards for: \"{query}\"\n\n");
        out.push_str(&result.summary);
        out.push_str("\n\n");

        if result.relevant_files.is_empty() {
            out.push_str("No relevant standard files were found for your query.");
            return out;
        }

        out.push_str("### Files found:\n\n");

        for entry in &result.relevant_files {
            let percent = (entry.relevance_score * 100.0).round();
            out.push_str(&format!(
                "**{}** (Relevance: {percent:.0}%)\n{}\n\n",
                entry.filename, entry.reason
            ));

            if entry.relevance_score >= CONTENT_INLINE_THRESHOLD {
                match self.store.read_document(&entry.filename) {
                    Ok(content) => {
                        out.push_str(&format!(
                            "Content of {}:\n```\n{content}\n```\n\n",
                            entry.filename
                        ));
                    }
                    Err(e) => {
                        tracing::warn!("Could not inline {}: {e}", entry.filename);
                        out.push_str(&format!(
                            "Could not read the content of {}\n\n",
                            entry.filename
                        ));
                    }
                }
            }
        }

        out
    }
}
