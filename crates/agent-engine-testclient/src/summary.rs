const GCS_URI_FALLBACK: &str = "(not provided by agent — download the artifact from the ADK UI \
Artifacts tab, or have your tool write to GCS and place the URI in state)";

/// Final outcome of one streamed run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_score: Option<i64>,
    /// Unique artifact names in first-seen order.
    pub artifacts: Vec<String>,
    pub gcs_uri: Option<String>,
}

impl Summary {
    /// Human-readable report printed at the end of a run.
    pub fn render(&self, prompt: &str) -> String {
        let score = self
            .total_score
            .map_or_else(|| "N/A".to_string(), |score| score.to_string());
        let artifacts = if self.artifacts.is_empty() {
            "(none reported)".to_string()
        } else {
            self.artifacts.join(", ")
        };
        let gcs_uri = self.gcs_uri.as_deref().unwrap_or(GCS_URI_FALLBACK);
        format!(
            "\n=== SUMMARY ===\nPrompt: {prompt}\nTotal Score: {score}\nArtifacts: {artifacts}\nGCS URI: {gcs_uri}\n"
        )
    }
}
