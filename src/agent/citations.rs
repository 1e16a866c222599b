//! Reference-source block appended to grounded answers.

use crate::llm::{GroundingMetadata, GroundingSource};

/// Render the deduplicated source list, or `None` when there is nothing to cite.
///
/// Entries keep first-seen order. Maps sources without a title are labelled
/// `Location`.
pub fn format_reference_sources(grounding: &GroundingMetadata) -> Option<String> {
    let mut entries: Vec<String> = Vec::new();

    for source in &grounding.sources {
        let entry = match source {
            GroundingSource::Web { title, uri } => {
                format!("[{}]({})", title.as_deref().unwrap_or(""), uri)
            }
            GroundingSource::Maps { title, uri } => {
                let title = title.as_deref().filter(|t| !t.is_empty()).unwrap_or("Location");
                format!("[{}]({})", title, uri)
            }
        };
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }

    if entries.is_empty() {
        return None;
    }
    Some(format!("\n\n**Reference Sources:**\n{}", entries.join("\n")))
}
