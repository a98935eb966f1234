//! Prompt templates handed to an external recommendation generator

use crate::error::Result;
use crate::output::report::AnalysisReport;
use crate::processing::document::Document;
use regex::{Captures, Regex};
use serde_json::Value;

/// Document fields left out of prompts
const EXCLUDED_FIELDS: [&str; 3] = ["url", "word_count", "text"];

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub recommendations: String,
    pub new_page_brief: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            recommendations: RECOMMENDATIONS_TEMPLATE.to_string(),
            new_page_brief: NEW_PAGE_BRIEF_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Recommendations for an existing page from its analysis report
    pub fn render_recommendations(
        &self,
        report: &AnalysisReport,
        target: &Document,
        keywords: &[String],
        with_structure: bool,
    ) -> Result<String> {
        let mut gaps = serde_json::to_value(&report.semantic_gaps)?;
        if let Value::Object(map) = &mut gaps {
            map.remove("text");
        }

        let structure = if with_structure { STRUCTURE_INSTRUCTION } else { "" };

        let values = [
            ("keywords", serde_json::to_string(keywords)?),
            ("document", serde_json::to_string_pretty(&prompt_document(target)?)?),
            ("zone_relevance", serde_json::to_string_pretty(&report.zone_relevance)?),
            ("semantic_gaps", serde_json::to_string_pretty(&gaps)?),
            ("structure", structure.to_string()),
        ];

        Ok(fill_placeholders(&self.recommendations, &values).trim_end().to_string())
    }

    /// Brief for a page that does not exist yet
    pub fn render_new_page_brief(&self, competitors: &[Document], keywords: &[String]) -> Result<String> {
        let prepared = competitors
            .iter()
            .map(prompt_document)
            .collect::<Result<Vec<_>>>()?;

        let values = [
            ("keywords", serde_json::to_string(keywords)?),
            ("competitors", serde_json::to_string_pretty(&prepared)?),
        ];

        Ok(fill_placeholders(&self.new_page_brief, &values))
    }
}

/// Substitutes `{name}` placeholders in one pass over the template.
/// Inserted values are never scanned again; unknown names are left as is.
fn fill_placeholders(template: &str, values: &[(&str, String)]) -> String {
    let placeholder = Regex::new(r"\{(\w+)\}").expect("Invalid placeholder regex");
    placeholder
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn prompt_document(doc: &Document) -> Result<Value> {
    let mut value = serde_json::to_value(doc)?;
    if let Value::Object(map) = &mut value {
        for field in EXCLUDED_FIELDS {
            map.remove(field);
        }
    }
    Ok(value)
}

const STRUCTURE_INSTRUCTION: &str = "Also propose an ideal structure for the document.";

const RECOMMENDATIONS_TEMPLATE: &str = r#"You are an SEO expert. Below are the analysis results for my page and the top competing pages.
Find the missing topics and give recommendations per zone (title, h1, subheadings, first 500 characters, structures, links, slug, text). Answer in a structured way.

Keywords: {keywords}

My document:
{document}

Zone relevance:
{zone_relevance}

Semantic gaps:
{semantic_gaps}

Recommendations:
1. Which zones are strong?
2. Which zones are weak?
3. Which topics, subheadings, lists or tables should be added?
4. Example phrasings (short, ideas only).

{structure}"#;

const NEW_PAGE_BRIEF_TEMPLATE: &str = r#"You are an SEO expert. Below are the keywords and the top competing pages.
Write a brief for a new page.

Keywords: {keywords}

Competitors:
{competitors}

Recommendations:
1. Title (SEO aware).
2. Meta description.
3. H1.
4. Document structure.
5. Lists and tables: are they needed, and where?
6. Style and emphasis."#;
