//! Prompt construction for the annotation task.
//!
//! A prompt has three parts: the task instructions with the tag definitions
//! from the annotation-project export, a set of few-shot example articles
//! rendered from hand-annotated exports, and the target article. The
//! examples teach the model the exact `Label:` / `Text: "..."` line-pair
//! format the alignment engine parses back out of the response.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

const SYSTEM_PREAMBLE: &str = "You are a history expert specializing in the study of child labor. \
Your task is to annotate passages in historical newspaper articles that discuss child labor. \
You will tag segments of the text according to the specific aspect of the discourse they represent.\n";

const TAG_LIST_HEADER: &str = "Below is a list of tags with descriptions of what each tag covers. \
Use these tags to annotate the provided text.\n\nAnnotation Tags and Descriptions:\n\n";

const EXAMPLES_HEADER: &str =
    "Here are examples of news articles annotated according to the tags defined above:\n";

const FINAL_INSTRUCTIONS: &str = "Please annotate the news article below in the same manner as in \
the example above. Return only annotations and nothing else. Do not change the extracted text in any way.\n";

const ARTICLE_MARKER: &str = "\n--- News article ---\n";
const ANNOTATIONS_MARKER: &str = "\n--- Annotations ---\n";

/// Builds per-article prompts from a fixed instruction block.
///
/// Construct once per language (tag definitions and examples are shared),
/// then call [`PromptBuilder::build_for`] per article.
pub struct PromptBuilder {
    instructions: String,
}

impl PromptBuilder {
    /// Assemble the shared instruction block from a tag-set export and a
    /// directory of annotated example exports.
    pub fn from_exports(tagset_path: &Path, examples_dir: &Path, example_count: usize) -> Result<Self> {
        let tags = tag_definitions(tagset_path)?;
        let examples = few_shot_examples(examples_dir, example_count)?;

        let mut instructions = String::new();
        instructions.push_str(SYSTEM_PREAMBLE);
        instructions.push_str(TAG_LIST_HEADER);
        instructions.push_str(&tags);
        instructions.push_str(EXAMPLES_HEADER);
        instructions.push_str(&examples);

        Ok(Self { instructions })
    }

    /// A builder with an already-assembled instruction block (used in tests).
    pub fn with_instructions(instructions: String) -> Self {
        Self { instructions }
    }

    /// The complete prompt for one article.
    pub fn build_for(&self, article: &str) -> String {
        let mut prompt = self.instructions.clone();
        prompt.push_str(FINAL_INSTRUCTIONS);
        prompt.push_str(ARTICLE_MARKER);
        prompt.push_str(article);
        prompt.push_str(ANNOTATIONS_MARKER);
        prompt
    }
}

/// Render the tag definitions from an annotation-project export: the first
/// tag set's tags as `Tag: "<name>"` / `Description:` blocks. The export's
/// filled-circle bullets are normalized to plain bullets.
pub fn tag_definitions(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tag set {}", path.display()))?;
    let data: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tag set {}", path.display()))?;

    let tags = data["tag_sets"][0]["tags"]
        .as_array()
        .with_context(|| format!("No tag_sets[0].tags array in {}", path.display()))?;

    let mut rendered = String::new();
    for tag in tags {
        let name = tag["tag_name"].as_str().unwrap_or("");
        let description = tag["tag_description"].as_str().unwrap_or("");
        rendered.push_str(&format!("Tag: \"{}\"\nDescription:\n{}\n\n", name, description).replace('●', "•"));
    }
    Ok(rendered)
}

/// Render up to `n` few-shot examples from the annotated exports under
/// `dir`. Files are discovered recursively and taken in sorted order so the
/// prompt is deterministic across runs.
pub fn few_shot_examples(dir: &Path, n: usize) -> Result<String> {
    let pattern = format!("{}/**/*.json", dir.display());
    let mut paths: Vec<_> = glob::glob(&pattern)
        .with_context(|| format!("Bad examples pattern {}", pattern))?
        .filter_map(|p| p.ok())
        .collect();
    paths.sort();

    let mut rendered = Vec::new();
    for path in paths.iter().take(n) {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read example {}", path.display()))?;
        let data: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse example {}", path.display()))?;
        match render_example(&data) {
            Some(example) => rendered.push(example),
            None => debug!(example = %path.display(), "export missing chunks or text, skipped"),
        }
    }
    Ok(rendered.join("\n"))
}

/// Render one annotated export (CAS JSON) as article text plus its
/// annotation line pairs reconstructed from the stored character offsets.
fn render_example(data: &Value) -> Option<String> {
    let chunks = data["_views"]["_InitialView"]["Chunk"].as_array()?;
    let full_text = data["_referenced_fss"]["1"]["sofaString"].as_str()?;
    let chars: Vec<char> = full_text.chars().collect();

    let mut example = String::new();
    example.push_str(ARTICLE_MARKER);
    example.push_str(full_text);
    example.push_str(ANNOTATIONS_MARKER);

    for chunk in chunks {
        let begin = chunk["begin"].as_u64().unwrap_or(0) as usize;
        let end = chunk["end"].as_u64().unwrap_or(0) as usize;
        let label = chunk["chunkValue"].as_str().unwrap_or("unknown label");

        if end > chars.len() || begin > end {
            continue;
        }
        let snippet: String = chars[begin..end].iter().collect();
        example.push_str(&format!("Label: {}\nText: \"{}\"\n\n", label, snippet));
    }
    Some(example)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_tagset(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("tagset.json");
        fs::write(
            &path,
            r#"{"tag_sets":[{"tags":[
                {"tag_name":"Workplace","tag_description":"● Mentions of mills and factories"},
                {"tag_name":"Reform","tag_description":"Calls for legislation"}
            ]}]}"#,
        )
        .unwrap();
        path
    }

    fn write_example(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(
            &path,
            r#"{
                "_views":{"_InitialView":{"Chunk":[
                    {"begin":8,"end":14,"chunkValue":"Work"},
                    {"end":3}
                ]}},
                "_referenced_fss":{"1":{"sofaString":"The boy worked."}}
            }"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn tag_definitions_render_and_normalize_bullets() {
        let dir = TempDir::new().unwrap();
        let path = write_tagset(&dir);

        let rendered = tag_definitions(&path).unwrap();
        assert!(rendered.contains("Tag: \"Workplace\""));
        assert!(rendered.contains("• Mentions of mills"));
        assert!(!rendered.contains('●'));
        assert!(rendered.contains("Tag: \"Reform\""));
    }

    #[test]
    fn examples_render_label_text_pairs_from_offsets() {
        let dir = TempDir::new().unwrap();
        write_example(&dir, "a.json");

        let rendered = few_shot_examples(dir.path(), 5).unwrap();
        assert!(rendered.contains("--- News article ---"));
        assert!(rendered.contains("The boy worked."));
        assert!(rendered.contains("Label: Work\nText: \"worked\""));
        // Chunk without begin defaults to 0; missing label gets a placeholder.
        assert!(rendered.contains("Label: unknown label\nText: \"The\""));
    }

    #[test]
    fn example_count_is_capped() {
        let dir = TempDir::new().unwrap();
        write_example(&dir, "a.json");
        write_example(&dir, "b.json");
        write_example(&dir, "c.json");

        let rendered = few_shot_examples(dir.path(), 2).unwrap();
        assert_eq!(rendered.matches("--- News article ---").count(), 2);
    }

    #[test]
    fn full_prompt_sandwiches_the_article() {
        let dir = TempDir::new().unwrap();
        let tagset = write_tagset(&dir);
        write_example(&dir, "a.json");

        let builder = PromptBuilder::from_exports(&tagset, dir.path(), 5).unwrap();
        let prompt = builder.build_for("A new article about the mill.");

        assert!(prompt.starts_with("You are a history expert"));
        assert!(prompt.contains("A new article about the mill."));
        assert!(prompt.trim_end().ends_with("--- Annotations ---"));
        // The target article comes after the examples.
        let article_pos = prompt.rfind("A new article").unwrap();
        let example_pos = prompt.find("The boy worked.").unwrap();
        assert!(example_pos < article_pos);
    }
}
