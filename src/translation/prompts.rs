/*!
 * Instruction templates sent with every batch.
 *
 * The default template explains the token rules and the response format.
 * A project may replace the body with its own file (for example to describe
 * the product being localised) and append free-form extra instructions.
 */

use anyhow::{Context, Result};
use std::path::Path;

/// Instruction template rendered once per run
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
    /// Text appended after the rendered template
    extra: Option<String>,
}

impl PromptTemplate {
    /// The default instruction body
    pub const LOCALIZATION_ENGINE: &'static str = r#"You are a professional localization engine. You translate in-game and in-app text from {source_language} to {target_language}.

GENERAL RULES
1. Technical tokens:
   - Never modify, translate or reorder technical tokens like __VAR0__, __VAR1__, __TAG0__, etc.
   - They stand for placeholders or markup and must stay exactly as they are, in the same position.
   - If the source contains tokens, the translation MUST contain exactly the same tokens in the same order. Do not remove them, even if you change the wording.

2. Source format:
   - Each entry has a 'key' (identifier), a 'sheet' name and an optional 'comment' that gives context.
   - Use the 'sheet' and 'comment' to adapt the tone. Short UI labels stay short.

3. Gendered keys:
   - A key ending with "_M" refers to a male character, "_F" to a female character.
   - Only adapt gender where the text actually refers to that person.

4. General constraints:
   - Do not add meaning and do not omit important information.
   - Keep the register of the source.
   - Avoid making the text significantly longer than the source.

RESPONSE FORMAT
- Do NOT add explanations or comments.
- Answer strictly as valid JSON with this structure:
{
  "translations": [
    { "key": "KEY_FROM_INPUT", "text": "Translated text here" }
  ]
}
- Return exactly one translation per segment provided in the input."#;

    /// Create a template from a raw string
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            extra: None,
        }
    }

    /// The built-in localization template
    pub fn localization_engine() -> Self {
        Self::new(Self::LOCALIZATION_ENGINE)
    }

    /// Load a template body from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read instructions file: {}", path.display()))?;
        Ok(Self::new(template.trim()))
    }

    /// Append extra instructions after the template body
    pub fn with_extra(mut self, extra: Option<&str>) -> Self {
        self.extra = extra
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        self
    }

    /// Render the template for a language pair
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        let mut rendered = self
            .template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language);

        if let Some(extra) = &self.extra {
            rendered.push_str("\n\nADDITIONAL INSTRUCTIONS\n");
            rendered.push_str(extra);
        }

        rendered
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::localization_engine()
    }
}
