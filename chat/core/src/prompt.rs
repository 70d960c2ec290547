//! Prompt Template
//!
//! Builds the ChatML prompt sent to the inference endpoint: a system turn,
//! a user turn holding the formatting rules and the question, and an opened
//! assistant turn for the model to continue. Rendering is a pure function of
//! its inputs so it can be tested without a network.

use serde::{Deserialize, Serialize};

/// Default system instruction
pub const DEFAULT_SYSTEM_PREAMBLE: &str = "Bạn là một trợ lí Tiếng Việt nhiệt tình và trung thực. \
Hãy luôn trả lời một cách hữu ích nhất có thể.";

/// Default heading placed above the formatting rules
pub const DEFAULT_RULES_HEADING: &str = "Chú ý các yêu cầu sau:";

/// Default formatting rules
pub const DEFAULT_FORMATTING_RULES: &[&str] = &[
    "Nếu câu hỏi là một lời chào hay tạm biệt, hãy đáp lại lời chào hỏi một cách phù hợp.",
    "Hãy trả lời câu hỏi một cách ngắn gọn súc tích.",
];

const QUESTION_HEADING: &str = "### Câu hỏi :";
const ANSWER_HEADING: &str = "### Trả lời :";

/// Render the full prompt for `query`
///
/// `formatting_rules` is inserted verbatim at the top of the user turn.
#[must_use]
pub fn render_prompt(system_preamble: &str, formatting_rules: &str, query: &str) -> String {
    format!(
        "<|im_start|>system\n\
         {system_preamble}<|im_end|>\n\
         <|im_start|>user\n\
         {formatting_rules}\n\
         \n\
         {QUESTION_HEADING}\n\
         {query}\n\
         \n\
         {ANSWER_HEADING}<|im_end|>\n\
         <|im_start|>assistant\n"
    )
}

/// Configurable prompt template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// System instruction
    pub system_preamble: String,
    /// Heading above the rule list
    pub rules_heading: String,
    /// One rule per bullet
    pub formatting_rules: Vec<String>,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system_preamble: DEFAULT_SYSTEM_PREAMBLE.to_string(),
            rules_heading: DEFAULT_RULES_HEADING.to_string(),
            formatting_rules: DEFAULT_FORMATTING_RULES
                .iter()
                .map(|r| (*r).to_string())
                .collect(),
        }
    }
}

impl PromptTemplate {
    /// The rules block: heading followed by `- ` bullets
    #[must_use]
    pub fn rules_block(&self) -> String {
        let mut block = self.rules_heading.clone();
        for rule in &self.formatting_rules {
            block.push_str("\n- ");
            block.push_str(rule);
        }
        block
    }

    /// Render the prompt for a question
    #[must_use]
    pub fn render(&self, query: &str) -> String {
        render_prompt(&self.system_preamble, &self.rules_block(), query)
    }
}
