use super::types::InvocationRequest;
use crate::error::LlmError;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "document_qa";

/// Prompt sent to every provider. Binds `context` and `question`.
pub const DOCUMENT_QA_TEMPLATE: &str = r"
Role:
    You are a document insights provider. Your task is to generate well-structured responses using tables, bullet points,
    or well-formatted paragraphs when appropriate.

Guidelines:
    - Use only the provided document as the source of truth.
    - Do not generate information beyond the given context (avoid hallucinations).
    - Ensure responses are clear, structured, and directly relevant to the question.

Input:
    - Context: {{ context }}
    - Question: {{ question }}

Output Format:
    Provide a response that is:
        - Concise yet informative.
        - Properly structured (e.g., tables, bullet points, or paragraphs based on content type).
        - Strictly based on the given document.
";

/// Tera-backed renderer for the document QA prompt.
pub struct PromptTemplate {
    tera: Tera,
}

impl PromptTemplate {
    pub fn new() -> Result<Self, LlmError> {
        Self::from_source(DOCUMENT_QA_TEMPLATE)
    }

    /// Build from a custom template; it must reference `context` and `question`.
    pub fn from_source(source: &str) -> Result<Self, LlmError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(|e| LlmError::Prompt(e.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render(&self, request: &InvocationRequest) -> Result<String, LlmError> {
        let mut ctx = Context::new();
        ctx.insert("context", &request.context);
        ctx.insert("question", &request.question);
        self.tera
            .render(TEMPLATE_NAME, &ctx)
            .map_err(|e| LlmError::Prompt(e.to_string()))
    }
}
