//! Prompt templates for each kind of content.
//!
//! The body is interpolated verbatim; nothing is escaped or filtered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// System framing sent ahead of every prompt
pub const DOCUMENTATION_PREAMBLE: &str = "You are a helpful code documentation generator. \
Given the following code snippet, write clear and concise documentation.\n\n";

/// Template for code snippets
pub const CODE_TEMPLATE: &str = r#"
Analyze the following code and generate comprehensive technical documentation explaining:
- **Purpose**: What the code does and its main functionality
- **Input/Output**: Parameters, return values, and data flow
- **Logic & Algorithm**: Key algorithms, business logic, and implementation details
- **Edge Cases**: Potential issues, error handling, and boundary conditions
- **Dependencies**: External libraries, modules, or services used
- **Usage Examples**: How to use this code with practical examples
- **Best Practices**: Code quality, design patterns, and recommendations for improvement

Code:
```
{0}
```

Please provide detailed, well-structured technical documentation with clear sections:
"#;

/// Template for text extracted from PDFs
pub const PDF_TEMPLATE: &str = r#"
Analyze the following document content and generate comprehensive technical documentation explaining:
- Main concepts and topics covered
- Key technical details and specifications
- Important procedures or methodologies
- Practical applications and use cases
- Summary of key findings or conclusions

Document Content:
{0}

Please provide a well-structured technical documentation:
"#;

/// Template for repository summaries
pub const GITHUB_REPO_TEMPLATE: &str = r#"
Analyze the following GitHub repository and generate comprehensive project documentation explaining:
- Project overview and purpose
- Architecture and code structure
- Key components and their responsibilities
- Technologies and frameworks used
- Setup and installation instructions (if apparent)
- Usage examples and API documentation
- Code quality and best practices observed

Repository Analysis:
{0}

Please provide a detailed project documentation:
"#;

const BODY_PLACEHOLDER: &str = "{0}";

/// Kind of content being documented; selects the prompt template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// A code snippet
    #[default]
    Code,
    /// Text extracted from a PDF document
    Pdf,
    /// A summary of a GitHub repository
    GithubRepo,
}

impl ContentType {
    /// Maps a content-type tag to a variant; unknown tags mean `Code`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "pdf" => Self::Pdf,
            "github_repo" => Self::GithubRepo,
            _ => Self::Code,
        }
    }

    /// The tag for this variant
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Pdf => "pdf",
            Self::GithubRepo => "github_repo",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Code => CODE_TEMPLATE,
            Self::Pdf => PDF_TEMPLATE,
            Self::GithubRepo => GITHUB_REPO_TEMPLATE,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

/// A body of text together with its content type, consumed by [`build_prompt`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    /// Selects the template
    pub content_type: ContentType,
    /// Text embedded in the template
    pub body: String,
}

impl PromptContext {
    /// Creates a new prompt context
    pub fn new(content_type: ContentType, body: impl Into<String>) -> Self {
        Self {
            content_type,
            body: body.into(),
        }
    }

    /// Renders the prompt, consuming the context
    pub fn render(self) -> String {
        build_prompt(self.content_type, &self.body)
    }
}

/// Renders the template for `content_type` around `body`
pub fn build_prompt(content_type: ContentType, body: &str) -> String {
    // A single split keeps placeholders inside `body` untouched.
    let template = content_type.template();
    match template.split_once(BODY_PLACEHOLDER) {
        Some((head, tail)) => {
            let mut prompt = String::with_capacity(template.len() + body.len());
            prompt.push_str(head);
            prompt.push_str(body);
            prompt.push_str(tail);
            prompt
        }
        None => template.to_string(),
    }
}

/// Renders the prompt for a raw content-type tag
pub fn build_prompt_for_tag(tag: &str, body: &str) -> String {
    build_prompt(ContentType::from_tag(tag), body)
}

/// Prefixes the documentation system framing
pub fn wrap_with_preamble(prompt: &str) -> String {
    format!("{}{}", DOCUMENTATION_PREAMBLE, prompt)
}
