//! Prompt templates for candidate summaries

use serde::{Deserialize, Serialize};

/// Which summary to ask the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    /// Five numbered sections for a hiring review.
    #[default]
    Full,
    /// Two or three sentences, no job description needed.
    Quick,
}

/// Parameters for prompt template substitution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptParams {
    pub resume_content: String,
    pub job_content: String,
    pub role_label: String,
}

impl PromptParams {
    pub fn new(resume: &str, job: &str, role_label: &str) -> Self {
        Self {
            resume_content: resume.to_string(),
            job_content: job.to_string(),
            role_label: role_label.to_string(),
        }
    }

    /// Cut both texts to at most `max_chars` characters.
    pub fn truncated(mut self, max_chars: usize) -> Self {
        self.resume_content = truncate_chars(&self.resume_content, max_chars);
        self.job_content = truncate_chars(&self.job_content, max_chars);
        self
    }
}

/// Prompt sent to hosted models.
pub fn render_summary_prompt(kind: SummaryKind, params: &PromptParams) -> String {
    let template = match kind {
        SummaryKind::Full => FULL_SUMMARY_TEMPLATE,
        SummaryKind::Quick => QUICK_SUMMARY_TEMPLATE,
    };
    template
        .replace("{role}", &params.role_label)
        .replace("{job}", &params.job_content)
        .replace("{resume}", &params.resume_content)
}

/// Zephyr-style chat prompt for small local chat models.
pub fn render_chat_prompt(kind: SummaryKind, params: &PromptParams) -> String {
    let template = match kind {
        SummaryKind::Full => LOCAL_CHAT_TEMPLATE,
        SummaryKind::Quick => LOCAL_QUICK_CHAT_TEMPLATE,
    };
    template
        .replace("{role}", &params.role_label)
        .replace("{job}", &params.job_content)
        .replace("{resume}", &params.resume_content)
}

/// Marker after which a local model's answer starts.
pub const ASSISTANT_MARKER: &str = "<|assistant|>";

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

const FULL_SUMMARY_TEMPLATE: &str = r#"
Please generate a professional AI summary of the candidate in numbered sections (1-5).

Job Description:
{job}

Candidate Resume:
{resume}

Instructions:
1. Use numbered sections exactly as:
   1. Candidate Profile Summary
   2. Candidate Fit Assessment for {role}
   3. Strengths and Potential Gaps
   4. Actionable Insights for Hiring Decision
   5. Recommendations
2. Write in third person, in paragraph format (no bullet points except in Recommendations).
3. In the Recommendations section, use "• " at the beginning of each recommendation item instead of "-" or numbers.
4. Use plain text only. Do NOT use Markdown formatting (**, _, etc.).
5. Keep the tone professional and suitable for HR reading.
6. Ensure each numbered section heading is followed by a paragraph summarizing the content.
"#;

const QUICK_SUMMARY_TEMPLATE: &str = r#"
Provide a brief professional summary of the candidate for {role} in paragraph form.

Resume:
{resume}

Instructions:
- Write in third person.
- Keep it concise (2-3 sentences).
- Plain text only, no Markdown formatting.
"#;

const LOCAL_CHAT_TEMPLATE: &str = "<|system|>
You are an HR assistant. Analyze this candidate's resume against the job description.
Summarize the candidate's suitability, key skills, and overall match.
</s>
<|user|>
Resume:
{resume}

Job Description:
{job}

Provide a short structured summary of the candidate's fit for the {role} role.
</s>
<|assistant|>";

const LOCAL_QUICK_CHAT_TEMPLATE: &str = "<|system|>
You are an HR assistant. Describe candidates briefly and in the third person.
</s>
<|user|>
Resume:
{resume}

Write a 2-3 sentence professional profile of this candidate for a {role} position.
</s>
<|assistant|>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_prompt_substitutes_every_placeholder() {
        let params = PromptParams::new("Alice, SQL", "Analyst wanted", "Data Analyst");
        let prompt = render_summary_prompt(SummaryKind::Full, &params);

        assert!(prompt.contains("Candidate Fit Assessment for Data Analyst"));
        assert!(prompt.contains("Analyst wanted"));
        assert!(prompt.contains("Alice, SQL"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_quick_prompt_omits_job() {
        let params = PromptParams::new("Alice", "SECRET JOB", "Engineer");
        let prompt = render_summary_prompt(SummaryKind::Quick, &params);
        assert!(prompt.contains("for Engineer"));
        assert!(!prompt.contains("SECRET JOB"));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let params = PromptParams::new("ééééé", "abc", "r").truncated(3);
        assert_eq!(params.resume_content, "ééé");
        assert_eq!(params.job_content, "abc");

        let chat = render_chat_prompt(SummaryKind::Full, &params);
        assert!(chat.ends_with(ASSISTANT_MARKER));
        assert!(chat.starts_with("<|system|>"));
    }

    #[test]
    fn test_chat_prompt_follows_summary_kind() {
        let params = PromptParams::new("Alice, SQL", "SECRET JOB", "Data Analyst");

        let full = render_chat_prompt(SummaryKind::Full, &params);
        assert!(full.contains("Job Description:\nSECRET JOB"));
        assert!(full.contains("the Data Analyst role"));

        let quick = render_chat_prompt(SummaryKind::Quick, &params);
        assert!(!quick.contains("Job Description"));
        assert!(!quick.contains("SECRET JOB"));
        assert!(quick.contains("2-3 sentence"));
        assert!(quick.contains("for a Data Analyst position"));
        assert!(quick.ends_with(ASSISTANT_MARKER));
        assert!(!quick.contains('{'));
    }
}
