// ATS scoring prompt templates. All prompts for the analysis module live here.

pub const ANALYZE_SYSTEM: &str = "\
You are an expert ATS (Applicant Tracking System) analyst. \
You score how well a resume will survive automated screening for a specific job posting. \
You MUST respond with valid JSON only — no markdown fences, no explanations. \
Scores are integers from 0 to 100. Be honest and specific; generic advice is useless.";

pub const ANALYZE_PROMPT: &str = r#"Score the following resume against the job description.

RESUME TEXT:
{resume_text}

JOB DESCRIPTION:
{job_description}

OUTPUT SCHEMA (return exactly this structure):
{
  "overallScore": 0-100,
  "keywordAnalysis": {
    "foundKeywords": ["string"],
    "missingKeywords": ["string"],
    "matchPercentage": 0-100
  },
  "atsFormattingScore": {
    "score": 0-100,
    "issues": ["string"]
  },
  "experienceRelevance": {
    "score": 0-100,
    "strengths": ["string"],
    "gaps": ["string"]
  },
  "actionableAdvice": ["string"],
  "modelIdentity": "the model name you are running as"
}

RULES:
1. foundKeywords and missingKeywords must come from the job description, not invented.
2. actionableAdvice must be concrete edits the candidate can make, 3 to 6 items.
3. overallScore must reflect keyword match, formatting, and experience relevance together.
4. Return ONLY the JSON object — nothing else, no code fences."#;

/// Renders the fixed analysis prompt with both texts embedded verbatim.
pub fn build_analysis_prompt(resume_text: &str, job_description: &str) -> String {
    ANALYZE_PROMPT
        .replace("{resume_text}", resume_text)
        .replace("{job_description}", job_description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_inputs_verbatim() {
        let prompt = build_analysis_prompt("TEN YEARS OF RUST", "Seeking a staff engineer");
        assert!(prompt.contains("TEN YEARS OF RUST"));
        assert!(prompt.contains("Seeking a staff engineer"));
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains("{job_description}"));
    }

    #[test]
    fn test_prompt_documents_required_fields() {
        assert!(ANALYZE_PROMPT.contains("overallScore"));
        assert!(ANALYZE_PROMPT.contains("keywordAnalysis"));
        assert!(ANALYZE_PROMPT.contains("atsFormattingScore"));
    }
}
