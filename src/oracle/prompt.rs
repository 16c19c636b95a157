//! Prompt construction for file scans

use crate::models::Standard;
use crate::scanner::Language;

/// Everything the prompt needs to know about one file
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    pub filepath: &'a str,
    pub language: Language,
    pub framework: Option<&'a str>,
    pub content: &'a str,
    pub context: Option<&'a str>,
    /// Ask for `fixed_content` and `changes_made` in the response
    pub include_fix: bool,
}

/// Build the single-turn scan prompt
///
/// Layout: system preamble with the standard summaries, optional retrieved
/// guidance, the task and response shape, then the file body.
pub fn build_scan_prompt(request: &PromptRequest) -> String {
    let mut prompt = String::from(
        "You are a security expert specializing in compliance standards: \
         PCI-DSS, SOC2, HIPAA, GDPR, and the OWASP Top 10.\n\nCompliance context:\n",
    );
    for standard in Standard::all_standards() {
        prompt.push_str(&format!("- {}: {}\n", standard.id, standard.summary));
    }

    if let Some(context) = request.context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\nRetrieved guidance:\n");
        prompt.push_str(context.trim());
        prompt.push('\n');
    }

    let subject = match request.framework {
        Some(framework) => format!("{} ({})", request.language, framework),
        None => request.language.to_string(),
    };
    prompt.push_str(&format!(
        "\nAnalyze this {} code from {} for security and compliance violations.\n\n",
        subject, request.filepath
    ));

    prompt.push_str(
        "Respond with ONLY a JSON object, no other text:\n\
         {\"issues\": [{\"line\": <exact_line_number>, \"severity\": \"critical|high|medium|low\", \
         \"category\": \"<type>\", \"description\": \"<what_you_found>\", \"cvss\": <score>, \
         \"compliance_violations\": [\"<standard>\"], \"remediation\": \"<fix>\"}]",
    );
    if request.include_fix {
        prompt.push_str(
            ", \"fixed_content\": \"<complete fixed file>\", \"changes_made\": [\"<change>\"]}\n\n\
             Return the complete corrected file in fixed_content and one entry in changes_made \
             per edit. Keep everything that is not a fix byte-for-byte identical.",
        );
    } else {
        prompt.push('}');
    }

    prompt.push_str(&format!("\n\nCode:\n```\n{}\n```", request.content));
    prompt
}
