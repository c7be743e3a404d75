#[cfg(test)]
mod tests;

const SUMMARY_TEMPLATE: &str = r#"Create a {detail} summary of this document in EXACTLY {words} words. Do not exceed this word count.

Document:
{context}

Instructions:
- Write exactly {words} words
{instructions}

Summary:"#;

const ANSWER_TEMPLATE: &str = r#"Answer the question using ONLY the document excerpts below. Each excerpt is labelled with its location.

Excerpts:
{context}

Question: {question}

Instructions:
- If the excerpts do not contain the answer, say so plainly instead of guessing
- Justify your answer by citing the page or segment label it comes from

Answer:"#;

const CHALLENGE_TEMPLATE: &str = r#"Read the following document excerpts and write exactly 3 questions that test understanding of them.

Excerpts:
{context}

Instructions:
- Put each question on its own line
- Do not number the questions or add bullets
- End each question with a single question mark
- Output only the questions

Questions:"#;

const EVALUATION_TEMPLATE: &str = r#"Read the document excerpts, the question and the user's answer. Evaluate whether the answer is correct.

Excerpts:
{context}

Question: {question}
User's answer: {answer}

Give short feedback saying whether the answer is correct, partially correct or incorrect, and justify it with a reference to the excerpts.

Feedback:"#;

/// Level of detail asked of a summary, chosen from its word target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryDetail {
    Concise,
    Detailed,
    Comprehensive,
}

impl SummaryDetail {
    #[inline]
    pub fn for_target(target_words: u32) -> Self {
        match target_words {
            0..=200 => Self::Concise,
            201..=400 => Self::Detailed,
            _ => Self::Comprehensive,
        }
    }

    fn adjective(self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Detailed => "detailed",
            Self::Comprehensive => "comprehensive",
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            Self::Concise => "- Focus on main points and key findings\n- Be concise but complete",
            Self::Detailed => {
                "- Include main points, methodology, key findings, and conclusions\n\
                 - Structure the summary clearly"
            }
            Self::Comprehensive => {
                "- Include main points, methodology, key findings, conclusions, and important details\n\
                 - Structure the summary with clear sections\n\
                 - Be thorough and detailed"
            }
        }
    }
}

#[inline]
pub fn summary_prompt(context: &str, target_words: u32) -> String {
    let detail = SummaryDetail::for_target(target_words);
    let words = target_words.to_string();
    fill(
        SUMMARY_TEMPLATE,
        &[
            ("detail", detail.adjective()),
            ("words", words.as_str()),
            ("instructions", detail.instructions()),
            ("context", context),
        ],
    )
}

#[inline]
pub fn answer_prompt(context: &str, question: &str) -> String {
    fill(ANSWER_TEMPLATE, &[("context", context), ("question", question)])
}

#[inline]
pub fn challenge_prompt(context: &str) -> String {
    fill(CHALLENGE_TEMPLATE, &[("context", context)])
}

#[inline]
pub fn evaluation_prompt(context: &str, question: &str, answer: &str) -> String {
    let answer = if answer.trim().is_empty() {
        "(no answer given)"
    } else {
        answer
    };
    fill(
        EVALUATION_TEMPLATE,
        &[("context", context), ("question", question), ("answer", answer)],
    )
}

/// Substitute `{key}` placeholders in one pass; substituted text is never rescanned
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let placeholder = values.iter().find_map(|(key, value)| {
            let after = tail.strip_prefix(key)?.strip_prefix('}')?;
            Some((*value, after))
        });

        match placeholder {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}
