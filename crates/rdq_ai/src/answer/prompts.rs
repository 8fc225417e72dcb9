use super::NOT_IN_DOCUMENT;

pub fn answer_prompt(question: &str, evidence_blocks: &str) -> String {
    format!(
        r#"You answer questions about a risk-disclosure report using excerpts retrieved from it.

Rules (non-negotiable):
1) Use ONLY the excerpts provided below. Do not invent facts.
2) Every concrete claim MUST include an inline citation marker in the form [[chunk:<chunk_id>]].
3) Mention the page numbers given for each excerpt when you cite it.
4) If the excerpts do not answer the question, write {NOT_IN_DOCUMENT} alone on the first line, then one short sentence saying what is missing. Do not cite in that case.
5) Answer in the language of the question.

Question:
{question}

Excerpts:
{evidence_blocks}

Output:
- Return Markdown only.
- Include inline citations as specified, unless the first line is {NOT_IN_DOCUMENT}.
"#
    )
}
