// Prompt constants for job-description parsing.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Role half of the system prompt; joined with the JSON-only fragment at call time.
pub const JD_SECTIONS_ROLE: &str = "You are an expert job description parser. \
    Split postings into strictly distinct, non-overlapping sections. \
    Accuracy and the non-overlap rule matter more than anything else.";

/// Section extraction prompt. Replace `{section_titles}` and `{jd_text}` before sending.
pub const JD_SECTIONS_PROMPT_TEMPLATE: &str = r#"Read the job description below carefully and split it into sections.

RULES:
1. NO OVERLAP: every detail appears in exactly one section.
2. SPECIFICITY WINS: a detail that fits several sections goes only into the most specific one (a skill named inside a duty belongs to "Skills").
3. OMIT EMPTY SECTIONS: include a section only when the text has content for it. No placeholders.
4. COMPLETENESS: every relevant detail of the posting lands in some section.
5. FORMAT: choose "list" when the content is a set of separate items, otherwise "paragraph".

ALLOWED TITLES (use them verbatim, in this order):
{section_titles}

WHAT GOES WHERE:
- About the Company: overview, culture, mission. No role details.
- About the Role: what the position is and why it exists. No tasks or requirements.
- Responsibilities: concrete day-to-day duties. No skills or qualifications.
- Requirements: general prerequisites. Skills, degrees and years of experience go to their own sections.
- Skills: technical and soft skills (e.g. Python, SQL, communication).
- Education: explicit degree or schooling requirements.
- Experience: years or kinds of professional experience.
- Benefits: compensation, perks, insurance, time off.
- Additional Information: location, travel, how to apply, EOE statements, anything else.

Return a JSON object with this EXACT schema:
{
  "sections": [
    {"title": "Responsibilities", "type": "list", "content": ["Item 1", "Item 2"]},
    {"title": "About the Role", "type": "paragraph", "content": "One paragraph of text."}
  ]
}

Job description:
---
{jd_text}
---"#;
