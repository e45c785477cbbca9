//! Heuristic section extractor. Recovers the section taxonomy with ordered
//! header patterns. No network, never fails, always yields at least one section.
//!
//! Rules are evaluated in a fixed priority order. Within a rule, earlier
//! patterns win; the first candidate whose body passes the length check and the
//! rule's content filter becomes the section. A title already in the output is
//! never replaced.
//!
//! A section body starts after its header (on the same line when text follows
//! the header, otherwise on the next non-blank line) and runs until a blank
//! line, a line that is itself a bare header (`Benefits`, `Requirements:`), a
//! `Label:` line such as `Salary: ...`, or the end of the text. A header whose
//! next non-blank line is another header has an empty body.
//!
//! Headers may be decorated as `## Title`, `**Title**` or `__Title__`. A list
//! marker followed by whitespace (`* Experience with ...`) is an item, not a
//! header.

use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::parsing::extractor::{ExtractError, Extractor};
use crate::parsing::normalize::clean_text;
use crate::parsing::sections::{
    ParsedDescription, ParsedSection, SectionContent, SectionTitle, FALLBACK_TITLE,
};

/// Bodies of this many characters or fewer are not a section.
const MIN_BODY_CHARS: usize = 30;

const ABOUT_COMPANY: &[&str] = &[
    r"about (?:us|the company|our company|.{1,20} company)",
    r"company description|who we are|we are .{1,20}",
    r"our story|our mission|our values",
];

const ABOUT_ROLE: &[&str] = &[
    r"about the (?:role|position|job|opportunity)",
    r"role overview|job overview|position overview|position summary|job summary",
    r"we are looking for|we are seeking|we need",
];

const RESPONSIBILITIES: &[&str] = &[
    r"responsibilities|duties|what you['’]ll do|what you will do|job duties|day to day|day-to-day|in this role you will|your role|you will be responsible for",
    r"your responsibilities include|as an? .{1,30}, you will|as the .{1,30}, you will",
];

const REQUIREMENTS: &[&str] = &[
    r"requirements|qualifications|what you['’]ll need|what you need|what we are looking for|job requirements|you should have",
    r"what you['’]ll bring|what you will bring|what you need to have|who you are",
];

const SKILLS: &[&str] = &[
    r"skills|technical skills|technical requirements|technical qualifications|you should know|you must know|must have skills|required skills",
    r"professional skills|soft skills|technical proficiency|tech stack|programming languages|tools & technologies|tools and technologies",
];

const EDUCATION: &[&str] = &[
    r"education|academic|educational requirements|academic requirements|degree requirements|academic qualifications",
];

/// The fact itself is the header; the matched text stays in the body.
const EDUCATION_INLINE: &[&str] = &[r"bachelor['’]?s|master['’]?s|degree|diploma"];

const EXPERIENCE: &[&str] = &[
    r"experience|professional experience|work experience|years of experience|minimum experience",
];

const EXPERIENCE_INLINE: &[&str] =
    &[r"\d+\+? years|at least \d+\+? years|minimum of \d+\+? years"];

const BENEFITS: &[&str] = &[
    r"benefits|perks|what we offer|what['’]s in it for you|you['’]ll receive|we provide|our offering|compensation|what to expect",
    r"our benefits|compensation and benefits|in return we offer|package includes|we offer|why work (?:for|with) us",
];

const ADDITIONAL: &[&str] = &[
    r"additional information|more information|to apply|application process|other information|notes",
    r"about the process|how to apply|equal opportunity|diversity|inclusion|accessibility",
];

/// Leading markdown decoration allowed before a header word.
const HEADER_PREFIX: &str = r"[ \t]*(?:#+[ \t]*|\*\*|__)?";

struct HeaderPattern {
    regex: Regex,
    keep_header: bool,
}

struct SectionRule {
    title: SectionTitle,
    patterns: Vec<HeaderPattern>,
    accept: Option<fn(&str) -> bool>,
}

fn header_pattern(alternation: &str, keep_header: bool) -> HeaderPattern {
    HeaderPattern {
        regex: Regex::new(&format!(r"(?im)^{HEADER_PREFIX}((?:{alternation})\b)"))
            .expect("Invalid section header regex"),
        keep_header,
    }
}

fn rule(
    title: SectionTitle,
    headers: &[&str],
    inline: &[&str],
    accept: Option<fn(&str) -> bool>,
) -> SectionRule {
    let patterns = headers
        .iter()
        .map(|alt| header_pattern(alt, false))
        .chain(inline.iter().map(|alt| header_pattern(alt, true)))
        .collect();
    SectionRule {
        title,
        patterns,
        accept,
    }
}

/// About-style sections must not swallow role content.
fn not_role_content(body: &str) -> bool {
    let lower = body.to_lowercase();
    !["responsibilit", "requirement", "qualification"]
        .iter()
        .any(|kw| lower.contains(kw))
}

static RULES: Lazy<Vec<SectionRule>> = Lazy::new(|| {
    vec![
        rule(SectionTitle::AboutCompany, ABOUT_COMPANY, &[], Some(not_role_content)),
        rule(SectionTitle::AboutRole, ABOUT_ROLE, &[], Some(not_role_content)),
        rule(SectionTitle::Responsibilities, RESPONSIBILITIES, &[], None),
        rule(SectionTitle::Requirements, REQUIREMENTS, &[], None),
        rule(SectionTitle::Skills, SKILLS, &[], None),
        rule(SectionTitle::Education, EDUCATION, EDUCATION_INLINE, None),
        rule(SectionTitle::Experience, EXPERIENCE, EXPERIENCE_INLINE, None),
        rule(SectionTitle::Benefits, BENEFITS, &[], None),
        rule(SectionTitle::AdditionalInformation, ADDITIONAL, &[], None),
    ]
});

/// A line consisting of a known header alone, optionally followed by a colon.
static BARE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = [
        ABOUT_COMPANY,
        ABOUT_ROLE,
        RESPONSIBILITIES,
        REQUIREMENTS,
        SKILLS,
        EDUCATION,
        EXPERIENCE,
        BENEFITS,
        ADDITIONAL,
    ]
    .iter()
    .flat_map(|family| family.iter())
    .copied()
    .collect::<Vec<_>>()
    .join("|");
    Regex::new(&format!(
        r"(?i)^{HEADER_PREFIX}(?:{alternation})[ \t]*(?:\*\*|__)?[ \t]*(?::|\r?\n?$)"
    ))
    .expect("Invalid bare header regex")
});

/// `Salary: ...`, `Location: ...`: a labelled fact that ends a paragraph.
static LABEL_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*[A-Z][A-Za-z ]{1,30}:").expect("Invalid label line regex"));

static LIST_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\n)[ \t]*(?:•|\*|-|\d+[.)]|\([a-z0-9]\))[ \t]+").expect("Invalid list marker regex")
});

static EDUCATION_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:degree|education|bachelor|master|ph\.?d|diploma|mba)")
        .expect("Invalid education keyword regex")
});

static EXPERIENCE_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+\+?\s*(?:years?|yrs)\b|\bexperience (?:in|with)\b|\byears of experience\b")
        .expect("Invalid experience keyword regex")
});

/// Parses `text` with header patterns only.
pub fn heuristic_extract(text: &str) -> ParsedDescription {
    let mut sections: Vec<ParsedSection> = Vec::new();
    let mut seen: HashSet<SectionTitle> = HashSet::new();

    for rule in RULES.iter() {
        if seen.contains(&rule.title) {
            continue;
        }
        if let Some(section) = extract_rule(text, rule) {
            seen.insert(rule.title);
            sections.push(section);
        }
    }

    let mut hoisted = Vec::new();
    for (title, keyword) in [
        (SectionTitle::Education, &*EDUCATION_KEYWORD_RE),
        (SectionTitle::Experience, &*EXPERIENCE_KEYWORD_RE),
    ] {
        if seen.contains(&title) {
            continue;
        }
        if let Some(section) = hoist_from_requirements(&mut sections, title, keyword) {
            debug!("Hoisted '{}' out of Requirements", title.as_str());
            seen.insert(title);
            hoisted.push(section);
        }
    }
    if let Some(pos) = sections
        .iter()
        .position(|s| s.title == SectionTitle::Requirements.as_str())
    {
        for (offset, section) in hoisted.into_iter().enumerate() {
            sections.insert(pos + 1 + offset, section);
        }
    }

    if sections.is_empty() {
        debug!("No sections matched; returning the whole text as '{FALLBACK_TITLE}'");
        sections.push(ParsedSection::paragraph(FALLBACK_TITLE, clean_text(text)));
    }

    ParsedDescription::heuristic(sections)
}

fn extract_rule(text: &str, rule: &SectionRule) -> Option<ParsedSection> {
    for (index, pattern) in rule.patterns.iter().enumerate() {
        for caps in pattern.regex.captures_iter(text) {
            let (Some(whole), Some(head)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start = if pattern.keep_header {
                head.start()
            } else {
                body_start(text, whole.end())
            };
            let end = body_end(text, start);
            let body = text[start..end].trim();

            if body.chars().count() <= MIN_BODY_CHARS {
                continue;
            }
            if let Some(accept) = rule.accept {
                if !accept(body) {
                    debug!(
                        "'{}' pattern {} matched but the content filter rejected it",
                        rule.title.as_str(),
                        index + 1
                    );
                    continue;
                }
            }
            if let Some(section) = classify(rule.title.as_str(), body).cleaned() {
                debug!(
                    "'{}' extracted by pattern {} ({} chars)",
                    rule.title.as_str(),
                    index + 1,
                    body.len()
                );
                return Some(section);
            }
        }
    }
    None
}

/// Byte offset where the body of a header ending at `header_end` begins.
fn body_start(text: &str, header_end: usize) -> usize {
    let rest = &text[header_end..];
    let line_end = rest.find('\n').unwrap_or(rest.len());
    let inline = rest[..line_end]
        .trim_start_matches(|c: char| c == ':' || c == '*' || c == '_' || c.is_whitespace());
    if !inline.trim().is_empty() {
        return header_end + (line_end - inline.len());
    }

    // Header stands alone: the body starts at the next non-blank line.
    let mut offset = header_end + line_end;
    for line in text[offset..].split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        offset += line.len();
    }
    offset
}

fn body_end(text: &str, start: usize) -> usize {
    let mut end = start;
    for (i, line) in text[start..].split_inclusive('\n').enumerate() {
        if line.trim().is_empty() || BARE_HEADER_RE.is_match(line) {
            break;
        }
        // Inline bodies may themselves contain a colon.
        if i > 0 && LABEL_LINE_RE.is_match(line) {
            break;
        }
        end += line.len();
    }
    end
}

fn classify(title: &str, body: &str) -> ParsedSection {
    if LIST_MARKER_RE.is_match(body) {
        let items = LIST_MARKER_RE
            .split(body)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect();
        ParsedSection::list(title, items)
    } else {
        ParsedSection::paragraph(title, body)
    }
}

/// Moves keyword-matching items out of Requirements into their own section,
/// but only when they are a minority (fewer than half) of its items/sentences.
fn hoist_from_requirements(
    sections: &mut [ParsedSection],
    title: SectionTitle,
    keyword: &Regex,
) -> Option<ParsedSection> {
    let requirements = sections
        .iter_mut()
        .find(|s| s.title == SectionTitle::Requirements.as_str())?;

    match &requirements.content {
        SectionContent::Items(items) => {
            let (matched, rest) = partition_minority(items.clone(), keyword)?;
            requirements.content = SectionContent::Items(rest);
            Some(ParsedSection::list(title.as_str(), matched))
        }
        SectionContent::Text(text) => {
            let (matched, rest) = partition_minority(split_sentences(text), keyword)?;
            requirements.content = SectionContent::Text(rest.join(" "));
            Some(ParsedSection::paragraph(title.as_str(), matched.join(" ")))
        }
    }
}

fn partition_minority(units: Vec<String>, keyword: &Regex) -> Option<(Vec<String>, Vec<String>)> {
    let total = units.len();
    let (matched, rest): (Vec<String>, Vec<String>) =
        units.into_iter().partition(|unit| keyword.is_match(unit));
    if matched.is_empty() || matched.len() * 2 >= total {
        return None;
    }
    Some((matched, rest))
}

/// Splits prose on line breaks and sentence-ending punctuation.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for line in text.lines() {
        let mut current = String::new();
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            current.push(c);
            let at_boundary = matches!(c, '.' | '!' | '?' | ';')
                && chars.peek().map_or(true, |next| next.is_whitespace());
            if at_boundary {
                push_sentence(&mut sentences, &current);
                current.clear();
            }
        }
        push_sentence(&mut sentences, &current);
    }
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

/// Pattern-only extractor. Infallible; wrapped in `Result` to share the trait.
pub struct HeuristicExtractor;

#[async_trait]
impl Extractor for HeuristicExtractor {
    async fn extract(&self, text: &str) -> Result<ParsedDescription, ExtractError> {
        Ok(heuristic_extract(text))
    }
}
