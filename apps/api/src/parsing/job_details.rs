//! Proposes job form fields (title, company, location, ...) from pasted text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parsing::normalize::{html_to_text, looks_like_html};

/// Candidate values for a new job, shown to the user before it is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub salary: String,
    pub job_type: String,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("Invalid job detail regex"))
        .collect()
}

static COMPANY_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\bat[ \t]+([A-Za-z0-9][\w \t&.,]+)",
        r"(?i)\b([A-Za-z0-9][\w \t&.,]*?)[ \t]+is[ \t]+looking",
        r"(?i)\bjoin[ \t]+([A-Za-z0-9][\w \t&.,]+)",
        r"(?i)\b([A-Za-z0-9][\w \t&.,]*?)[ \t]+(?:is hiring|has an opening)",
    ])
});

static LOCATION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?im)\blocation:?[ \t]*([A-Za-z0-9][\w \t,.-]*?)[ \t]*$",
        r"(?i)\bin[ \t]+([A-Za-z][\w \t.-]*?,[ \t]*[A-Za-z]+)(?:\s|$|,|\.|;)",
        r"(?i)\b(?:headquartered|based) in[ \t]+([A-Za-z][\w.-]*)",
    ])
});

static JOB_TYPE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(full[-\s]time|part[-\s]time|contract|freelance|temporary|internship)\b",
        r"(?im)\bemployment type:?[ \t]*([A-Za-z][\w \t-]*?)[ \t]*$",
    ])
});

static SALARY_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?im)\b(?:salary|compensation):?[ \t]*([^\n]*?\S)[ \t]*$",
        r"\$\s*\d+[kK]\s*-\s*\$\s*\d+[kK]",
        r"\$\s*\d{2,3},\d{3}\s*-\s*\$\s*\d{2,3},\d{3}",
        r"(?i)\$\d{2,3},\d{3}(?:\+\s*)?(?:annually|per year)?",
        r"(?i)\$\d{2,3}[kK](?:\+\s*)?(?:annually|per year)?",
    ])
});

/// Best-effort field extraction. Never fails; unknown fields are empty.
pub fn extract_job_details(raw: &str) -> JobDetails {
    let text = if looks_like_html(raw) {
        html_to_text(raw)
    } else {
        raw.to_string()
    };

    let title = text
        .lines()
        .take(10)
        .map(str::trim)
        .find(|line| !line.is_empty() && line.chars().count() < 100)
        .unwrap_or_default()
        .to_string();

    JobDetails {
        title,
        company: first_capture(&COMPANY_RES, &text).unwrap_or_default(),
        location: first_capture(&LOCATION_RES, &text).unwrap_or_default(),
        job_type: first_capture(&JOB_TYPE_RES, &text).unwrap_or_default(),
        salary: first_capture(&SALARY_RES, &text).unwrap_or_default(),
        url: String::new(),
        description: text,
    }
}

/// First pattern that matches wins. Uses the capture group when the pattern has one.
fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let found = caps.get(1).or_else(|| caps.get(0))?.as_str();
        let found = found
            .trim()
            .trim_end_matches(|c: char| c == '.' || c == ',')
            .trim();
        (!found.is_empty()).then(|| found.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_common_fields() {
        let text = "\
Senior Backend Engineer
ACME Tech Solutions is looking for talented engineers!
Location: Berlin, Germany
Employment Type: Full-time
Salary: $120k - $150k per year

Responsibilities
- Build APIs
";
        let details = extract_job_details(text);
        assert_eq!(details.title, "Senior Backend Engineer");
        assert_eq!(details.company, "ACME Tech Solutions");
        assert_eq!(details.location, "Berlin, Germany");
        assert_eq!(details.job_type, "Full-time");
        assert_eq!(details.salary, "$120k - $150k per year");
        assert_eq!(details.description, text);
        assert!(details.url.is_empty());
    }

    #[test]
    fn test_company_from_join_phrase() {
        let details = extract_job_details("Platform Engineer\nJoin Globex Corporation\n");
        assert_eq!(details.company, "Globex Corporation");
    }

    #[test]
    fn test_salary_range_without_label() {
        let details = extract_job_details("Data Analyst\nPays $90,000 - $110,000 plus bonus");
        assert_eq!(details.salary, "$90,000 - $110,000");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let details = extract_job_details("");
        assert_eq!(details, JobDetails::default());
    }

    #[test]
    fn test_skips_overlong_first_lines_for_title() {
        let long = "x".repeat(150);
        let details = extract_job_details(&format!("{long}\n\nProduct Designer\n"));
        assert_eq!(details.title, "Product Designer");
    }

    #[test]
    fn test_html_input_is_converted_first() {
        let details = extract_job_details("<h1>QA Engineer</h1><p>Location: Remote</p>");
        assert_eq!(details.title, "QA Engineer");
        assert_eq!(details.location, "Remote");
        assert!(!details.description.contains('<'));
    }
}
