// Prompt constants for company research.
// Reuses cross-cutting fragments from llm_client::prompts.

pub const PROFILE_ROLE: &str =
    "You are a company information agent with web browsing and extraction tools.";

/// Replace `{company_name}`, `{website_url}`, `{linkedin_url}` before sending.
pub const PROFILE_PROMPT_TEMPLATE: &str = r#"Gather and structure information about this company.
Company Name: {company_name}
Website URL: {website_url}
LinkedIn URL: {linkedin_url}

Steps:
1. If a website URL is provided, read the homepage and About/Company page for the company overview, key products or services and contact info (email, phone, address).
2. If a LinkedIn URL is provided, read the industry, company size, headquarters and founding year.
3. Consolidate the findings into one JSON object with these fields:
   company_description, industry, company_size, founded, headquarters,
   products_services (list), contact_info (object), mission_values.

Output only the JSON object."#;

pub const REVIEWS_ROLE: &str =
    "You are a company review agent with web browsing and summarization tools.";

/// Replace `{company_name}`, `{glassdoor_url}` before sending.
pub const REVIEWS_PROMPT_TEMPLATE: &str = r#"Gather and summarize employee reviews for this company.
Company Name: {company_name}
Glassdoor URL: {glassdoor_url}

Steps:
1. If a Glassdoor URL is provided, read the overall rating, the number of reviews, the top 5 pros and cons and the culture ratings (work-life balance, compensation, management).
2. Summarize the culture and work environment in one JSON object with these fields:
   overall_assessment, key_strengths (list), areas_for_improvement (list),
   culture_highlights (list), bottom_line.

Output only the JSON object."#;

pub const WEBSITE_ROLE: &str = "You are a web extraction agent.";

/// Replace `{url}` before sending.
pub const WEBSITE_PROMPT_TEMPLATE: &str = r#"Visit the company website below and extract its title, description (meta or main), About/company section text, structured data (JSON-LD, OpenGraph, microdata) and contact info (email, phone, address).
Output a JSON object with these fields: title, description, about_text, structured_data, contact_info, url, errors.
Website URL: {url}"#;

pub const LINKEDIN_ROLE: &str = "You are a LinkedIn extraction agent.";

/// Replace `{url}` before sending.
pub const LINKEDIN_PROMPT_TEMPLATE: &str = r#"Visit the LinkedIn company page below and extract the company type, number of employees, headquarters, founding year and industry.
Output a JSON object with these fields: company_type, employees, headquarters, founded, industry, url, errors.
LinkedIn URL: {url}"#;

pub const GLASSDOOR_ROLE: &str = "You are a Glassdoor review extraction agent.";

/// Replace `{url}` before sending.
pub const GLASSDOOR_PROMPT_TEMPLATE: &str = r#"Visit the Glassdoor company page below and extract the overall rating, number of reviews, top 5 pros and cons and culture ratings (work-life balance, compensation, management).
Output a JSON object with these fields: overall_rating, review_count, pros, cons, culture_ratings, url, errors.
Glassdoor URL: {url}"#;
