pub mod extractor;
pub mod handlers;
pub mod heuristic;
pub mod job_details;
pub mod llm_extractor;
pub mod normalize;
pub mod posting;
pub mod prompts;
pub mod sections;
