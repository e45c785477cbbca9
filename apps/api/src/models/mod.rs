pub mod company;
pub mod job;
