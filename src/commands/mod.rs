pub mod harvest;
pub mod links;

// Re-export command functions for convenience
pub use harvest::{employer_pages, employers, vacancies};
pub use links::links;
