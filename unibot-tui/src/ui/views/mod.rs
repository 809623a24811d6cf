mod dashboard;
mod questions;

pub use dashboard::DashboardView;
pub use questions::QuestionsView;
