pub mod day_plans;
pub mod transcript;
