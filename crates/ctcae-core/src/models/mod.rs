pub mod grade;
pub mod matching;
pub mod record;
pub mod term;
