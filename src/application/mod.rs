pub mod finder;

pub use finder::{rejection_summary, FinderError, FinderReport, RateIds, XenftFinder};
