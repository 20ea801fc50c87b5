pub mod aggregator;
pub mod charge;
pub mod eligibility;
pub mod schedule;
pub mod selector;
