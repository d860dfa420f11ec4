//! Pull-based query operators.

mod aggregate;
mod aggregator;
mod delete;
mod filter;
mod insert;
mod operator;
mod predicate;
mod seq_scan;
mod values_scan;

pub use aggregate::Aggregate;
pub use aggregator::{AggregateOp, Aggregator, IntegerAggregator, StringAggregator};
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use operator::{Operator, OperatorState};
pub use predicate::Predicate;
pub use seq_scan::SeqScan;
pub use values_scan::ValuesScan;
