pub mod builders;
pub mod fake_tool;
pub mod sinks;
