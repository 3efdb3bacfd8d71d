pub mod account_locks;
pub mod accounts;
pub mod column_inference;
pub mod compliance_lists;
pub mod credit_calculator;
pub mod scrub_engine;
pub mod scrub_file;
pub mod scrub_options;
pub mod suppression_list;
pub mod suppression_oracle;
