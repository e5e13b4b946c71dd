//! gxg-core: input preparation and interaction testing for gxg
//!
//! Turns loaded tables into the response y, background matrix E,
//! fixed-effect matrix M and genotype g, checks that they agree on the
//! sample count, and runs the structured-LMM interaction test.

pub mod error;
pub mod lmm;
pub mod orchestrator;
pub mod prep;
pub mod result;
pub mod util;

pub use error::CoreError;
pub use orchestrator::{run_interaction_test, TestInputs};
pub use result::ResultRecord;
