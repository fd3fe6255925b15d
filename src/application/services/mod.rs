//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem)
//! but are themselves concrete structs, not traits.

mod precheck;
mod review;

pub use precheck::{PrecheckRequest, PrecheckService};
pub use review::{
    group_for_review, student_id_from_file_name, ReviewEntry, ReviewGroup, ReviewService,
    REFERENCE_OWNER,
};
