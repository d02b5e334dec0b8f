//! Data Transfer Objects for REST request/response serialization.
//!
//! Query results from the service layer are serialized as-is; these types
//! only add the envelope identifying what was queried.

pub mod completion_dto;
pub mod course_dto;
pub mod student_dto;

pub use completion_dto::*;
pub use course_dto::*;
pub use student_dto::*;
