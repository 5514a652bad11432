//! Placeholder upload endpoint. No object store is contacted; the response
//! only has the shape a presigned POST would have.

pub mod routes;

pub use routes::routes;
