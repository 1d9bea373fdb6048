//! Shared request/response types.

mod pagination;
mod response;

pub use pagination::{Paginated, PaginatedListings, PaginationMeta, PaginationParams};
pub use response::MessageResponse;
