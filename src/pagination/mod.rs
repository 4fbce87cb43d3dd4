//! Pagination module
//!
//! Supports: Page Number, Next Page Link, Single Request
//!
//! # Overview
//!
//! Each strategy derives the next request from the previous response and
//! decides when the collection has been read completely. Strategies are
//! plain values chosen per stream, independent of the HTTP client.

mod strategies;
mod types;

pub use strategies::{next_page_link, NextPageLinkPaginator, PageNumberPaginator, SinglePaginator};
pub use types::{NextPage, PaginationState, Paginator};
