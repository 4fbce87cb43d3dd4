//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{NextPage, PaginationState, Paginator};
use serde_json::Value;

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Requests `?page=N&per_page=M` starting at page 1 and stops at the first
/// empty page. A short page is not treated as the last one, so a collection
/// that grows or shrinks mid-sync is still read to the end.
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    /// Query parameter name for page number
    pub page_param: String,
    /// First page number
    pub start_page: u32,
    /// Query parameter name for page size
    pub page_size_param: String,
    /// Page size value
    pub page_size: u32,
}

impl PageNumberPaginator {
    /// Create a paginator using `page`/`per_page` with the given page size
    pub fn new(page_size: u32) -> Self {
        Self {
            page_param: "page".to_string(),
            start_page: 1,
            page_size_param: "per_page".to_string(),
            page_size,
        }
    }

    fn params_for(&self, page: u32) -> Vec<(String, String)> {
        vec![
            (self.page_param.clone(), page.to_string()),
            (self.page_size_param.clone(), self.page_size.to_string()),
        ]
    }
}

impl Paginator for PageNumberPaginator {
    fn initial_params(&self, state: &PaginationState) -> Vec<(String, String)> {
        let page = if state.page == 0 {
            self.start_page
        } else {
            state.page
        };
        self.params_for(page)
    }

    fn process_response(
        &self,
        _body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        if records_count == 0 {
            state.mark_done();
            return NextPage::Done;
        }

        if state.page == 0 {
            state.page = self.start_page;
        }
        state.next_page();

        NextPage::with_params(self.params_for(state.page))
    }
}

// ============================================================================
// Next Page Link Pagination
// ============================================================================

/// Server-issued link pagination
///
/// The first request carries `per_page`; after that the URL found at
/// `meta.links.next_page` is requested verbatim. Pagination ends only when
/// that link is absent, null or empty.
#[derive(Debug, Clone)]
pub struct NextPageLinkPaginator {
    /// Query parameter name for page size
    pub page_size_param: String,
    /// Page size value
    pub page_size: u32,
}

impl NextPageLinkPaginator {
    /// Create a new link paginator with the given page size
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size_param: "per_page".to_string(),
            page_size,
        }
    }
}

impl Paginator for NextPageLinkPaginator {
    fn initial_params(&self, _state: &PaginationState) -> Vec<(String, String)> {
        vec![(self.page_size_param.clone(), self.page_size.to_string())]
    }

    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        match next_page_link(body) {
            Some(url) => {
                state.next_page();
                NextPage::with_url(url)
            }
            None => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

/// Extract `meta.links.next_page` from a list envelope
pub fn next_page_link(body: &Value) -> Option<&str> {
    body.pointer("/meta/links/next_page")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Single Request
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct SinglePaginator;

impl Paginator for SinglePaginator {
    fn initial_params(&self, _state: &PaginationState) -> Vec<(String, String)> {
        Vec::new()
    }

    fn process_response(
        &self,
        _body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);
        state.mark_done();
        NextPage::Done
    }
}
