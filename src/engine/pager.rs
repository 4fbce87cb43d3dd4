//! Paged record fetching
//!
//! Drives one [`Paginator`] against a [`ResourceClient`] until the strategy
//! reports the collection is exhausted.

use crate::api::{ListRequest, ResourceClient};
use crate::error::{Error, Result};
use crate::pagination::{NextPage, PaginationState, Paginator};
use futures::stream::{self, Stream, TryStreamExt};
use serde_json::Value;
use tracing::debug;

/// Fetches pages of one endpoint, one request at a time
pub struct RecordPager<'a> {
    client: &'a dyn ResourceClient,
    base: ListRequest,
    paginator: Box<dyn Paginator>,
    state: PaginationState,
    next: Option<NextPage>,
    pages: usize,
}

impl<'a> RecordPager<'a> {
    /// Create a pager for `base`.
    ///
    /// The base request's query parameters are appended after the
    /// pagination parameters on every page except server-issued links.
    pub fn new(
        client: &'a dyn ResourceClient,
        base: ListRequest,
        paginator: Box<dyn Paginator>,
    ) -> Self {
        Self {
            client,
            base,
            paginator,
            state: PaginationState::new(),
            next: None,
            pages: 0,
        }
    }

    /// Number of pages requested so far
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// Fetch the next page; `None` once pagination is done
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        let request = match self.next.take() {
            None => self.with_base(self.paginator.initial_params(&self.state)),
            Some(NextPage::Done) => {
                self.next = Some(NextPage::Done);
                return Ok(None);
            }
            Some(NextPage::Continue {
                url: Some(url), ..
            }) => ListRequest::new(url),
            Some(NextPage::Continue { query_params, .. }) => self.with_base(query_params),
        };

        debug!("GET {} {:?}", request.target, request.query);
        let page = self.client.get_page(&request).await?;
        self.pages += 1;

        let next = self
            .paginator
            .process_response(&page.body, page.records.len(), &mut self.state);
        self.next = Some(next);

        Ok(Some(page.records))
    }

    /// Flatten all pages into a stream of records
    pub fn into_stream(self) -> impl Stream<Item = Result<Value>> + 'a {
        stream::try_unfold(self, |mut pager| async move {
            Ok::<_, Error>(pager.next_page().await?.map(|records| (records, pager)))
        })
        .map_ok(|records| stream::iter(records.into_iter().map(Ok::<Value, Error>)))
        .try_flatten()
    }

    fn with_base(&self, params: Vec<(String, String)>) -> ListRequest {
        ListRequest::new(self.base.target.clone())
            .extend_query(params)
            .extend_query(self.base.query.iter().cloned())
    }
}
