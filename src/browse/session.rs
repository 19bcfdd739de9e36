use tracing::debug;

use super::{FilterState, PageView};
use crate::api::GalleryApi;
use crate::config::BrowseConfig;
use crate::error::ClientResult;
use crate::models::{GalleryList, GalleryQuery};

/// A gallery request that has been issued. Only the most recently issued
/// ticket may update the session.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    sequence: u64,
    key: String,
    query: GalleryQuery,
}

impl FetchTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn query(&self) -> &GalleryQuery {
        &self.query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer request was issued after this one; the response was dropped.
    Stale,
}

/// Gallery browser state: filters plus the last fetched page.
///
/// The previous page stays visible while a new one loads, and a failed fetch
/// keeps it as well.
#[derive(Debug, Clone)]
pub struct GallerySession {
    filters: FilterState,
    page_size: u32,
    issued: u64,
    pending_key: Option<String>,
    settled_key: Option<String>,
    data: Option<GalleryList>,
    error: Option<String>,
}

impl GallerySession {
    pub fn new(page_size: u32) -> Self {
        Self::with_filters(FilterState::default(), page_size)
    }

    pub fn with_filters(filters: FilterState, page_size: u32) -> Self {
        Self {
            filters,
            page_size: page_size.max(1),
            issued: 0,
            pending_key: None,
            settled_key: None,
            data: None,
            error: None,
        }
    }

    pub fn from_config(config: &BrowseConfig) -> Self {
        Self::with_filters(FilterState::with_sort(config.sort), config.page_size)
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn data(&self) -> Option<&GalleryList> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending_key.is_some()
    }

    pub fn query(&self) -> GalleryQuery {
        self.filters.query(self.page_size)
    }

    /// True when the filters map to a request that is neither loaded nor in
    /// flight. Local sort and rating changes never make this true.
    pub fn needs_fetch(&self) -> bool {
        let key = self.filters.query_key(self.page_size);
        let target = self.pending_key.as_ref().or(self.settled_key.as_ref());
        target != Some(&key)
    }

    /// Issue a ticket for the current filters if they need a fetch.
    pub fn prepare(&mut self) -> Option<FetchTicket> {
        if !self.needs_fetch() {
            return None;
        }
        Some(self.issue())
    }

    /// Issue a ticket unconditionally (manual refresh).
    pub fn prepare_reload(&mut self) -> FetchTicket {
        self.issue()
    }

    fn issue(&mut self) -> FetchTicket {
        self.issued += 1;
        let query = self.query();
        let key = query.to_query_string();
        self.pending_key = Some(key.clone());
        FetchTicket {
            sequence: self.issued,
            key,
            query,
        }
    }

    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: ClientResult<GalleryList>,
    ) -> FetchOutcome {
        if ticket.sequence != self.issued {
            debug!(
                "Dropping stale gallery response #{} (latest #{})",
                ticket.sequence, self.issued
            );
            return FetchOutcome::Stale;
        }

        self.pending_key = None;
        self.settled_key = Some(ticket.key);
        match result {
            Ok(list) => {
                self.data = Some(list);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.user_message());
            }
        }
        FetchOutcome::Applied
    }

    /// Fetch the current page if the filters call for it. Returns `None` when
    /// no request was needed.
    pub async fn load<A>(&mut self, api: &A) -> Option<FetchOutcome>
    where
        A: GalleryApi + ?Sized,
    {
        let ticket = self.prepare()?;
        let result = api.list_galleries(ticket.query()).await;
        Some(self.complete(ticket, result))
    }

    pub async fn reload<A>(&mut self, api: &A) -> FetchOutcome
    where
        A: GalleryApi + ?Sized,
    {
        let ticket = self.prepare_reload();
        let result = api.list_galleries(ticket.query()).await;
        self.complete(ticket, result)
    }

    pub fn view(&self) -> Option<PageView<'_>> {
        self.data
            .as_ref()
            .map(|list| PageView::new(list, &self.filters))
    }
}
