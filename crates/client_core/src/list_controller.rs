//! Paged list resources (riders, drivers, bookings, transactions).
//!
//! Each controller owns one list view's state. Fetches are tagged with a
//! monotonically increasing request id and only the latest issued request may
//! write its result; a failed fetch keeps the last good page on display.

use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{Booking, Transaction, User},
    protocol::ListPage,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::GatewayError,
    events::{AdminEvent, Notice},
    fetch_status::{FetchOutcome, FetchStatus},
    gateway::AdminGateway,
    paginator::PageState,
};

/// A remote list the admin console pages through.
#[async_trait]
pub trait ListResource: Send + Sync + 'static {
    type Item: Send + Sync + 'static;

    /// Plural noun used in logs and notices.
    const NAME: &'static str;
    /// Filter applied when the caller gives none.
    const DEFAULT_FILTER: Option<&'static str> = None;

    async fn fetch(
        gateway: &dyn AdminGateway,
        page: u32,
        filter: Option<&str>,
    ) -> Result<ListPage<Self::Item>, GatewayError>;
}

pub struct Riders;
pub struct Drivers;
pub struct Bookings;
pub struct Transactions;

#[async_trait]
impl ListResource for Riders {
    type Item = User;
    const NAME: &'static str = "riders";

    async fn fetch(
        gateway: &dyn AdminGateway,
        page: u32,
        _filter: Option<&str>,
    ) -> Result<ListPage<User>, GatewayError> {
        gateway.riders(page).await
    }
}

#[async_trait]
impl ListResource for Drivers {
    type Item = User;
    const NAME: &'static str = "drivers";

    async fn fetch(
        gateway: &dyn AdminGateway,
        page: u32,
        _filter: Option<&str>,
    ) -> Result<ListPage<User>, GatewayError> {
        gateway.drivers(page).await
    }
}

#[async_trait]
impl ListResource for Bookings {
    type Item = Booking;
    const NAME: &'static str = "bookings";
    const DEFAULT_FILTER: Option<&'static str> = Some("pending");

    async fn fetch(
        gateway: &dyn AdminGateway,
        page: u32,
        filter: Option<&str>,
    ) -> Result<ListPage<Booking>, GatewayError> {
        gateway
            .bookings(page, filter.or(Self::DEFAULT_FILTER).unwrap_or_default())
            .await
    }
}

#[async_trait]
impl ListResource for Transactions {
    type Item = Transaction;
    const NAME: &'static str = "transactions";

    async fn fetch(
        gateway: &dyn AdminGateway,
        page: u32,
        _filter: Option<&str>,
    ) -> Result<ListPage<Transaction>, GatewayError> {
        gateway.transactions(page).await
    }
}

/// Items of one successfully loaded page.
#[derive(Debug, Clone, Serialize)]
pub struct ListData<T> {
    pub items: Vec<T>,
    pub page: PageState,
    pub filter: Option<String>,
}

/// Read-only copy of a controller's state.
#[derive(Debug)]
pub struct ListView<T> {
    pub status: FetchStatus<ListData<T>>,
    pub filter: Option<String>,
    pub requested_page: u32,
}

impl<T> ListView<T> {
    pub fn data(&self) -> Option<&Arc<ListData<T>>> {
        self.status.data()
    }

    pub fn page(&self) -> PageState {
        self.data().map(|data| data.page).unwrap_or_default()
    }
}

struct ListState<T> {
    status: FetchStatus<ListData<T>>,
    filter: Option<String>,
    requested_page: u32,
    latest_request: u64,
    closed: bool,
}

pub struct ListController<R: ListResource> {
    gateway: Arc<dyn AdminGateway>,
    events: broadcast::Sender<AdminEvent>,
    inner: Mutex<ListState<R::Item>>,
    _resource: PhantomData<R>,
}

impl<R: ListResource> ListController<R> {
    pub fn new(gateway: Arc<dyn AdminGateway>, events: broadcast::Sender<AdminEvent>) -> Self {
        Self {
            gateway,
            events,
            inner: Mutex::new(ListState {
                status: FetchStatus::Idle,
                filter: R::DEFAULT_FILTER.map(str::to_string),
                requested_page: 1,
                latest_request: 0,
                closed: false,
            }),
            _resource: PhantomData,
        }
    }

    pub async fn view(&self) -> ListView<R::Item> {
        let guard = self.inner.lock().await;
        ListView {
            status: guard.status.clone(),
            filter: guard.filter.clone(),
            requested_page: guard.requested_page,
        }
    }

    /// Loads `page` with `filter`, replacing the whole list on success.
    pub async fn fetch_page(&self, page: u32, filter: Option<String>) -> FetchOutcome {
        let page = page.max(1);
        let filter = filter.or_else(|| R::DEFAULT_FILTER.map(str::to_string));

        let request_id = {
            let mut guard = self.inner.lock().await;
            if guard.closed {
                return FetchOutcome::Skipped;
            }
            guard.latest_request += 1;
            guard.requested_page = page;
            guard.filter = filter.clone();
            guard.status.begin_loading();
            guard.latest_request
        };

        info!(
            resource = R::NAME,
            page,
            filter = filter.as_deref().unwrap_or(""),
            request_id,
            "list: fetching page"
        );
        let result = R::fetch(self.gateway.as_ref(), page, filter.as_deref()).await;

        let mut guard = self.inner.lock().await;
        if guard.closed || guard.latest_request != request_id {
            debug!(
                resource = R::NAME,
                request_id,
                latest_request = guard.latest_request,
                "list: discarding stale response"
            );
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(list) => {
                let page_state = PageState::from_response(page, list.pagination);
                guard.status.complete(ListData {
                    items: list.items,
                    page: page_state,
                    filter: filter.clone(),
                });
                drop(guard);
                let _ = self.events.send(AdminEvent::ListLoaded {
                    resource: R::NAME,
                    page: page_state,
                    filter,
                });
                FetchOutcome::Applied
            }
            Err(err) => {
                let description = format!("Failed to load {}", R::NAME);
                let notice = Notice::failure(&description, &err);
                guard.status.fail(notice.description.clone());
                drop(guard);
                warn!(resource = R::NAME, page, "list: fetch failed: {err}");
                let reason = notice.description.clone();
                let _ = self.events.send(AdminEvent::Notice(notice));
                FetchOutcome::Failed { reason }
            }
        }
    }

    /// Moves to `page` keeping the current filter. Out-of-range pages are ignored.
    pub async fn change_page(&self, page: u32) -> FetchOutcome {
        let filter = {
            let guard = self.inner.lock().await;
            let bounds = guard
                .status
                .data()
                .map(|data| data.page)
                .unwrap_or_default();
            if !bounds.contains(page) {
                debug!(
                    resource = R::NAME,
                    page,
                    total_pages = bounds.total_pages,
                    "list: ignoring out-of-range page"
                );
                return FetchOutcome::Skipped;
            }
            guard.filter.clone()
        };
        self.fetch_page(page, filter).await
    }

    /// Switches filter and starts over from page 1.
    pub async fn change_filter(&self, filter: impl Into<String>) -> FetchOutcome {
        self.fetch_page(1, Some(filter.into())).await
    }

    /// Re-fetches the page currently on display.
    pub async fn reload(&self) -> FetchOutcome {
        let (page, filter) = {
            let guard = self.inner.lock().await;
            let page = guard
                .status
                .data()
                .map(|data| data.page.current_page)
                .unwrap_or(guard.requested_page);
            (page, guard.filter.clone())
        };
        self.fetch_page(page, filter).await
    }

    /// Detaches the controller from its view. Completions arriving later are dropped.
    pub async fn close(&self) {
        self.inner.lock().await.closed = true;
    }
}

#[cfg(test)]
#[path = "tests/list_controller_tests.rs"]
mod tests;
