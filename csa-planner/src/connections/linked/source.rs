//! Paginating connection source.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::connections::{ConnectionSource, ScanOrder, SourceError, TimeWindow};
use crate::domain::Connection;

use super::client::{LinkedConnectionsClient, PageFetcher};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    /// Nothing fetched yet for the current scope.
    Start,
    /// URL of the next page to fetch.
    Page(String),
    Done,
}

/// Streams connections from a Linked Connections server.
///
/// A backward scan starts at the page holding `window.upper` and walks
/// `hydra:previous` links; a forward scan starts at `window.lower` and walks
/// `hydra:next`. Each page is drained in scan order before the next is
/// requested.
#[derive(Debug)]
pub struct LinkedConnectionsSource<F = LinkedConnectionsClient> {
    fetcher: F,
    window: Option<TimeWindow>,
    order: ScanOrder,
    buffer: VecDeque<Arc<Connection>>,
    cursor: Cursor,
    /// Page URLs fetched in the current scope.
    visited: HashSet<String>,
}

impl<F: PageFetcher> LinkedConnectionsSource<F> {
    /// Create a source. It must be re-scoped before reading.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            window: None,
            order: ScanOrder::Backward,
            buffer: VecDeque::new(),
            cursor: Cursor::Done,
            visited: HashSet::new(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Number of pages fetched since the last re-scope.
    pub fn pages_fetched(&self) -> usize {
        self.visited.len()
    }

    fn finish(&mut self) {
        self.cursor = Cursor::Done;
        self.buffer.clear();
    }

    fn pop(&mut self) -> Option<Arc<Connection>> {
        match self.order {
            ScanOrder::Backward => self.buffer.pop_back(),
            ScanOrder::Forward => self.buffer.pop_front(),
        }
    }

    async fn fetch_next_page(&mut self, window: TimeWindow) -> Result<bool, SourceError> {
        let url = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return Ok(false),
            Cursor::Start => {
                let start = match self.order {
                    ScanOrder::Backward => window.upper,
                    ScanOrder::Forward => window.lower,
                };
                self.fetcher.first_page_url(start)?
            }
            Cursor::Page(url) => url,
        };

        if !self.visited.insert(url.clone()) {
            warn!(url, "page links form a cycle, ending scan");
            return Ok(false);
        }

        let page = self.fetcher.fetch_page(&url).await?;
        debug!(url, connections = page.connections.len(), "page loaded");

        self.buffer.extend(page.connections.iter().cloned());
        let link = match self.order {
            ScanOrder::Backward => page.previous.clone(),
            ScanOrder::Forward => page.next.clone(),
        };
        self.cursor = link.map_or(Cursor::Done, Cursor::Page);
        Ok(true)
    }
}

impl<F: PageFetcher> ConnectionSource for LinkedConnectionsSource<F> {
    fn rescope(&mut self, window: TimeWindow, order: ScanOrder) {
        self.window = Some(window);
        self.order = order;
        self.buffer.clear();
        self.visited.clear();
        self.cursor = if window.is_empty() {
            Cursor::Done
        } else {
            Cursor::Start
        };
    }

    async fn next_connection(&mut self) -> Result<Option<Arc<Connection>>, SourceError> {
        let window = self
            .window
            .ok_or_else(|| SourceError::InvalidWindow("source has not been scoped".to_string()))?;

        loop {
            let Some(connection) = self.pop() else {
                if self.fetch_next_page(window).await? {
                    continue;
                }
                return Ok(None);
            };

            let time = connection.departure_time;
            let (skip, past_end) = match self.order {
                ScanOrder::Backward => (time > window.upper, time < window.lower),
                ScanOrder::Forward => (time < window.lower, time > window.upper),
            };
            if past_end {
                self.finish();
                return Ok(None);
            }
            if !skip {
                return Ok(Some(connection));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::connections::linked::ConvertedPage;
    use crate::domain::{StopId, Timestamp, TripId};

    /// Pages of ten-minute slots: page `n` holds departures `n*600`, `n*600+300`.
    struct MapFetcher {
        pages: HashMap<String, Arc<ConvertedPage>>,
    }

    fn conn(dep: i64) -> Arc<Connection> {
        Arc::new(Connection::new(
            StopId::parse("A").unwrap(),
            Timestamp::from_unix_seconds(dep),
            StopId::parse("B").unwrap(),
            Timestamp::from_unix_seconds(dep + 60),
            TripId::parse(&format!("T{dep}")).unwrap(),
        ))
    }

    impl MapFetcher {
        fn slots(n: i64) -> Self {
            let pages = (0..n)
                .map(|i| {
                    let page = ConvertedPage {
                        connections: vec![conn(i * 600), conn(i * 600 + 300)],
                        next: (i + 1 < n).then(|| format!("p{}", i + 1)),
                        previous: (i > 0).then(|| format!("p{}", i - 1)),
                    };
                    (format!("p{i}"), Arc::new(page))
                })
                .collect();
            Self { pages }
        }
    }

    impl PageFetcher for MapFetcher {
        fn first_page_url(&self, departure_time: Timestamp) -> Result<String, SourceError> {
            Ok(format!("p{}", departure_time.unix_seconds() / 600))
        }

        async fn fetch_page(&self, url: &str) -> Result<Arc<ConvertedPage>, SourceError> {
            self.pages.get(url).cloned().ok_or_else(|| SourceError::Api {
                status: 404,
                message: url.to_string(),
            })
        }
    }

    fn window(lower: i64, upper: i64) -> TimeWindow {
        TimeWindow::new(
            Timestamp::from_unix_seconds(lower),
            Timestamp::from_unix_seconds(upper),
        )
    }

    async fn drain<F: PageFetcher>(source: &mut LinkedConnectionsSource<F>) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(c) = source.next_connection().await.unwrap() {
            out.push(c.departure_time.unix_seconds());
        }
        out
    }

    #[tokio::test]
    async fn backward_scan_walks_previous_links() {
        let mut source = LinkedConnectionsSource::new(MapFetcher::slots(5));
        source.rescope(window(600, 1800), ScanOrder::Backward);
        assert_eq!(drain(&mut source).await, vec![1800, 1500, 1200, 900, 600]);
    }

    #[tokio::test]
    async fn forward_scan_walks_next_links() {
        let mut source = LinkedConnectionsSource::new(MapFetcher::slots(5));
        source.rescope(window(900, 1500), ScanOrder::Forward);
        assert_eq!(drain(&mut source).await, vec![900, 1200, 1500]);
        assert_eq!(source.pages_fetched(), 3);
    }

    #[tokio::test]
    async fn scan_ends_when_pages_run_out() {
        let mut source = LinkedConnectionsSource::new(MapFetcher::slots(2));
        source.rescope(window(0, 900), ScanOrder::Backward);
        assert_eq!(drain(&mut source).await, vec![900, 600, 300, 0]);
    }

    #[tokio::test]
    async fn unscoped_source_errors() {
        let mut source = LinkedConnectionsSource::new(MapFetcher::slots(1));
        assert!(matches!(
            source.next_connection().await,
            Err(SourceError::InvalidWindow(_))
        ));
    }

    #[tokio::test]
    async fn empty_window_fetches_nothing() {
        let mut source = LinkedConnectionsSource::new(MapFetcher::slots(3));
        source.rescope(window(900, 600), ScanOrder::Backward);
        assert!(source.next_connection().await.unwrap().is_none());
        assert_eq!(source.pages_fetched(), 0);
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let mut source = LinkedConnectionsSource::new(MapFetcher::slots(1));
        source.rescope(window(6000, 7000), ScanOrder::Forward);
        assert!(matches!(
            source.next_connection().await,
            Err(SourceError::Api { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn cyclic_links_terminate() {
        let mut fetcher = MapFetcher::slots(1);
        let page = ConvertedPage {
            connections: vec![conn(0)],
            next: None,
            previous: Some("p0".to_string()),
        };
        fetcher.pages.insert("p0".to_string(), Arc::new(page));

        let mut source = LinkedConnectionsSource::new(fetcher);
        source.rescope(window(-10_000, 100), ScanOrder::Backward);
        assert_eq!(drain(&mut source).await, vec![0]);
    }
}
