use log::{info, warn};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use crate::error::{Result, ToolError};

/// Fixed-interval retry. No backoff growth; `max_attempts: None` retries forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_delay: Duration,
    pub page_delay: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            retry_delay: delay,
            page_delay: delay,
            max_attempts: None,
        }
    }

    /// Zero delays, for tests and dry runs.
    pub fn immediate() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Decides what to do with a failed attempt (1-based). Transient errors
    /// sleep and return `Ok`, anything else is handed back to the caller.
    pub async fn backoff(&self, error: ToolError, attempt: u32) -> Result<()> {
        if !error.is_transient() {
            return Err(error);
        }
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return Err(ToolError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }
        }
        warn!("{error}, retrying in {:?}", self.retry_delay);
        pause(self.retry_delay).await;
        Ok(())
    }

    /// Re-issues `op` until it succeeds or fails for a non-transient reason.
    /// Returns the value and how many retries it took.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<(T, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok((value, attempt - 1)),
                Err(e) => self.backoff(e, attempt).await?,
            }
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// One decoded page. `next == None` marks the last page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    pub next: Option<C>,
}

/// An upstream API that hands out results one page at a time.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    type Cursor: Debug;
    type Item;

    /// Issues the request for the page at `cursor` (`None` = first page) and
    /// returns the raw body.
    async fn request(&self, cursor: Option<&Self::Cursor>) -> Result<String>;

    fn parse(&self, body: &str) -> Result<Page<Self::Item, Self::Cursor>>;
}

/// Where fetched items end up. Failures here are fatal.
pub trait RecordSink<T> {
    fn write(&mut self, item: T) -> Result<()>;

    fn end_page(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T> RecordSink<T> for Vec<T> {
    fn write(&mut self, item: T) -> Result<()> {
        self.push(item);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationSummary {
    pub pages: u32,
    pub items: u64,
    pub retries: u32,
}

enum FetchState {
    Requesting,
    Parsing(String),
    Done,
}

/// Walks every page of `source` into `sink`, in page order.
///
/// Transport and decode failures re-issue the same request after
/// `policy.retry_delay`. Between successful pages the loop waits
/// `policy.page_delay`.
pub async fn paginate<S, K>(source: &S, policy: &RetryPolicy, sink: &mut K) -> Result<PaginationSummary>
where
    S: PageSource,
    K: RecordSink<S::Item>,
{
    let mut summary = PaginationSummary::default();
    let mut cursor: Option<S::Cursor> = None;
    let mut attempt = 0;
    let mut state = FetchState::Requesting;

    loop {
        state = match state {
            FetchState::Requesting => {
                attempt += 1;
                match source.request(cursor.as_ref()).await {
                    Ok(body) => FetchState::Parsing(body),
                    Err(e) => {
                        policy.backoff(e, attempt).await?;
                        summary.retries += 1;
                        FetchState::Requesting
                    }
                }
            }
            FetchState::Parsing(body) => match source.parse(&body) {
                Ok(page) => {
                    summary.pages += 1;
                    summary.items += page.items.len() as u64;
                    for item in page.items {
                        sink.write(item)?;
                    }
                    sink.end_page()?;
                    attempt = 0;

                    info!("counter: {}", summary.pages);
                    info!("finished: {:?}", cursor);
                    info!("next: {:?}", page.next);

                    match page.next {
                        Some(next) => {
                            cursor = Some(next);
                            pause(policy.page_delay).await;
                            FetchState::Requesting
                        }
                        None => FetchState::Done,
                    }
                }
                Err(e) => {
                    policy.backoff(e, attempt).await?;
                    summary.retries += 1;
                    FetchState::Requesting
                }
            },
            FetchState::Done => break,
        };
    }

    info!(
        "Finished all! {} pages, {} items, {} retries",
        summary.pages, summary.items, summary.retries
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Serves scripted responses; each page body is `items|next`.
    struct Scripted {
        responses: RefCell<VecDeque<Result<String>>>,
        seen: RefCell<Vec<Option<u32>>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for Scripted {
        type Cursor = u32;
        type Item = u32;

        async fn request(&self, cursor: Option<&u32>) -> Result<String> {
            self.seen.borrow_mut().push(cursor.copied());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ToolError::InvalidConfig("script exhausted".into())))
        }

        fn parse(&self, body: &str) -> Result<Page<u32, u32>> {
            let (items, next) = body
                .split_once('|')
                .ok_or_else(|| ToolError::Decode(format!("bad body {body:?}")))?;
            let items = items
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.parse().map_err(|_| ToolError::Decode(s.to_string())))
                .collect::<Result<Vec<u32>>>()?;
            let next = if next.is_empty() {
                None
            } else {
                Some(next.parse().map_err(|_| ToolError::Decode(next.to_string()))?)
            };
            Ok(Page { items, next })
        }
    }

    fn ok(s: &str) -> Result<String> {
        Ok(s.to_string())
    }

    #[tokio::test]
    async fn test_follows_cursor_until_empty() {
        let source = Scripted::new(vec![ok("1,2|10"), ok("3|20"), ok("4,5|")]);
        let mut out = Vec::new();
        let summary = paginate(&source, &RetryPolicy::immediate(), &mut out).await.unwrap();

        assert_eq!(out, vec![1, 2, 3, 4, 5]);
        assert_eq!(summary, PaginationSummary { pages: 3, items: 5, retries: 0 });
        assert_eq!(*source.seen.borrow(), vec![None, Some(10), Some(20)]);
    }

    #[tokio::test]
    async fn test_retries_same_cursor_on_transient_errors() {
        let source = Scripted::new(vec![
            ok("1|7"),
            Err(ToolError::Transport("connection reset".into())),
            ok("not a page"),
            ok("2|"),
        ]);
        let mut out = Vec::new();
        let summary = paginate(&source, &RetryPolicy::immediate(), &mut out).await.unwrap();

        assert_eq!(out, vec![1, 2]);
        assert_eq!(summary.retries, 2);
        assert_eq!(*source.seen.borrow(), vec![None, Some(7), Some(7), Some(7)]);
    }

    #[tokio::test]
    async fn test_retry_ceiling() {
        let source = Scripted::new(vec![
            Err(ToolError::Transport("a".into())),
            Err(ToolError::Transport("b".into())),
            Err(ToolError::Transport("c".into())),
        ]);
        let policy = RetryPolicy::immediate().with_max_attempts(Some(2));
        let mut out: Vec<u32> = Vec::new();
        let err = paginate(&source, &policy, &mut out).await.unwrap_err();

        match err {
            ToolError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_structural_error_is_not_retried() {
        let source = Scripted::new(vec![Err(ToolError::InvalidConfig("bad url".into())), ok("1|")]);
        let mut out: Vec<u32> = Vec::new();
        let err = paginate(&source, &RetryPolicy::immediate(), &mut out).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidConfig(_)));
        assert_eq!(source.seen.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_run_counts_retries() {
        let calls = RefCell::new(0);
        let (value, retries) = RetryPolicy::immediate()
            .run(|| {
                *calls.borrow_mut() += 1;
                let n = *calls.borrow();
                async move {
                    if n < 3 {
                        Err(ToolError::Rpc("timeout".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(retries, 2);
    }
}
