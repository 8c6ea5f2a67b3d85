//! Test utilities and stub implementations for the fetchwise test suite

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fetchwise::{
    BrowserDriver, BrowserSession, FetchFailure, FetchMethod, FetchResult, FetchStrategy,
    LaunchError, RenderRequest, RenderedPage,
};

/// Creates a test HTML document with article content
#[allow(dead_code)]
pub fn create_article_html(title: &str, description: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <meta name="description" content="{description}">
</head>
<body>
    <article>
        <h1>{title}</h1>
        <p>{body}</p>
    </article>
</body>
</html>"#
    )
}

/// Creates a script-only shell document that should fail the
/// main-content heuristic
#[allow(dead_code)]
pub fn create_shell_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>App</title></head>
<body>
    <div id="root"></div>
    <script src="/static/bundle.js"></script>
</body>
</html>"#
        .to_string()
}

/// Stub browser session that renders instantly
#[allow(dead_code)]
pub struct StubSession {
    pub closed: Arc<AtomicUsize>,
    pub renders: Arc<AtomicUsize>,
    pub healthy: bool,
}

#[async_trait]
impl BrowserSession for StubSession {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, FetchFailure> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(RenderedPage {
            html: format!("<html><body><main>rendered {}</main></body></html>", request.url),
            title: "Rendered".to_string(),
            description: String::new(),
        })
    }

    async fn is_healthy(&self) -> bool {
        self.healthy
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Stub driver producing instant stub sessions, with launch counting
#[allow(dead_code)]
#[derive(Default)]
pub struct StubDriver {
    pub launches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub renders: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserDriver for StubDriver {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, LaunchError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession {
            closed: Arc::clone(&self.closes),
            renders: Arc::clone(&self.renders),
            healthy: true,
        }))
    }
}

/// Driver that always fails to launch
#[allow(dead_code)]
pub struct FailingDriver;

#[async_trait]
impl BrowserDriver for FailingDriver {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, LaunchError> {
        Err(LaunchError::ProcessFailed("stub launch failure".to_string()))
    }
}

/// Stub fetch strategy with scripted outcomes and call counting
#[allow(dead_code)]
pub struct StubStrategy {
    method: FetchMethod,
    outcome: StubOutcome,
    pub calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
#[derive(Clone)]
pub enum StubOutcome {
    Success,
    Failure,
    /// Never completes; exercises the external deadline
    Hang,
}

impl StubStrategy {
    #[allow(dead_code)]
    pub fn new(method: FetchMethod, outcome: StubOutcome) -> Arc<Self> {
        Arc::new(Self {
            method,
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchStrategy for StubStrategy {
    fn method(&self) -> FetchMethod {
        self.method
    }

    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchResult, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            StubOutcome::Success => Ok(FetchResult {
                html: Some(format!(
                    "<html><head><title>Stub</title></head>\
                     <body><main>content for {url}</main></body></html>"
                )),
                title: "Stub".to_string(),
                description: String::new(),
                method_used: self.method,
            }),
            StubOutcome::Failure => Err(FetchFailure::Network("stub failure".to_string())),
            StubOutcome::Hang => {
                futures::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
        }
    }
}
