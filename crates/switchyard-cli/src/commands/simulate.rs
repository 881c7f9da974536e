//! `switchyard simulate`: the full dispatch path against a demo provider

use crate::args::SimulateArgs;
use crate::console::CliConsole;
use async_trait::async_trait;
use colored::*;
use futures::{StreamExt, future, stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use switchyard_core::llm::EventStream;
use switchyard_core::llm::messages::last_user_text;
use switchyard_core::{
    AdapterRegistry, ChatMessage, Completion, DispatchRequest, FallbackResult, Intent,
    Orchestrator, ProviderAdapter, StreamEvent, SwitchyardConfig, SwitchyardError,
    SwitchyardResult,
};
use tracing::info;

/// Echo provider that rejects the first calls with a rate-limit error.
///
/// The failure count is shared by every demo provider, so `--fail 3` means
/// the first three upstream calls fail wherever they land on the ladder.
struct DemoAdapter {
    name: String,
    failures_left: Arc<AtomicUsize>,
    calls: AtomicUsize,
}

impl DemoAdapter {
    fn new(name: &str, failures_left: Arc<AtomicUsize>) -> Self {
        Self {
            name: name.to_string(),
            failures_left,
            calls: AtomicUsize::new(0),
        }
    }

    fn admit(&self) -> SwitchyardResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(SwitchyardError::rate_limited(&self.name))
        } else {
            Ok(())
        }
    }

    fn echo(&self, messages: &[ChatMessage], model: &str) -> String {
        format!(
            "[{}/{}] {}",
            self.name,
            model,
            last_user_text(messages).unwrap_or_default()
        )
    }
}

#[async_trait]
impl ProviderAdapter for DemoAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        messages: &[ChatMessage],
        model: &str,
        _api_key: &str,
    ) -> SwitchyardResult<Completion> {
        self.admit()?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let content = self.echo(messages, model);
        Ok(Completion {
            prompt_tokens: Some(messages.iter().map(|m| m.content.split_whitespace().count() as u32).sum()),
            completion_tokens: Some(content.split_whitespace().count() as u32),
            latency_ms: 50.0,
            raw: serde_json::json!({ "demo": true }),
            ..Completion::text(content)
        })
    }

    async fn call_streaming(
        &self,
        messages: &[ChatMessage],
        model: &str,
        _api_key: &str,
    ) -> SwitchyardResult<EventStream> {
        self.admit()?;
        let words: Vec<String> = self
            .echo(messages, model)
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();

        let deltas = stream::iter(words).then(|word| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, SwitchyardError>(StreamEvent::delta(word))
        });
        let events = stream::once(future::ready(Ok(StreamEvent::Meta { ttft_ms: 20.0 })))
            .chain(deltas)
            .chain(stream::once(future::ready(Ok(StreamEvent::done()))));
        let events: EventStream = Box::pin(events);
        Ok(events)
    }
}

pub async fn run(config: SwitchyardConfig, args: SimulateArgs) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    let intent = Intent::parse(&args.intent);

    let failures_left = Arc::new(AtomicUsize::new(args.fail));
    let ladder_providers: Vec<String> = switchyard_core::Ladder::default()
        .catalog()
        .providers()
        .map(str::to_string)
        .collect();
    let adapters: Vec<Arc<DemoAdapter>> = ladder_providers
        .iter()
        .map(|name| Arc::new(DemoAdapter::new(name, Arc::clone(&failures_left))))
        .collect();
    let registry = adapters.iter().fold(AdapterRegistry::new(), |registry, adapter| {
        registry.with(Arc::clone(adapter) as Arc<dyn ProviderAdapter>)
    });

    let orchestrator = Orchestrator::new(config, registry)?;
    let request = DispatchRequest::new(vec![ChatMessage::user(args.prompt.clone())], intent)
        .with_thread("simulate")
        .streaming(args.stream);

    console.print_header(&format!("Simulating {} dispatch", intent));
    info!(concurrent = args.concurrent, fail = args.fail, "starting simulation");

    let dispatches = (0..args.concurrent.max(1)).map(|_| orchestrator.dispatch(request.clone()));
    for (index, result) in future::join_all(dispatches).await.into_iter().enumerate() {
        report(&console, index + 1, result).await;
    }

    if args.repeat {
        console.print_header("Repeat");
        let result = orchestrator.dispatch(request).await;
        report(&console, 1, result).await;
    }

    console.print_header("Upstream calls");
    for adapter in &adapters {
        console.field(&adapter.name, adapter.calls.load(Ordering::SeqCst));
    }

    console.print_header("Pacers");
    for snapshot in orchestrator.pacer_snapshot() {
        println!(
            "  {} rate {:.2}/{:.2} rps, tokens {:.2}, admitted {}, penalties {}, max wait {:?}",
            snapshot.provider.magenta().bold(),
            snapshot.current_rate,
            snapshot.base_rate,
            snapshot.tokens,
            snapshot.stats.admitted,
            snapshot.stats.penalties,
            snapshot.stats.max_queue_wait
        );
    }

    let stats = orchestrator.cache_statistics();
    console.print_header("Cache");
    console.field("entries", stats.entries);
    console.field("hits", stats.hits);
    console.field("misses", stats.misses);
    console.field("hit rate", format!("{:.0}%", stats.hit_rate() * 100.0));
    Ok(())
}

async fn report(console: &CliConsole, index: usize, mut result: FallbackResult) {
    if let Some(error) = &result.error {
        console.error(&format!("request {} failed: {}", index, error));
        return;
    }

    let text = result.collect_text().await;
    console.success(&format!(
        "request {} answered by {}/{}",
        index,
        result.provider.as_deref().unwrap_or("?"),
        result.model.as_deref().unwrap_or("?")
    ));
    console.field("fallback used", result.fallback_used);
    console.field("latency", format!("{:.1}ms", result.latency_ms));
    console.field("tokens", result.usage.total_tokens());
    if result.raw.get("cached").is_some() {
        console.field("cached", true);
    }
    console.field("text", text);
}
