//! Prometheus metrics registry

use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,

    // HTTP server
    pub http_requests_total: Counter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: Gauge,

    // Token cache
    pub token_refreshes_total: Counter,

    // News fan-out
    pub news_fanout_requests_total: Counter,
    pub news_fanout_failures_total: Counter,

    // Signal generation
    pub signal_analyses_total: Counter,
    pub signal_analyses_active: Gauge,
    pub signal_analysis_duration_seconds: Histogram,

    // Connectivity
    pub database_connected: Gauge,
    pub cache_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let registry = Registry::new();

        let http_requests_total = Counter::with_opts(Opts::new(
            "http_requests_total",
            "Total number of HTTP requests received",
        ))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight = Gauge::with_opts(Opts::new(
            "http_requests_in_flight",
            "Number of HTTP requests currently being served",
        ))?;

        let token_refreshes_total = Counter::with_opts(Opts::new(
            "token_refreshes_total",
            "Total number of access-token refresh calls issued upstream",
        ))?;

        let news_fanout_requests_total = Counter::with_opts(Opts::new(
            "news_fanout_requests_total",
            "Total number of per-keyword news feed requests",
        ))?;
        let news_fanout_failures_total = Counter::with_opts(Opts::new(
            "news_fanout_failures_total",
            "Number of per-keyword news feed requests that failed and were skipped",
        ))?;

        let signal_analyses_total = Counter::with_opts(Opts::new(
            "signal_analyses_total",
            "Total number of completed signal analyses",
        ))?;
        let signal_analyses_active = Gauge::with_opts(Opts::new(
            "signal_analyses_active",
            "Number of signal analyses currently running",
        ))?;
        let signal_analysis_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "signal_analysis_duration_seconds",
            "Signal analysis latency in seconds",
        ))?;

        let database_connected = Gauge::with_opts(Opts::new(
            "database_connected",
            "1 when the Postgres connection is established",
        ))?;
        let cache_connected = Gauge::with_opts(Opts::new(
            "cache_connected",
            "1 when the Redis connection is established",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(token_refreshes_total.clone()))?;
        registry.register(Box::new(news_fanout_requests_total.clone()))?;
        registry.register(Box::new(news_fanout_failures_total.clone()))?;
        registry.register(Box::new(signal_analyses_total.clone()))?;
        registry.register(Box::new(signal_analyses_active.clone()))?;
        registry.register(Box::new(signal_analysis_duration_seconds.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;
        registry.register(Box::new(cache_connected.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            token_refreshes_total,
            news_fanout_requests_total,
            news_fanout_failures_total,
            signal_analyses_total,
            signal_analyses_active,
            signal_analysis_duration_seconds,
            database_connected,
            cache_connected,
        })
    }

    /// Export all metrics in the Prometheus text exposition format
    pub fn export(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
