/// Client-wide scan defaults, applied when a query does not set its own.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Default scanner caching hint.
    pub caching: Option<usize>,
    /// Default per-response cell batch hint.
    pub batch: Option<usize>,
}
