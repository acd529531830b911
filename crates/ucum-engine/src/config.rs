//! Configuration types for the UCUM engine.

/// Configuration for the UCUM engine.
///
/// # Example
///
/// ```rust
/// use ucum_engine::{CacheConfig, EngineConfig};
///
/// let config = EngineConfig::builder()
///     .with_definition_cache(CacheConfig::default())
///     .with_precision(12)
///     .with_parallel(true)
///     .build();
/// assert_eq!(config.precision, Some(12));
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Memoization of defined-unit canonical forms (None = recompute every time).
    pub definition_cache: Option<CacheConfig>,
    /// Significant digits `convert` and `multiply` round to. When unset, results
    /// within 100 units of their last working digit of a 20-digit value
    /// settle to that value, so division noise does not survive a round trip.
    pub precision: Option<u32>,
    /// Validate the terminology in parallel (requires `parallel` feature).
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            definition_cache: Some(CacheConfig::default()),
            precision: None,
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Creates a new builder for EngineConfig.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for EngineConfig.
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    definition_cache: Option<CacheConfig>,
    precision: Option<u32>,
    parallel: bool,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            definition_cache: config.definition_cache,
            precision: config.precision,
            parallel: config.parallel,
        }
    }
}

impl EngineConfigBuilder {
    /// Enables the definition cache with the given configuration.
    pub fn with_definition_cache(mut self, cache: CacheConfig) -> Self {
        self.definition_cache = Some(cache);
        self
    }

    /// Disables the definition cache.
    pub fn without_definition_cache(mut self) -> Self {
        self.definition_cache = None;
        self
    }

    /// Rounds conversion and multiplication results to `digits` significant digits
    /// instead of settling division noise.
    pub fn with_precision(mut self, digits: u32) -> Self {
        self.precision = Some(digits);
        self
    }

    /// Enables or disables parallel terminology validation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builds the EngineConfig.
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            definition_cache: self.definition_cache,
            precision: self.precision,
            parallel: self.parallel,
        }
    }
}

/// Configuration for the definition cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of memoized defined units.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 4096 }
    }
}
