//! Short code generation
//!
//! Generators only propose candidates. They never look at the store, so
//! uniqueness is enforced by the allocation service, which retries on
//! collision.

mod counter;
mod hash;
mod random;

use std::sync::Arc;

pub use counter::CounterGenerator;
pub use hash::HashGenerator;
pub use random::RandomGenerator;

use crate::config::GeneratorConfig;
use crate::errors::{Result, ShortmintError};

/// Widest code the arithmetic generators can address in a `u64` (62^10 < 2^64)
pub const MAX_ARITHMETIC_LENGTH: usize = 10;

pub trait CodeGenerator: Send + Sync {
    /// Propose a candidate code for `url`
    ///
    /// `attempt` counts retries within one create call, starting at 0.
    fn generate(&self, url: &str, attempt: u32) -> String;

    fn name(&self) -> &'static str;
}

/// 62^length, the size of the code space
pub(crate) fn code_space(length: usize) -> u64 {
    62u64.pow(length as u32)
}

pub struct GeneratorFactory;

impl GeneratorFactory {
    pub fn create(config: &GeneratorConfig) -> Result<Arc<dyn CodeGenerator>> {
        let length = config.code_length;
        if length == 0 {
            return Err(ShortmintError::config("generator.code_length must be at least 1"));
        }

        let generator: Arc<dyn CodeGenerator> = match config.strategy.to_lowercase().as_str() {
            "random" => Arc::new(RandomGenerator::new(length)),
            "counter" => {
                check_arithmetic_length(length)?;
                Arc::new(CounterGenerator::new(length, config.counter_offset))
            }
            "hash" => {
                check_arithmetic_length(length)?;
                Arc::new(HashGenerator::new(length))
            }
            other => {
                return Err(ShortmintError::config(format!(
                    "Unknown generator strategy '{}'. Valid: random, counter, hash",
                    other
                )));
            }
        };

        tracing::debug!(
            "Code generator '{}' initialized with length {}",
            generator.name(),
            length
        );
        Ok(generator)
    }
}

fn check_arithmetic_length(length: usize) -> Result<()> {
    if length > MAX_ARITHMETIC_LENGTH {
        return Err(ShortmintError::config(format!(
            "generator.code_length {} exceeds {} for counter/hash strategies",
            length, MAX_ARITHMETIC_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(strategy: &str, code_length: usize) -> GeneratorConfig {
        GeneratorConfig {
            strategy: strategy.to_string(),
            code_length,
            counter_offset: 0,
        }
    }

    #[test]
    fn test_factory_builds_each_strategy() {
        for (strategy, name) in [("random", "random"), ("Counter", "counter"), ("hash", "hash")] {
            let generator = GeneratorFactory::create(&config(strategy, 6)).expect("valid config");
            assert_eq!(generator.name(), name);
            assert_eq!(generator.generate("https://example.com", 0).len(), 6);
        }
    }

    #[test]
    fn test_factory_rejects_bad_config() {
        assert!(GeneratorFactory::create(&config("uuid", 6)).is_err());
        assert!(GeneratorFactory::create(&config("random", 0)).is_err());
        assert!(GeneratorFactory::create(&config("counter", 11)).is_err());
        assert!(GeneratorFactory::create(&config("random", 16)).is_ok());
    }

    #[test]
    fn test_code_space() {
        assert_eq!(code_space(1), 62);
        assert_eq!(code_space(6), 56_800_235_584);
    }
}
