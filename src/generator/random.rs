use super::CodeGenerator;
use crate::utils::BASE62;

/// Uniform base62 codes from the thread-local RNG
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl CodeGenerator for RandomGenerator {
    fn generate(&self, _url: &str, _attempt: u32) -> String {
        std::iter::repeat_with(|| BASE62[rand::random_range(0..BASE62.len())] as char)
            .take(self.length)
            .collect()
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
