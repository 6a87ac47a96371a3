pub mod redirect;

pub use redirect::{CacheResult, RedirectCache};
