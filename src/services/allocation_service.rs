//! Allocation service
//!
//! Owns create / lookup / delete orchestration. Every mutation is a single
//! atomic store call; the only thing retried here is a generated code
//! colliding with a taken one, and each retry starts a fresh store call so
//! no lock is held across attempts.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, trace, warn};

use crate::cache::{CacheResult, RedirectCache};
use crate::config::AllocationConfig;
use crate::errors::{Result, ShortmintError};
use crate::generator::CodeGenerator;
use crate::storage::{InsertOutcome, Mapping, MappingStore, RemoveOutcome};
use crate::utils::{is_valid_short_code, normalize_url, validate_url};

/// Attempts at delete-by-URL when the URL's mapping changes underneath
const DELETE_BY_URL_RETRIES: usize = 3;

// ============ Request types ============

#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub url: String,
    /// Custom alias; empty means generate one
    pub alias: Option<String>,
}

impl CreateRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Code(String),
    Url(String),
}

#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    pub code: Option<String>,
    pub url: Option<String>,
}

// ============ Policy ============

#[derive(Debug, Clone)]
pub struct AllocationPolicy {
    /// One canonical code per URL when no alias is given
    pub reuse_existing_url: bool,
    pub max_attempts: u32,
    pub max_alias_length: usize,
    pub normalize_scheme: bool,
    pub default_ttl: Option<Duration>,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self::from(&AllocationConfig::default())
    }
}

impl From<&AllocationConfig> for AllocationPolicy {
    fn from(config: &AllocationConfig) -> Self {
        Self {
            reuse_existing_url: config.reuse_existing_url,
            max_attempts: config.max_attempts.max(1),
            max_alias_length: config.max_alias_length,
            normalize_scheme: config.normalize_scheme,
            default_ttl: (config.default_ttl_secs > 0)
                .then(|| Duration::seconds(config.default_ttl_secs as i64)),
        }
    }
}

// ============ AllocationService ============

pub struct AllocationService {
    store: Arc<dyn MappingStore>,
    generator: Arc<dyn CodeGenerator>,
    cache: Arc<RedirectCache>,
    policy: AllocationPolicy,
}

impl AllocationService {
    pub fn new(
        store: Arc<dyn MappingStore>,
        generator: Arc<dyn CodeGenerator>,
        cache: Arc<RedirectCache>,
        policy: AllocationPolicy,
    ) -> Self {
        Self {
            store,
            generator,
            cache,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn MappingStore> {
        &self.store
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    fn normalize(&self, raw: &str) -> String {
        if self.policy.normalize_scheme {
            normalize_url(raw)
        } else {
            raw.trim().to_string()
        }
    }

    /// Normalize then validate a URL submitted for shortening
    fn prepare_url(&self, raw: &str) -> Result<String> {
        let url = self.normalize(raw);
        validate_url(&url).map_err(|e| ShortmintError::invalid_input(e.to_string()))?;
        Ok(url)
    }

    fn new_mapping(&self, code: String, url: &str) -> Mapping {
        Mapping::new(code, url).with_ttl(self.policy.default_ttl)
    }

    // ============ Create ============

    /// Create a mapping, or return the one that already satisfies the request
    pub async fn create(&self, req: CreateRequest) -> Result<Mapping> {
        let url = self.prepare_url(&req.url)?;

        match req.alias.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(alias) => self.create_with_alias(alias, &url).await,
            None => self.create_generated(&url).await,
        }
    }

    async fn create_with_alias(&self, alias: &str, url: &str) -> Result<Mapping> {
        if !is_valid_short_code(alias, self.policy.max_alias_length) {
            return Err(ShortmintError::invalid_input(format!(
                "Invalid alias '{}'. Use 1-{} characters from A-Z, a-z, 0-9, '_' and '-'",
                alias, self.policy.max_alias_length
            )));
        }

        let mapping = self.new_mapping(alias.to_string(), url);
        match self
            .store
            .insert(mapping, self.policy.reuse_existing_url)
            .await?
        {
            InsertOutcome::Inserted(m) => {
                info!("Created '{}' -> '{}'", m.short_code, m.original_url);
                Ok(m)
            }
            InsertOutcome::CodeTaken(existing) if existing.original_url == url => {
                debug!("Alias '{}' already bound to the same URL", alias);
                Ok(existing)
            }
            InsertOutcome::CodeTaken(_) => Err(ShortmintError::conflict(format!(
                "Custom alias '{}' already in use",
                alias
            ))),
            InsertOutcome::UrlBound(existing) => Err(ShortmintError::conflict(format!(
                "A short URL for this link already exists: '{}'",
                existing.short_code
            ))),
        }
    }

    async fn create_generated(&self, url: &str) -> Result<Mapping> {
        let reuse = self.policy.reuse_existing_url;

        for attempt in 0..self.policy.max_attempts {
            let candidate = self.generator.generate(url, attempt);
            match self
                .store
                .insert(self.new_mapping(candidate, url), reuse)
                .await?
            {
                InsertOutcome::Inserted(m) => {
                    info!("Created '{}' -> '{}'", m.short_code, m.original_url);
                    return Ok(m);
                }
                InsertOutcome::UrlBound(existing) => {
                    debug!("Reusing '{}' for '{}'", existing.short_code, url);
                    return Ok(existing);
                }
                InsertOutcome::CodeTaken(existing) if reuse && existing.original_url == url => {
                    debug!("Reusing '{}' for '{}'", existing.short_code, url);
                    return Ok(existing);
                }
                InsertOutcome::CodeTaken(existing) => {
                    debug!(
                        "Generated code '{}' collided (attempt {}/{})",
                        existing.short_code,
                        attempt + 1,
                        self.policy.max_attempts
                    );
                }
            }
        }

        warn!(
            "No free code for '{}' after {} attempts",
            url, self.policy.max_attempts
        );
        Err(ShortmintError::resource_exhausted(format!(
            "Could not allocate a free short code after {} attempts",
            self.policy.max_attempts
        )))
    }

    // ============ Lookup ============

    /// Read straight from the store, bypassing the redirect cache
    pub async fn lookup(&self, key: LookupKey) -> Result<Option<Mapping>> {
        match key {
            LookupKey::Code(code) => self.store.get_by_code(code.trim()).await,
            LookupKey::Url(url) => self.store.get_by_url(&self.normalize(&url)).await,
        }
    }

    /// Existence check by code, URL, or both
    ///
    /// With both keys the answer is positive only when one mapping binds
    /// the code to the URL.
    pub async fn check(&self, code: Option<&str>, url: Option<&str>) -> Result<Option<Mapping>> {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        let url = url.map(str::trim).filter(|u| !u.is_empty());

        match (code, url) {
            (None, None) => Err(ShortmintError::invalid_input(
                "URL or custom alias must be provided",
            )),
            (Some(code), None) => self.lookup(LookupKey::Code(code.to_string())).await,
            (None, Some(url)) => self.lookup(LookupKey::Url(url.to_string())).await,
            (Some(code), Some(url)) => {
                let url = self.normalize(url);
                Ok(self
                    .store
                    .get_by_code(code)
                    .await?
                    .filter(|m| m.binds(code, &url)))
            }
        }
    }

    /// Resolve a code for redirection, through the cache
    pub async fn resolve(&self, code: &str) -> Result<Mapping> {
        if let CacheResult::Found(mapping) = self.cache.get(code).await {
            return Ok(mapping);
        }

        let epoch = self.cache.epoch();
        match self.store.get_by_code(code).await? {
            Some(mapping) => {
                self.cache.fill(mapping.clone(), epoch).await;
                Ok(mapping)
            }
            None => {
                trace!("Redirect target not found: {}", code);
                Err(ShortmintError::not_found(format!(
                    "Short code '{}' not found",
                    code
                )))
            }
        }
    }

    // ============ Delete ============

    /// Delete by code, URL, or both; returns the removed mapping
    pub async fn delete(&self, req: DeleteRequest) -> Result<Mapping> {
        let code = req
            .code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let url = req
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| self.normalize(u));

        let removed = match (code, url) {
            (None, None) => {
                return Err(ShortmintError::invalid_input(
                    "Either URL or short code must be provided",
                ));
            }
            (Some(code), None) => match self.store.remove(code, None).await? {
                RemoveOutcome::Removed(m) => m,
                _ => return Err(Self::nothing_to_delete()),
            },
            (Some(code), Some(url)) => match self.store.remove(code, Some(&url)).await? {
                RemoveOutcome::Removed(m) => m,
                RemoveOutcome::Mismatch(_) => return Err(Self::ambiguous_target(code)),
                RemoveOutcome::NotFound => {
                    // The URL alone may still name a mapping
                    if self.store.get_by_url(&url).await?.is_some() {
                        return Err(Self::ambiguous_target(code));
                    }
                    return Err(Self::nothing_to_delete());
                }
            },
            (None, Some(url)) => self.remove_by_url(&url).await?,
        };

        self.cache.invalidate(&removed.short_code).await;
        info!(
            "Deleted '{}' -> '{}'",
            removed.short_code, removed.original_url
        );
        Ok(removed)
    }

    async fn remove_by_url(&self, url: &str) -> Result<Mapping> {
        for _ in 0..DELETE_BY_URL_RETRIES {
            let Some(mapping) = self.store.get_by_url(url).await? else {
                return Err(Self::nothing_to_delete());
            };
            // Conditional on the URL so a concurrent recreate under the same
            // code is left alone
            if let RemoveOutcome::Removed(m) =
                self.store.remove(&mapping.short_code, Some(url)).await?
            {
                return Ok(m);
            }
            trace!("Mapping for '{}' changed during delete, retrying", url);
        }
        Err(Self::nothing_to_delete())
    }

    fn nothing_to_delete() -> ShortmintError {
        ShortmintError::not_found("No matching URL or short code found")
    }

    fn ambiguous_target(code: &str) -> ShortmintError {
        ShortmintError::invalid_input(format!(
            "Short code '{}' and URL refer to different mappings",
            code
        ))
    }

    // ============ Maintenance ============

    /// Drop expired mappings from the store
    pub async fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired(chrono::Utc::now()).await
    }
}
