//! Redis cache.
//!
//! JSON values with TTLs, a fixed-window rate-limit counter and the
//! public listing page cache.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{
    Config, CACHE_PREFIX_PUBLIC_LISTINGS, CACHE_PREFIX_RATE_LIMIT, PUBLIC_LISTINGS_TTL_SECONDS,
};
use crate::domain::ListingWithOwner;
use crate::errors::{AppError, AppResult};
use crate::types::Paginated;

/// Redis cache wrapper over a multiplexed connection manager.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis; the server keeps running without a cache on error.
    pub async fn try_connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }

    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(cache_error)?;

        match value {
            Some(json) => {
                let parsed = serde_json::from_str(&json).map_err(|e| {
                    AppError::internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;

        conn.set_ex::<_, _, ()>(key, json, ttl_seconds)
            .await
            .map_err(cache_error)?;

        Ok(())
    }

    /// Delete all keys matching a glob pattern. Returns how many were removed.
    pub async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn.keys(pattern).await.map_err(cache_error)?;

        if keys.is_empty() {
            return Ok(0);
        }

        // UNLINK frees memory off the main thread
        let removed: i64 = redis::cmd("UNLINK")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok(removed.max(0) as u64)
    }

    // =========================================================================
    // Public Listing Pages
    // =========================================================================

    pub async fn get_public_listings(
        &self,
        page: u64,
        per_page: u64,
    ) -> AppResult<Option<Paginated<ListingWithOwner>>> {
        self.get(&public_listings_key(page, per_page)).await
    }

    pub async fn set_public_listings(
        &self,
        page: u64,
        per_page: u64,
        listings: &Paginated<ListingWithOwner>,
    ) -> AppResult<()> {
        self.set_with_ttl(
            &public_listings_key(page, per_page),
            listings,
            PUBLIC_LISTINGS_TTL_SECONDS,
        )
        .await
    }

    /// Drop every cached public page.
    pub async fn invalidate_public_listings(&self) -> AppResult<u64> {
        self.delete_pattern(&format!("{}*", CACHE_PREFIX_PUBLIC_LISTINGS))
            .await
    }

    // =========================================================================
    // Rate Limiting
    // =========================================================================

    /// Count a request against `identifier`'s current window.
    ///
    /// Returns `(count, allowed)`.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        let count: i64 = conn.incr(&key, 1).await.map_err(cache_error)?;
        if count == 1 {
            // First hit opens the window
            let _: () = conn
                .expire(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        let count = count.max(0) as u64;
        Ok((count, count <= max_requests))
    }
}

/// Cache key for one page of the public listing feed
pub fn public_listings_key(page: u64, per_page: u64) -> String {
    format!("{}{}:{}", CACHE_PREFIX_PUBLIC_LISTINGS, page, per_page)
}

fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}
