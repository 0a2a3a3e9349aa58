use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::RedditConfig;
use crate::constants::LISTING_PAGE_LIMIT;
use crate::game::types::{ActionKind, Entity, UserAction};
use crate::services::{ActivityError, ActivitySource, EntityLookup, LookupError};

/// Client for Reddit's public JSON endpoints.
#[derive(Debug, Clone)]
pub struct RedditClient {
    config: RedditConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    kind: String,
    data: T,
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    children: Vec<Thing<ListingItem>>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    subreddit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct About {
    display_name: Option<String>,
    subscribers: Option<u64>,
}

/// Strips a leading `r/` or `/r/` so names can be used in URLs.
pub fn normalize_name(name: &str) -> &str {
    let trimmed = name.trim();
    trimmed
        .strip_prefix("/r/")
        .or_else(|| trimmed.strip_prefix("r/"))
        .unwrap_or(trimmed)
}

fn parse_listing(body: &str, kind: ActionKind) -> Result<(Vec<UserAction>, Option<String>), ActivityError> {
    let thing: Thing<Listing> =
        serde_json::from_str(body).map_err(|e| ActivityError::InvalidPayload(e.to_string()))?;
    let actions = thing
        .data
        .children
        .into_iter()
        .map(|child| UserAction {
            kind,
            community: child.data.subreddit,
        })
        .collect();
    Ok((actions, thing.data.after))
}

fn parse_about(body: &str, requested: &str) -> Result<Entity, LookupError> {
    let thing: Thing<About> = serde_json::from_str(body)
        .map_err(|_| LookupError::NotFound(requested.to_string()))?;
    // 不存在的社区会返回搜索结果 Listing 而不是 t5
    if thing.kind != "t5" {
        return Err(LookupError::NotFound(requested.to_string()));
    }
    let subscribers = thing
        .data
        .subscribers
        .ok_or_else(|| LookupError::MissingSubscribers(requested.to_string()))?;
    if let Some(display_name) = thing.data.display_name.as_deref() {
        if !display_name.eq_ignore_ascii_case(normalize_name(requested)) {
            tracing::debug!(requested, display_name, "Community name differs from lookup key");
        }
    }
    // 保留调用方的名字，已用集合按池中的写法去重
    Ok(Entity::new(requested, subscribers))
}

impl RedditClient {
    pub fn new(config: &RedditConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn fetch_listing(
        &self,
        user: &str,
        section: &str,
        kind: ActionKind,
        limit: usize,
    ) -> Result<Vec<UserAction>, ActivityError> {
        let mut actions = Vec::with_capacity(limit);
        let mut after: Option<String> = None;

        while actions.len() < limit {
            let page_size = (limit - actions.len()).min(LISTING_PAGE_LIMIT);
            let mut request = self
                .client
                .get(self.url(&format!("/user/{user}/{section}.json")))
                .query(&[("limit", page_size.to_string()), ("raw_json", "1".to_string())]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    ActivityError::Timeout
                } else {
                    ActivityError::Unavailable(e.to_string())
                }
            })?;
            let status = response.status();
            if !status.is_success() {
                return Err(ActivityError::Api {
                    status: status.as_u16(),
                });
            }
            let body = response
                .text()
                .await
                .map_err(|e| ActivityError::Unavailable(e.to_string()))?;

            let (page, next) = parse_listing(&body, kind)?;
            let empty_page = page.is_empty();
            actions.extend(page);
            match next {
                Some(cursor) if !empty_page => after = Some(cursor),
                _ => break,
            }
        }

        actions.truncate(limit);
        tracing::debug!(user, section, count = actions.len(), "Fetched user listing");
        Ok(actions)
    }
}

#[async_trait]
impl ActivitySource for RedditClient {
    async fn recent_posts(&self, user: &str, limit: usize) -> Result<Vec<UserAction>, ActivityError> {
        self.fetch_listing(user, "submitted", ActionKind::Post, limit)
            .await
    }

    async fn recent_comments(
        &self,
        user: &str,
        limit: usize,
    ) -> Result<Vec<UserAction>, ActivityError> {
        self.fetch_listing(user, "comments", ActionKind::Comment, limit)
            .await
    }
}

#[async_trait]
impl EntityLookup for RedditClient {
    async fn entity_info(&self, name: &str) -> Result<Entity, LookupError> {
        let requested = name.trim();
        let name = normalize_name(requested);
        let response = self
            .client
            .get(self.url(&format!("/r/{name}/about.json")))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Api {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;
        parse_about(&body, requested)
    }
}
