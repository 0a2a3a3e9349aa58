//! 活跃度排序：根据用户最近的帖子与评论，推导其最常出没的社区

use std::collections::HashMap;

use crate::game::types::{UserAction, WeightedMention};
use crate::services::ActivitySource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankLimits {
    pub posts: usize,
    pub comments: usize,
    pub ranked: usize,
}

impl Default for RankLimits {
    fn default() -> Self {
        Self {
            posts: crate::constants::POST_FETCH_LIMIT,
            comments: crate::constants::COMMENT_FETCH_LIMIT,
            ranked: crate::constants::MAX_RANKED_COMMUNITIES,
        }
    }
}

/// Turns actions into weighted mentions, dropping actions without a community.
pub fn weigh(actions: &[UserAction]) -> Vec<WeightedMention> {
    actions
        .iter()
        .filter_map(|action| {
            let name = action.community.as_deref()?.trim();
            if name.is_empty() {
                return None;
            }
            Some(WeightedMention {
                entity_name: name.to_string(),
                weight: action.kind.weight(),
            })
        })
        .collect()
}

/// Sums weights per community, keeping the order in which names first appear.
pub fn aggregate(mentions: &[WeightedMention]) -> Vec<(String, u32)> {
    let mut index_by_name: HashMap<&str, usize> = HashMap::with_capacity(mentions.len());
    let mut totals: Vec<(String, u32)> = Vec::new();

    for mention in mentions {
        match index_by_name.get(mention.entity_name.as_str()) {
            Some(&idx) => totals[idx].1 += mention.weight,
            None => {
                index_by_name.insert(mention.entity_name.as_str(), totals.len());
                totals.push((mention.entity_name.clone(), mention.weight));
            }
        }
    }

    totals
}

/// Orders communities by descending weight and keeps the first `limit`.
pub fn rank(actions: &[UserAction], limit: usize) -> Vec<String> {
    let mut totals = aggregate(&weigh(actions));
    // sort_by 是稳定排序，同权重保持首次出现顺序
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals.truncate(limit);
    totals.into_iter().map(|(name, _)| name).collect()
}

/// Fetches posts and comments concurrently and ranks them.
///
/// Personalization is optional, so any fetch failure yields an empty list.
pub async fn rank_user_activity(
    source: &dyn ActivitySource,
    user: &str,
    limits: RankLimits,
) -> Vec<String> {
    let (posts, comments) = futures::join!(
        source.recent_posts(user, limits.posts),
        source.recent_comments(user, limits.comments),
    );

    let (posts, comments) = match (posts, comments) {
        (Ok(posts), Ok(comments)) => (posts, comments),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(user, error = %e, "Activity fetch failed, using default pool only");
            return Vec::new();
        }
    };

    // 帖子在前、评论在后，决定同权重时的先后
    let mut actions = posts;
    actions.extend(comments);

    let ranked = rank(&actions, limits.ranked);
    tracing::debug!(user, actions = actions.len(), ranked = ranked.len(), "Ranked user activity");
    ranked
}
