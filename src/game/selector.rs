use rand::Rng;

use crate::game::types::DrawOutcome;
use crate::services::EntityLookup;

/// Draws a uniformly random candidate and validates it with a live lookup.
///
/// A rejected name is removed from this call's working set, so at most
/// `max_attempts` lookups happen and no name is looked up twice. An empty
/// pool returns `Exhausted` without any lookup.
pub async fn draw_random<R>(
    lookup: &dyn EntityLookup,
    pool: &[String],
    max_attempts: usize,
    rng: &mut R,
) -> DrawOutcome
where
    R: Rng + ?Sized,
{
    let mut remaining: Vec<&str> = pool.iter().map(String::as_str).collect();
    let mut attempts = 0usize;

    while attempts < max_attempts && !remaining.is_empty() {
        let idx = rng.gen_range(0..remaining.len());
        let name = remaining.swap_remove(idx);
        attempts += 1;

        match lookup.entity_info(name).await {
            Ok(entity) if !entity.name.trim().is_empty() => {
                tracing::debug!(name, subscribers = entity.subscribers, attempts, "Drew entity");
                return DrawOutcome::Found(entity);
            }
            Ok(_) => {
                tracing::warn!(name, attempts, "Lookup returned an unnamed entity, retrying");
            }
            Err(e) => {
                tracing::warn!(name, attempts, error = %e, "Entity lookup failed, retrying");
            }
        }
    }

    tracing::warn!(
        attempts,
        pool_size = pool.len(),
        "Draw exhausted without a valid entity"
    );
    DrawOutcome::Exhausted
}
