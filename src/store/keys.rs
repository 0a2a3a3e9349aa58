pub const GLOBAL_HIGH_SCORE_KEY: &str = "high_score:global";

pub fn high_score_key(user_id: &str) -> String {
    format!("high_score:{}", user_id)
}
