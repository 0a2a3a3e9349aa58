pub const KV: &str = "kv";
