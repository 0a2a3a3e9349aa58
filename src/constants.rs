/// 每条帖子对所属社区的权重
pub const POST_WEIGHT: u32 = 2;

/// 每条评论对所属社区的权重
pub const COMMENT_WEIGHT: u32 = 1;

/// 拉取用户最近帖子数量
pub const POST_FETCH_LIMIT: usize = 20;

/// 拉取用户最近评论数量
pub const COMMENT_FETCH_LIMIT: usize = 200;

/// 个性化社区列表最大长度
pub const MAX_RANKED_COMMUNITIES: usize = 10;

/// 单次抽取最多查询次数
pub const DEFAULT_MAX_DRAW_ATTEMPTS: usize = 10;

/// 回合推进检查周期（毫秒）
pub const DEFAULT_PROGRESS_TICK_MS: u64 = 2_000;

/// 会话空闲多久后被回收（秒）
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3_600;

/// 未携带用户标识的请求共用的会话键
pub const ANONYMOUS_PLAYER: &str = "~anonymous";

/// Reddit listing 单页上限
pub const LISTING_PAGE_LIMIT: usize = 100;
