/// 输入校验：玩家标识即 Reddit 用户名，会被拼进 URL 和存储键，必须严格限制字符集。

const PLAYER_ID_MIN: usize = 3;
const PLAYER_ID_MAX: usize = 20;

/// 验证玩家标识：3-20 字符，只允许 ASCII 字母、数字、下划线和连字符
pub fn validate_player_id(player_id: &str) -> Result<(), &'static str> {
    let len = player_id.len();
    if !(PLAYER_ID_MIN..=PLAYER_ID_MAX).contains(&len) {
        return Err("玩家标识长度需在3到20个字符之间");
    }
    if !player_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err("玩家标识只能包含字母、数字、下划线和连字符");
    }
    Ok(())
}
