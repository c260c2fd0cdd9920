/// 用户输入代码的最大长度
pub const MAX_SYMBOL_LEN: usize = 50;

/// # Summary
/// 规范化用户在命令行中输入的股票代码。
///
/// # Logic
/// 1. 去除首尾空白并统一转为大写。
/// 2. 校验只包含大写字母、数字、`-` 与 `.`，且长度不超过 `MAX_SYMBOL_LEN`。
///
/// # Arguments
/// * `input`: 原始输入。
///
/// # Returns
/// 合法时返回规范化后的代码，否则返回 `None`。
///
/// # Invariants
/// - 导入管线不经过此函数：CSV 中的代码按原样（仅去空白）存储。
pub fn normalize_symbol(input: &str) -> Option<String> {
    let symbol = input.trim().to_uppercase();
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return None;
    }
    let valid = symbol
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '.');
    valid.then_some(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol_uppercases_and_trims() {
        assert_eq!(normalize_symbol("  infy "), Some("INFY".to_string()));
        assert_eq!(normalize_symbol("bajaj-auto"), Some("BAJAJ-AUTO".to_string()));
        assert_eq!(normalize_symbol("m.m"), Some("M.M".to_string()));
    }

    #[test]
    fn test_normalize_symbol_rejects_invalid() {
        assert_eq!(normalize_symbol(""), None);
        assert_eq!(normalize_symbol("   "), None);
        assert_eq!(normalize_symbol("M&M"), None);
        assert_eq!(normalize_symbol(&"A".repeat(MAX_SYMBOL_LEN + 1)), None);
    }
}
