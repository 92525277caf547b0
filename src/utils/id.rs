//! 事件 ID 生成器
//!
//! 宿主在分发前为每个事件生成唯一标识，写入事件元数据的保留键 `id`，
//! 并用于进行中事件表的键。ID 格式：32 位小写十六进制（无连字符的 UUID v4）。

/// 事件 ID 长度
const EVENT_ID_LENGTH: usize = 32;

/// 生成事件 ID
///
/// # Returns
///
/// 返回 32 位小写十六进制字符串
///
/// # Example
///
/// ```
/// use jimu_host::utils::id::generate_event_id;
///
/// let id = generate_event_id();
/// assert_eq!(id.len(), 32);
/// ```
pub fn generate_event_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// 验证事件 ID 格式是否有效
///
/// # Arguments
///
/// * `id` - 要验证的 ID 字符串
///
/// # Returns
///
/// 如果 ID 格式有效返回 `true`
pub fn is_valid_event_id(id: &str) -> bool {
    id.len() == EVENT_ID_LENGTH && id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_event_id_format() {
        let id = generate_event_id();
        assert_eq!(id.len(), EVENT_ID_LENGTH);
        assert!(!id.contains('-'));
        assert!(is_valid_event_id(&id));
    }

    #[test]
    fn test_generate_event_id_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = generate_event_id();
            assert!(ids.insert(id), "ID collision detected");
        }
    }

    #[test]
    fn test_is_valid_event_id() {
        assert!(is_valid_event_id("0123456789abcdef0123456789abcdef"));

        // 长度错误
        assert!(!is_valid_event_id(""));
        assert!(!is_valid_event_id("abc"));

        // 含非法字符
        assert!(!is_valid_event_id("0123456789ABCDEF0123456789ABCDEF"));
        assert!(!is_valid_event_id("0123456789abcdef-123456789abcdef"));
    }
}
