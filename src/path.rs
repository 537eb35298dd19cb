// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路径规范化
//!
//! 路由注册与请求分发使用同一个规范化函数，保证两侧的路径可以直接做字符串比较。

use crate::param::PROTECTED_SUFFIXES;

/// 将路由路径或请求路径规范化为可比较的形式。
///
/// - 空串或单独的 `/` 返回空串，表示“没有路径”。
/// - 去掉一个末尾斜杠，除非斜杠前一个字符属于 [`PROTECTED_SUFFIXES`]。
/// - 缺少前导斜杠时补上。
pub fn normalize(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return String::new();
    }

    let mut trimmed = path;
    if let Some(stripped) = trimmed.strip_suffix('/') {
        let protected = stripped
            .chars()
            .last()
            .map_or(false, |c| PROTECTED_SUFFIXES.contains(&c));
        if !protected {
            trimmed = stripped;
        }
    }

    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        ["/", trimmed].concat()
    }
}

/// 拼接前缀与路径，结果为空时退化为根路径 `/`。
pub fn join(base: &str, path: &str) -> String {
    let joined = [normalize(base), normalize(path)].concat();
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_root() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("/"), "");
    }

    #[test]
    fn test_leading_slash_added() {
        assert_eq!(normalize("x"), "/x");
        assert_eq!(normalize("users/list"), "/users/list");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        assert_eq!(normalize("/x/"), "/x");
        assert_eq!(normalize("api/"), "/api");
    }

    #[test]
    fn test_protected_suffix_keeps_slash() {
        assert_eq!(normalize("/a./"), "/a./");
        assert_eq!(normalize("/home~/"), "/home~/");
        assert_eq!(normalize("/a/"), "/a");
    }

    #[test]
    fn test_only_one_trailing_slash_removed() {
        assert_eq!(normalize("/a//"), "/a/");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "/"), "/");
        assert_eq!(join("/", ""), "/");
        assert_eq!(join("/api", "/users/"), "/api/users");
        assert_eq!(join("api/", "users"), "/api/users");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_deterministic(s in "[a-z./~]{0,12}") {
            prop_assert_eq!(normalize(&s), normalize(&s));
        }

        #[test]
        fn prop_non_empty_result_has_leading_slash(s in "[a-z./~]{0,12}") {
            let out = normalize(&s);
            prop_assert!(out.is_empty() || out.starts_with('/'));
        }

        #[test]
        fn prop_plain_segments_never_end_with_slash(s in "[a-z]{1,8}(/[a-z]{1,8}){0,3}/?") {
            let out = normalize(&s);
            prop_assert!(!out.ends_with('/'));
        }
    }
}
