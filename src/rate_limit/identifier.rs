use std::net::IpAddr;

use axum::http::HeaderMap;

pub const UNKNOWN_CLIENT: &str = "unknown";

const MAX_HOSTNAME_LEN: usize = 253;

/// 生成限流用的客户端标识
///
/// 已登录用户按账号限流，其余请求按代理头中的 IP 限流。
/// 不合法的头部值一律归为 `unknown`，防止任意字符串进入键空间。
pub fn client_identifier(headers: &HeaderMap, user_id: Option<&str>) -> String {
    if let Some(user_id) = user_id.filter(|id| !id.is_empty()) {
        return format!("user:{}", user_id);
    }

    let candidate = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| non_empty_header(headers, "x-real-ip"))
        .or_else(|| non_empty_header(headers, "cf-connecting-ip"));

    match candidate {
        Some(ip) if is_plausible_address(ip) => format!("ip:{}", ip),
        _ => format!("ip:{}", UNKNOWN_CLIENT),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

fn non_empty_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    header_str(headers, name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn is_plausible_address(candidate: &str) -> bool {
    candidate.parse::<IpAddr>().is_ok() || is_hostname_token(candidate)
}

fn is_hostname_token(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_HOSTNAME_LEN
        && !candidate.starts_with(['-', '.'])
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}
