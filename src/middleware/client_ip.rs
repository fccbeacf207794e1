use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

/// 边缘节点（Cloudflare）写入的真实客户端地址，直接信任
pub const CONNECTING_IP_HEADER: &str = "cf-connecting-ip";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// 解析受信任代理列表，无法识别的地址会被忽略
pub fn parse_trusted_proxies(raw: &[String]) -> HashSet<IpAddr> {
    raw.iter()
        .filter_map(|entry| match entry.trim().parse::<IpAddr>() {
            Ok(ip) => Some(ip.to_canonical()),
            Err(_) => {
                tracing::warn!("Ignoring invalid trusted proxy address: {:?}", entry);
                None
            }
        })
        .collect()
}

/// 计算限流使用的客户端标识
///
/// 优先级：`cf-connecting-ip` > 受信任代理转发的 `x-forwarded-for` 首个地址 > 连接地址。
/// 只有当直连对端在受信任列表中时才会采用 `x-forwarded-for`，防止伪造。
/// 双栈监听下 IPv4 对端表现为 `::ffff:a.b.c.d`，比较前统一转换为 IPv4 形式。
/// 无法确定任何地址时返回 `None`。
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: &HashSet<IpAddr>,
) -> Option<String> {
    if let Some(ip) = connecting_ip(headers) {
        return Some(ip);
    }

    let direct = peer?.ip().to_canonical();

    if trusted_proxies.contains(&direct) {
        let forwarded = header_str(headers, FORWARDED_FOR_HEADER)
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }

    Some(direct.to_string())
}

// 非 UTF-8 的内容按有损方式转换，只要非空就作为标识
fn connecting_ip(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONNECTING_IP_HEADER)?;
    let ip = String::from_utf8_lossy(value.as_bytes()).trim().to_string();
    (!ip.is_empty()).then_some(ip)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
