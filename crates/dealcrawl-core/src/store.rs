//! Store identity derived from product page URLs.

/// Strips a single leading `"www."` from a host-like string.
#[must_use]
pub fn strip_www(site: &str) -> &str {
    site.strip_prefix("www.").unwrap_or(site)
}

/// Canonical form of a site name as written in configuration: the host is
/// lowercased and IDNA-encoded the way URL hosts are, and an explicit
/// `:port` suffix is kept. Input that is not a valid host is only lowercased.
///
/// `"Farmácia.pt"` becomes `"xn--farmcia-kwa.pt"`, matching
/// [`store_identity`] for `"https://farmácia.pt/..."`.
#[must_use]
pub fn normalize_site(site: &str) -> String {
    let site = site.trim();
    let (host, port) = match site.rsplit_once(':') {
        Some((host, port))
            if !host.is_empty() && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (host, Some(port))
        }
        _ => (site, None),
    };

    let Ok(parsed) = url::Host::parse(host) else {
        return site.to_lowercase();
    };
    match port {
        Some(port) => format!("{parsed}:{port}"),
        None => parsed.to_string(),
    }
}

/// Returns the store a URL belongs to: its host (plus any explicit port) with
/// a leading `"www."` removed.
///
/// `"https://www.notino.pt/cerave/"` and `"https://notino.pt/x"` both resolve
/// to `"notino.pt"`, so prices from either land in the same cart. Hosts come
/// out lowercased and IDNA-encoded, like [`normalize_site`]. Falls back to the
/// full input when no host can be parsed.
///
/// Unlike a raw network location, user info is dropped and a port equal to
/// the scheme's default is omitted: `"https://x.pt:443/"` is `"x.pt"`.
#[must_use]
pub fn store_identity(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return url.to_string();
    };

    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) if !host.is_empty() => format!("{}:{port}", strip_www(host)),
        (Some(host), None) if !host.is_empty() => strip_www(host).to_string(),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_www_prefix() {
        assert_eq!(store_identity("https://www.notino.pt/cerave/"), "notino.pt");
    }

    #[test]
    fn keeps_other_subdomains() {
        assert_eq!(
            store_identity("https://shop.wells.pt/p/123"),
            "shop.wells.pt"
        );
    }

    #[test]
    fn www_and_bare_hosts_merge() {
        assert_eq!(
            store_identity("https://www.example.com/a"),
            store_identity("http://example.com/b?q=1")
        );
    }

    #[test]
    fn keeps_explicit_port() {
        assert_eq!(store_identity("http://127.0.0.1:8080/item"), "127.0.0.1:8080");
    }

    #[test]
    fn malformed_url_falls_back_to_input() {
        assert_eq!(store_identity("malformed"), "malformed");
    }

    #[test]
    fn default_port_is_omitted() {
        assert_eq!(store_identity("https://x.pt:443/p"), "x.pt");
        assert_eq!(store_identity("https://x.pt:8443/p"), "x.pt:8443");
    }

    #[test]
    fn unicode_hosts_are_punycode() {
        assert_eq!(store_identity("https://www.farmácia.pt/x"), "xn--farmcia-kwa.pt");
    }

    #[test]
    fn normalize_site_matches_url_hosts() {
        assert_eq!(normalize_site("Farmácia.PT"), "xn--farmcia-kwa.pt");
        assert_eq!(normalize_site("Wells.pt"), "wells.pt");
        assert_eq!(normalize_site("www.Notino.pt"), "www.notino.pt");
        assert_eq!(
            normalize_site("farmácia.pt"),
            store_identity("https://farmácia.pt/produto")
        );
    }

    #[test]
    fn normalize_site_keeps_explicit_port() {
        assert_eq!(normalize_site("Shop.PT:8080"), "shop.pt:8080");
        assert_eq!(normalize_site("127.0.0.1:8080"), "127.0.0.1:8080");
    }

    #[test]
    fn normalize_site_lowercases_unparsable_input() {
        assert_eq!(normalize_site("Bad Site"), "bad site");
    }

    #[test]
    fn strip_www_only_touches_the_prefix() {
        assert_eq!(strip_www("www.example.com"), "example.com");
        assert_eq!(strip_www("example.www.com"), "example.www.com");
    }
}
