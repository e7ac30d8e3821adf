use crate::basic::result::ConfResult;

const SCHEME_SPLIT: &str = "://";

/// Uri handle for config server addresses.
///
/// # Examples
/// ```ignore
/// use confsource::basic::uri::ConfUri;
/// assert_eq!(ConfUri.ensure_scheme("10.0.0.1:9000", false), "http://10.0.0.1:9000");
/// assert_eq!(ConfUri.replace_scheme("rest://10.0.0.1:9000", true).unwrap(), "https://10.0.0.1:9000");
/// assert_eq!(ConfUri.join("http://10.0.0.1:9000/", "/members"), "http://10.0.0.1:9000/members");
/// ```
pub struct ConfUri;

impl ConfUri {
    /// Prefix `https://` or `http://` when the address carries no scheme.
    ///
    /// An existing scheme is never removed.
    pub fn ensure_scheme(&self, address: &str, enable_ssl: bool) -> String {
        if address.contains(SCHEME_SPLIT) {
            address.to_string()
        } else if enable_ssl {
            format!("https://{address}")
        } else {
            format!("http://{address}")
        }
    }

    /// Swap whatever scheme an advertised endpoint uses (e.g. `rest://`) for the http one.
    ///
    /// Returns `None` for endpoints without exactly one scheme separator.
    pub fn replace_scheme(&self, endpoint: &str, enable_ssl: bool) -> Option<String> {
        let parts = endpoint.split(SCHEME_SPLIT).collect::<Vec<&str>>();
        if parts.len() != 2 {
            return None;
        }
        Some(if enable_ssl { format!("https://{}", parts[1]) } else { format!("http://{}", parts[1]) })
    }

    /// Concatenate a host and a path, keeping exactly one `/` between them.
    pub fn join(&self, host: &str, path_and_query: &str) -> String {
        if path_and_query.is_empty() {
            host.to_string()
        } else if path_and_query.starts_with('/') && host.ends_with('/') {
            format!("{}{}", host, &path_and_query[1..])
        } else if !path_and_query.starts_with('/') && !host.ends_with('/') {
            format!("{host}/{path_and_query}")
        } else {
            format!("{host}{path_and_query}")
        }
    }

    /// Split a comma separated server list, removing blanks.
    pub fn split_server_uri(&self, server_uri: &str) -> Vec<String> {
        server_uri.split(',').map(|value| value.replace(' ', "")).filter(|value| !value.is_empty()).collect()
    }

    /// Check that the uri is absolute and return it without trailing `/`.
    pub fn validate(&self, uri_str: &str) -> ConfResult<String> {
        url::Url::parse(uri_str)?;
        Ok(uri_str.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ConfUri;

    #[test]
    fn test_ensure_scheme() {
        assert_eq!(ConfUri.ensure_scheme("10.0.0.1:9000", false), "http://10.0.0.1:9000");
        assert_eq!(ConfUri.ensure_scheme("10.0.0.1:9000", true), "https://10.0.0.1:9000");
        assert_eq!(ConfUri.ensure_scheme("http://10.0.0.1:9000", true), "http://10.0.0.1:9000");
        assert_eq!(ConfUri.ensure_scheme("https://10.0.0.1:9000", false), "https://10.0.0.1:9000");
    }

    #[test]
    fn test_replace_scheme() {
        assert_eq!(ConfUri.replace_scheme("rest://10.0.0.1:30103", false).unwrap(), "http://10.0.0.1:30103");
        assert_eq!(ConfUri.replace_scheme("rest://10.0.0.1:30103", true).unwrap(), "https://10.0.0.1:30103");
        assert!(ConfUri.replace_scheme("10.0.0.1:30103", true).is_none());
    }

    #[test]
    fn test_join_and_split() {
        assert_eq!(ConfUri.join("http://a:1", "/members"), "http://a:1/members");
        assert_eq!(ConfUri.join("http://a:1/", "/members"), "http://a:1/members");
        assert_eq!(ConfUri.join("http://a:1", "members"), "http://a:1/members");
        assert_eq!(ConfUri.join("http://a:1/", "members"), "http://a:1/members");
        assert_eq!(ConfUri.split_server_uri("http://a:1, http://b:2,,"), vec!["http://a:1".to_string(), "http://b:2".to_string()]);
        assert!(ConfUri.validate("not a uri").is_err());
        assert_eq!(ConfUri.validate("http://127.0.0.1:8080/").unwrap(), "http://127.0.0.1:8080");
    }
}
