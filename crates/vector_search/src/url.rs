/// Adds an `https://` scheme when missing and drops trailing slashes.
pub fn normalize_index_host(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Builds the record search endpoint for `namespace` on `index_host`.
pub fn search_url(index_host: &str, namespace: &str) -> String {
    let namespace = match namespace.trim() {
        "" => crate::config::DEFAULT_NAMESPACE,
        value => value,
    };
    format!(
        "{}/records/namespaces/{namespace}/search",
        normalize_index_host(index_host)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_scheme() {
        assert_eq!(
            normalize_index_host("msme-abc123.svc.aped-4627-b74a.pinecone.io/"),
            "https://msme-abc123.svc.aped-4627-b74a.pinecone.io"
        );
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(
            normalize_index_host(" http://localhost:5081// "),
            "http://localhost:5081"
        );
    }

    #[test]
    fn blank_namespace_falls_back_to_default() {
        assert_eq!(
            search_url("idx.example.io", " "),
            "https://idx.example.io/records/namespaces/__default__/search"
        );
        assert_eq!(
            search_url("idx.example.io", "msme-docs"),
            "https://idx.example.io/records/namespaces/msme-docs/search"
        );
    }
}
