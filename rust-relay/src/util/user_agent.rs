//! Request header helpers.

/// Build standard headers for feed requests.
pub fn build_headers(user_agent: &str) -> Vec<(String, String)> {
    vec![
        ("User-Agent".to_string(), user_agent.to_string()),
        (
            "Accept".to_string(),
            "application/rss+xml, application/atom+xml, application/xml;q=0.9, */*;q=0.8".to_string(),
        ),
    ]
}
