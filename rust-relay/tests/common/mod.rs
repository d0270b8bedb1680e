#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use feedrelay::util::Pacer;

/// Pacer that records pauses instead of sleeping.
#[derive(Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

/// Atom listing in reddit's shape, newest entry first.
pub fn reddit_atom(entries: &[(&str, &str, &str)]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
  <id>/r/test/.rss</id>
  <title>submissions</title>
  <updated>2024-05-01T12:00:00+00:00</updated>
"#,
    );

    for (id, title, image) in entries {
        body.push_str(&format!(
            r#"  <entry>
    <id>{id}</id>
    <title>{title}</title>
    <link href="https://old.reddit.com/r/test/comments/{id}/"/>
    <updated>2024-05-01T12:00:00+00:00</updated>
    <content type="html">&lt;a href=&quot;{image}&quot;&gt;[link]&lt;/a&gt; &lt;a href=&quot;https://old.reddit.com/r/test/comments/{id}/&quot;&gt;[comments]&lt;/a&gt;</content>
  </entry>
"#
        ));
    }

    body.push_str("</feed>\n");
    body
}

/// RSS 2.0 channel whose items carry no `<guid>`. Each item is
/// `(title, link, image)`; a `None` link omits the element.
pub fn rss_without_guids(items: &[(&str, Option<&str>, &str)]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Sketches</title>
    <link>https://sketch.example.com/</link>
    <description>Daily sketches</description>
"#,
    );

    for (title, link, image) in items {
        body.push_str("    <item>\n");
        body.push_str(&format!("      <title>{title}</title>\n"));
        if let Some(link) = link {
            body.push_str(&format!("      <link>{link}</link>\n"));
        }
        body.push_str(&format!(
            "      <description>&lt;img src=&quot;{image}&quot;&gt;</description>\n"
        ));
        body.push_str("    </item>\n");
    }

    body.push_str("  </channel>\n</rss>\n");
    body
}
