// src/supervisor/launch_url.rs
// Scans process stdout for the two well-known launch-url patterns.

use once_cell::sync::Lazy;
use regex::Regex;

static GRADIO_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://[a-zA-Z0-9-]+\.gradio\.live").unwrap());

/// If `command` requests `--share`, look for the public gradio.live URL;
/// otherwise synthesize the loopback URL once the process announces it
/// is listening locally.
pub fn discover(command: &str, port: u16, line: &str) -> Option<String> {
    if command.contains("--share") {
        GRADIO_URL.find(line).map(|m| m.as_str().to_string())
    } else if line.contains("127.0.0.1") {
        Some(format!("http://127.0.0.1:{port}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_gradio_url_in_share_mode() {
        let line = "* Running on public URL: https://85f6f17d6d725c6cde.gradio.live";
        let found = discover("app.sh --share", 7860, line);
        assert_eq!(found.as_deref(), Some("https://85f6f17d6d725c6cde.gradio.live"));
    }

    #[test]
    fn synthesizes_loopback_url_without_share() {
        let line = "* Running on local URL: http://127.0.0.1:7860";
        let found = discover("app.sh --listen", 7860, line);
        assert_eq!(found.as_deref(), Some("http://127.0.0.1:7860"));
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert_eq!(discover("app.sh --listen", 7860, "loading model..."), None);
    }
}
