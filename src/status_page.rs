//! The HTML page served at `/`.
//!
//! When the deployment URL is known the page shows the full relay URL that goes into
//! the survey's `LUCIDBackendURL` embedded data field.

const RELAY_PATH: &str = "/lucid";

const STYLE: &str = "body { font-family: system-ui, sans-serif; padding: 20px; line-height: 1.6; background-color: #fafafa; color: #333; }\
.container { max-width: 700px; margin: 40px auto; padding: 30px; border: 1px solid #eaeaea; border-radius: 8px; background-color: #fff; }\
h1 { color: #0070f3; }\
code { background-color: #f0f0f0; padding: 0.2em 0.4em; border-radius: 3px; font-family: monospace; }\
.url-box { background-color: #f3f3f3; padding: 10px 15px; border: 1px solid #ddd; border-radius: 4px; font-family: monospace; word-wrap: break-word; margin-bottom: 15px; }\
button { padding: 10px 18px; cursor: pointer; border-radius: 5px; border: none; background-color: #0070f3; color: white; }\
.copied { color: green; font-weight: bold; display: none; margin-left: 10px; }";

const COPY_SCRIPT: &str = "function copyUrl() { \
const text = document.getElementById('relayUrl').innerText; \
navigator.clipboard.writeText(text).then(() => { \
const msg = document.getElementById('copied'); msg.style.display = 'inline'; \
setTimeout(() => { msg.style.display = 'none'; }, 2500); \
}).catch(() => alert('Failed to copy URL.')); }";

/// Builds the relay URL from a deployment host such as Vercel's `VERCEL_URL`, which
/// usually comes without a scheme.
pub fn relay_url(deployment_url: &str) -> String {
    let base = deployment_url.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}{RELAY_PATH}")
    } else {
        format!("https://{base}{RELAY_PATH}")
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn render(deployment_url: Option<&str>) -> String {
    match deployment_url.filter(|url| !url.trim().is_empty()) {
        Some(url) => {
            let url = escape_html(&relay_url(url));
            format!(
                "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
<title>LUCID Backend Deployed</title><style>{STYLE}</style></head><body>\
<div class=\"container\"><h1>LUCID Backend Successfully Deployed!</h1>\
<p>To use this backend with your Qualtrics survey:</p><ol>\
<li><strong>Copy the full URL below.</strong></li>\
<li>In your Qualtrics Survey Flow, set the Embedded Data field named <code>LUCIDBackendURL</code> to this value.</li>\
</ol><p><strong>Qualtrics URL (value for <code>LUCIDBackendURL</code>):</strong></p>\
<div id=\"relayUrl\" class=\"url-box\">{url}</div>\
<button onclick=\"copyUrl()\">Copy URL</button><span id=\"copied\" class=\"copied\">Copied!</span>\
</div><script>{COPY_SCRIPT}</script></body></html>"
            )
        }
        None => format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\"><title>LUCID Backend</title>\
<style>{STYLE}</style></head><body><div class=\"container\"><h1>LUCID Backend Running</h1>\
<p>This is the backend server for the LUCID Qualtrics tool.</p>\
<p><em>(No deployment URL configured. Append <code>{RELAY_PATH}</code> to your deployment URL for Qualtrics.)</em></p>\
</div></body></html>"
        ),
    }
}
