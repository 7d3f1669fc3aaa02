//! Repoints `/static` references inside the bundle entry points at the CDN.
//!
//! A React build references its chunks relative to the origin's `/static`
//! path in three places: the asset manifest, the main script (plus its source
//! map) and the main stylesheet. Everything else is uploaded untouched.

use bytes::Bytes;
use futures::{TryStreamExt, stream};
use memchr::memmem;
use pylon_core::prelude::*;
use std::path::Path;

/// What a matched pattern is replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    Literal(&'static str),
    /// `"` + CDN prefix + `/static`, resolved from the config of the pass.
    CdnStatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    /// Never empty.
    pub pattern: &'static str,
    pub replacement: Replacement,
}

const ASSET_MANIFEST_RULES: &[RewriteRule] = &[RewriteRule {
    pattern: "\"/static",
    replacement: Replacement::CdnStatic,
}];

const MAIN_SCRIPT_RULES: &[RewriteRule] = &[
    RewriteRule {
        pattern: "\"static",
        replacement: Replacement::CdnStatic,
    },
    RewriteRule {
        pattern: "=\"/\",",
        replacement: Replacement::Literal("=\"\","),
    },
];

const MAIN_STYLESHEET_RULES: &[RewriteRule] = &[RewriteRule {
    pattern: "url(/static",
    replacement: Replacement::Literal("url(../../static"),
}];

/// The files of a build that carry `/static` references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteRuleSet {
    /// `asset-manifest.json`
    AssetManifest,
    /// `main.*.js` and `main.*.map`
    MainScript,
    /// `main.*.css`
    MainStylesheet,
}

impl RewriteRuleSet {
    pub const ALL: [RewriteRuleSet; 3] = [
        RewriteRuleSet::AssetManifest,
        RewriteRuleSet::MainScript,
        RewriteRuleSet::MainStylesheet,
    ];

    /// Picks the rule set for a file name, first match wins.
    pub fn for_file_name(name: &str) -> Option<Self> {
        if name == "asset-manifest.json" {
            return Some(RewriteRuleSet::AssetManifest);
        }

        if name.split('.').next() != Some("main") {
            return None;
        }

        let ext = Path::new(name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("js" | "map") => Some(RewriteRuleSet::MainScript),
            Some("css") => Some(RewriteRuleSet::MainStylesheet),
            _ => None,
        }
    }

    pub fn rules(self) -> &'static [RewriteRule] {
        match self {
            RewriteRuleSet::AssetManifest => ASSET_MANIFEST_RULES,
            RewriteRuleSet::MainScript => MAIN_SCRIPT_RULES,
            RewriteRuleSet::MainStylesheet => MAIN_STYLESHEET_RULES,
        }
    }
}

/// Resolves [`Replacement::CdnStatic`] for a CDN prefix.
///
/// One trailing `/` is dropped so `https://cdn/answer/` and `https://cdn/answer`
/// both give `"https://cdn/answer/static`.
pub fn cdn_static_replacement(cdn_prefix: &str) -> String {
    let prefix = cdn_prefix.strip_suffix('/').unwrap_or(cdn_prefix);
    format!("\"{prefix}/static")
}

fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut last = 0;
    for start in memmem::find_iter(haystack, needle) {
        out.extend_from_slice(&haystack[last..start]);
        out.extend_from_slice(replacement);
        last = start + needle.len();
    }
    out.extend_from_slice(&haystack[last..]);
    out
}

/// Wraps already buffered content back into a stream.
pub fn once_stream(data: Bytes) -> ByteStream {
    Box::pin(stream::once(async move { Ok(data) }))
}

/// Applies rule sets with the CDN prefix of one configuration.
#[derive(Debug, Clone)]
pub struct ContentRewriter {
    cdn_static: String,
}

impl ContentRewriter {
    pub fn new(config: &PublishConfig) -> Self {
        Self::with_cdn_prefix(&config.cdn_prefix())
    }

    pub fn with_cdn_prefix(cdn_prefix: &str) -> Self {
        Self {
            cdn_static: cdn_static_replacement(cdn_prefix),
        }
    }

    /// Replaces every occurrence of every rule. Works on bytes, so content that
    /// is not valid UTF-8 passes through intact.
    pub fn apply(&self, rules: RewriteRuleSet, content: &[u8]) -> Vec<u8> {
        rules
            .rules()
            .iter()
            .fold(content.to_vec(), |content, rule| {
                let replacement = match rule.replacement {
                    Replacement::Literal(literal) => literal,
                    Replacement::CdnStatic => self.cdn_static.as_str(),
                };
                replace_all(&content, rule.pattern.as_bytes(), replacement.as_bytes())
            })
    }

    /// Buffers the whole body and returns the rewritten content.
    pub async fn rewrite(
        &self,
        rules: RewriteRuleSet,
        body: ByteStream,
        size: u64,
    ) -> Result<Bytes, std::io::Error> {
        let content = body
            .try_fold(Vec::with_capacity(size as usize), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok(buffer)
            })
            .await?;
        Ok(Bytes::from(self.apply(rules, &content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> ContentRewriter {
        ContentRewriter::with_cdn_prefix("https://cdn.example.com/answer/")
    }

    fn rewrite_str(rules: RewriteRuleSet, content: &str) -> String {
        String::from_utf8(rewriter().apply(rules, content.as_bytes())).unwrap()
    }

    #[test]
    fn selects_rule_sets_by_file_name() {
        use RewriteRuleSet::*;
        let cases = [
            ("asset-manifest.json", Some(AssetManifest)),
            ("main.abc123.js", Some(MainScript)),
            ("main.js", Some(MainScript)),
            ("main.abc123.js.map", Some(MainScript)),
            ("main.abc123.JS", Some(MainScript)),
            ("main.abc123.css", Some(MainStylesheet)),
            ("main.abc123.css.map", Some(MainScript)),
            ("main.abc123.chunk.txt", None),
            ("mainline.js", None),
            ("2.abc123.chunk.js", None),
            ("other-manifest.json", None),
            ("index.html", None),
        ];
        for (name, expected) in cases {
            assert_eq!(RewriteRuleSet::for_file_name(name), expected, "{name}");
        }
    }

    #[test]
    fn patterns_are_never_empty() {
        for set in RewriteRuleSet::ALL {
            assert!(set.rules().iter().all(|rule| !rule.pattern.is_empty()));
        }
    }

    #[test]
    fn cdn_prefix_loses_exactly_one_trailing_slash() {
        assert_eq!(
            cdn_static_replacement("https://cdn.example.com/answer/"),
            "\"https://cdn.example.com/answer/static"
        );
        assert_eq!(
            cdn_static_replacement("https://cdn.example.com/answer"),
            "\"https://cdn.example.com/answer/static"
        );
        assert_eq!(
            cdn_static_replacement("https://cdn.example.com//"),
            "\"https://cdn.example.com//static"
        );
        assert_eq!(cdn_static_replacement(""), "\"/static");
    }

    #[test]
    fn asset_manifest_points_at_the_cdn() {
        let manifest = r#"{"files":{"main.js":"/static/js/main.1.js","x":"/static/css/a.css"}}"#;
        assert_eq!(
            rewrite_str(RewriteRuleSet::AssetManifest, manifest),
            r#"{"files":{"main.js":"https://cdn.example.com/answer/static/js/main.1.js","x":"https://cdn.example.com/answer/static/css/a.css"}}"#
        );
    }

    #[test]
    fn main_script_rewrites_chunk_paths_and_public_path() {
        assert_eq!(
            rewrite_str(
                RewriteRuleSet::MainScript,
                r#"var x="static/js/2.js"; y="/",n.p="/",z"#
            ),
            r#"var x="https://cdn.example.com/answer/static/js/2.js"; y="",n.p="",z"#
        );
    }

    #[test]
    fn main_stylesheet_goes_two_levels_up() {
        assert_eq!(
            rewrite_str(
                RewriteRuleSet::MainStylesheet,
                "a{background:url(/static/media/a.png)}b{src:url(/static/f.woff)}"
            ),
            "a{background:url(../../static/media/a.png)}b{src:url(../../static/f.woff)}"
        );
    }

    #[test]
    fn content_without_matches_is_unchanged() {
        let content = "body{color:red}";
        assert_eq!(rewrite_str(RewriteRuleSet::MainStylesheet, content), content);
    }

    #[test]
    fn invalid_utf8_survives_rewriting() {
        let content = b"\xff\xfeurl(/static/a.png)\xc3";
        assert_eq!(
            rewriter().apply(RewriteRuleSet::MainStylesheet, content),
            b"\xff\xfeurl(../../static/a.png)\xc3".to_vec()
        );
    }

    #[test]
    fn rewriting_is_deterministic() {
        let content = r#"{"a":"/static/1","b":"/static/2"}"#;
        assert_eq!(
            rewrite_str(RewriteRuleSet::AssetManifest, content),
            rewrite_str(RewriteRuleSet::AssetManifest, content)
        );
    }

    #[tokio::test]
    async fn rewrite_buffers_every_chunk() {
        // The pattern is split across chunks.
        let body: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"a{b:url(/st")),
            Ok(Bytes::from_static(b"atic/x.png)}")),
        ]));
        let data = rewriter()
            .rewrite(RewriteRuleSet::MainStylesheet, body, 23)
            .await
            .unwrap();
        assert_eq!(data, Bytes::from_static(b"a{b:url(../../static/x.png)}"));
    }
}
