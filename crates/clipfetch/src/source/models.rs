use serde::Deserialize;

/// Body of the post-details endpoint. Attachments appear either under `post`
/// or at the top level depending on the API revision.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostResponse {
    pub post: Option<Post>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub downloadable_url: Option<String>,
    pub download_urls: Option<DownloadUrls>,
    pub encodings: Option<Encodings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DownloadUrls {
    pub no_watermark: Option<String>,
    pub watermark: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Encodings {
    pub source: Option<Encoding>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Encoding {
    pub path: Option<String>,
}

/// A playable URL and whether it still needs the watermark removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableUrl {
    pub url: String,
    pub needs_processing: bool,
}

impl PostResponse {
    pub fn first_attachment(&self) -> Option<&Attachment> {
        self.post
            .as_ref()
            .and_then(|post| post.attachments.first())
            .or_else(|| self.attachments.first())
    }
}

impl Attachment {
    /// Pick the best URL: an explicit clean copy first, then the generic
    /// download, the watermarked download, and finally the source encoding.
    pub fn playable_url(&self) -> Option<PlayableUrl> {
        let urls = self.download_urls.as_ref();

        if let Some(url) = non_empty(urls.and_then(|u| u.no_watermark.as_deref())) {
            return Some(PlayableUrl {
                url: url.to_owned(),
                needs_processing: false,
            });
        }

        non_empty(self.downloadable_url.as_deref())
            .or_else(|| non_empty(urls.and_then(|u| u.watermark.as_deref())))
            .or_else(|| {
                non_empty(
                    self.encodings
                        .as_ref()
                        .and_then(|e| e.source.as_ref())
                        .and_then(|s| s.path.as_deref()),
                )
            })
            .map(|url| PlayableUrl {
                url: url.to_owned(),
                needs_processing: true,
            })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
