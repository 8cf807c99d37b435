//! Social share links

use serde::Serialize;

use super::url::encode_component;

/// A share target rendered under a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLink {
    pub network: &'static str,
    pub label: &'static str,
    pub href: String,
}

/// Facebook, Twitter and LinkedIn links for `url`
pub fn share_links(url: &str, title: &str) -> Vec<ShareLink> {
    let url = encode_component(url);
    let title = encode_component(title);

    vec![
        ShareLink {
            network: "facebook",
            label: "Facebook",
            href: format!("https://www.facebook.com/sharer/sharer.php?u={}", url),
        },
        ShareLink {
            network: "twitter",
            label: "Twitter",
            href: format!("https://twitter.com/intent/tweet?url={}&text={}", url, title),
        },
        ShareLink {
            network: "linkedin",
            label: "LinkedIn",
            href: format!(
                "https://www.linkedin.com/shareArticle?mini=true&url={}&title={}",
                url, title
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_links_encode_url_and_title() {
        let links = share_links("http://localhost:4000/post/a b/", "Rust & You");
        assert_eq!(links.len(), 3);
        assert_eq!(
            links[0].href,
            "https://www.facebook.com/sharer/sharer.php?u=http%3A%2F%2Flocalhost%3A4000%2Fpost%2Fa%20b%2F"
        );
        assert!(links[1].href.ends_with("&text=Rust%20%26%20You"));
        assert!(links[2].href.contains("mini=true&url=http%3A%2F%2F"));
        assert!(links[2].href.ends_with("&title=Rust%20%26%20You"));
    }
}
