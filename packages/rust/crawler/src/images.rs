//! Image handling: download next to the page, inline as base64, or link.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use arcdex_shared::{ArcdexError, IMAGES_SUBDIR, ImageMode, Item, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use regex::Regex;
use tracing::debug;

use crate::client::WikiClient;

/// Replace characters that are unsafe in file names with `_`.
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));
    UNSAFE_RE.replace_all(name, "_").into_owned()
}

/// `<category>_<name>.png`, both parts sanitized.
pub fn image_file_name(listing_category: &str, item_name: &str) -> String {
    format!(
        "{}_{}.png",
        sanitize_filename(listing_category),
        sanitize_filename(item_name)
    )
}

/// Applies the configured [`ImageMode`] to scraped items.
#[derive(Debug, Clone)]
pub struct ImageStore {
    mode: ImageMode,
    images_dir: PathBuf,
}

impl ImageStore {
    pub fn new(mode: ImageMode, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            images_dir: images_dir.into(),
        }
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Create the images directory when images are downloaded.
    pub fn prepare(&self) -> Result<()> {
        if self.mode == ImageMode::Download {
            std::fs::create_dir_all(&self.images_dir)
                .map_err(|e| ArcdexError::io(&self.images_dir, e))?;
        }
        Ok(())
    }

    /// Fetch the item's image according to the mode.
    ///
    /// Items without an `image_url` and `link` mode are no-ops. On error the
    /// item is left untouched.
    pub async fn attach(
        &self,
        client: &WikiClient,
        item: &mut Item,
        listing_category: &str,
    ) -> Result<()> {
        let Some(image_url) = item.image_url.clone() else {
            return Ok(());
        };

        match self.mode {
            ImageMode::Link => {}
            ImageMode::Embed => {
                let bytes = client.fetch_bytes(&image_url).await?;
                item.image_base64 = Some(STANDARD.encode(&bytes));
                debug!(item = %item.name, bytes = bytes.len(), "embedded image");
            }
            ImageMode::Download => {
                let bytes = client.fetch_bytes(&image_url).await?;
                let file_name = image_file_name(listing_category, &item.name);
                let path = self.images_dir.join(&file_name);
                std::fs::write(&path, &bytes).map_err(|e| ArcdexError::io(&path, e))?;
                item.image_path = Some(format!("{IMAGES_SUBDIR}/{file_name}"));
                debug!(item = %item.name, path = %path.display(), "downloaded image");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcdex_shared::HttpConfig;

    #[test]
    fn sanitize_replaces_each_unsafe_char() {
        assert_eq!(sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_filename("Rubber Duck"), "Rubber Duck");
    }

    #[test]
    fn file_name_uses_listing_category() {
        assert_eq!(image_file_name("Quick Use", "Adrenaline Shot"), "Quick Use_Adrenaline Shot.png");
        assert_eq!(image_file_name("Loot", "A/B"), "Loot_A_B.png");
    }

    #[tokio::test]
    async fn embed_and_download_modes() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/images/Duck.png"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
            .mount(&server)
            .await;

        let client = WikiClient::new(&HttpConfig {
            timeout_secs: 5,
            rate_limit_ms: 0,
        })
        .unwrap();

        let mut item = Item::new("Rubber Duck", "https://arcraiders.wiki/wiki/Rubber_Duck");
        item.image_url = Some(format!("{}/images/Duck.png", server.uri()));

        // Embed
        let store = ImageStore::new(ImageMode::Embed, std::env::temp_dir());
        let mut embedded = item.clone();
        store.attach(&client, &mut embedded, "Trinkets").await.unwrap();
        assert_eq!(embedded.image_base64.as_deref(), Some("UE5HREFUQQ=="));
        assert!(embedded.image_path.is_none());

        // Download
        let dir = std::env::temp_dir().join(format!("arcdex-images-{}", uuid::Uuid::now_v7()));
        let store = ImageStore::new(ImageMode::Download, &dir);
        store.prepare().unwrap();
        let mut downloaded = item.clone();
        store.attach(&client, &mut downloaded, "Trinkets").await.unwrap();
        assert_eq!(
            downloaded.image_path.as_deref(),
            Some("images/Trinkets_Rubber Duck.png")
        );
        let written = std::fs::read(dir.join("Trinkets_Rubber Duck.png")).unwrap();
        assert_eq!(written, b"PNGDATA");

        // Link
        let store = ImageStore::new(ImageMode::Link, &dir);
        let mut linked = item.clone();
        store.attach(&client, &mut linked, "Trinkets").await.unwrap();
        assert_eq!(linked, item);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_download_leaves_item_untouched() {
        let server = wiremock::MockServer::start().await;
        let client = WikiClient::new(&HttpConfig {
            timeout_secs: 5,
            rate_limit_ms: 0,
        })
        .unwrap();

        let mut item = Item::new("Kettle", "https://arcraiders.wiki/wiki/Kettle");
        item.image_url = Some(format!("{}/images/missing.png", server.uri()));
        let before = item.clone();

        let store = ImageStore::new(ImageMode::Embed, std::env::temp_dir());
        assert!(store.attach(&client, &mut item, "Weapons").await.is_err());
        assert_eq!(item, before);
    }
}
