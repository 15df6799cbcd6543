//! Where skins for `setByName` and `setByImage` come from.
//!
//! Looking up an account's skin or turning an image into a signed texture
//! means talking to external services. Skinforge doesn't do that itself;
//! it asks a [`SkinSource`].

use std::collections::HashMap;
use std::future::Future;

use skinforge_protocol::{Skin, SkinModel};

/// Errors a skin source can report.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The backing service couldn't be reached or refused the request.
    #[error("skin source unavailable: {0}")]
    Unavailable(String),

    /// The image couldn't be turned into a skin.
    #[error("invalid skin image: {0}")]
    InvalidImage(String),
}

/// Resolves skins from account names and images.
pub trait SkinSource: Send + Sync + 'static {
    /// The current skin of the account called `name`, or `None` if there is
    /// no such account.
    fn skin_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Skin>, SourceError>> + Send;

    /// A signed skin generated from the image at `url`.
    fn skin_from_image(
        &self,
        url: &str,
        model: SkinModel,
    ) -> impl Future<Output = Result<Option<Skin>, SourceError>> + Send;
}

/// A source that knows no skins. Name and image requests fail with
/// `SkinNotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSkinSource;

impl SkinSource for NoSkinSource {
    async fn skin_by_name(&self, _name: &str) -> Result<Option<Skin>, SourceError> {
        Ok(None)
    }

    async fn skin_from_image(&self, _url: &str, _model: SkinModel) -> Result<Option<Skin>, SourceError> {
        Ok(None)
    }
}

/// A fixed table of skins. Names match case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticSkinSource {
    by_name: HashMap<String, Skin>,
    by_image: HashMap<(SkinModel, String), Skin>,
}

impl StaticSkinSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str, skin: Skin) -> Self {
        self.by_name.insert(name.to_lowercase(), skin);
        self
    }

    pub fn with_image(mut self, url: impl Into<String>, model: SkinModel, skin: Skin) -> Self {
        self.by_image.insert((model, url.into()), skin);
        self
    }
}

impl SkinSource for StaticSkinSource {
    async fn skin_by_name(&self, name: &str) -> Result<Option<Skin>, SourceError> {
        Ok(self.by_name.get(&name.to_lowercase()).cloned())
    }

    async fn skin_from_image(&self, url: &str, model: SkinModel) -> Result<Option<Skin>, SourceError> {
        Ok(self.by_image.get(&(model, url.to_string())).cloned())
    }
}
