use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::{ApiClient, GalleryApi, Thumbnail};
use crate::error::ClientResult;
use crate::models::{Gallery, GalleryList, GalleryQuery, Stats};

#[async_trait]
impl GalleryApi for ApiClient {
    async fn list_galleries(&self, query: &GalleryQuery) -> ClientResult<GalleryList> {
        let request = self.client().get(self.gallery_url("/galleries")).query(query);
        self.send_json(request).await
    }

    async fn get_gallery(&self, gid: i64) -> ClientResult<Gallery> {
        let request = self
            .client()
            .get(self.gallery_url(&format!("/galleries/{}", gid)));
        self.send_json(request).await
    }

    async fn stats(&self) -> ClientResult<Stats> {
        let request = self.client().get(self.gallery_url("/stats"));
        self.send_json(request).await
    }

    async fn thumbnail(&self, gid: i64) -> ClientResult<Thumbnail> {
        let request = self.client().get(self.thumbnail_url(gid));
        let response = self.send(request).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        Ok(Thumbnail {
            gid,
            content_type,
            bytes,
        })
    }
}
