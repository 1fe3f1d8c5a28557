use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};

use crate::{
    cache::GallerySource,
    identity::VoterId,
    models::*,
};

const VOTER_HEADER: &str = "X-Voter-Id";

/// Thin wrapper over the FrontRow HTTP API. Every request carries the voter id.
pub struct Api {
    client: Client,
    base: Url,
    voter: VoterId,
}

impl Api {
    pub fn new(base: &str, voter: VoterId, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: Url::parse(base)?,
            voter,
        })
    }

    pub fn voter(&self) -> &VoterId {
        &self.voter
    }

    /// Builds a URL from raw path segments, percent-encoding each of them.
    fn url(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("{} cannot be used as a base URL", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> anyhow::Result<Response> {
        req.header(VOTER_HEADER, self.voter.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Store unavailable: request timed out")
                } else {
                    anyhow::anyhow!("Store unavailable: {e}")
                }
            })
    }

    pub async fn list_concerts(&self) -> anyhow::Result<Vec<Concert>> {
        let response = self.send(self.client.get(self.url(&["concerts"])?)).await?;
        Ok(check(response).await?.json().await?)
    }

    /// `None` when no event has that name.
    pub async fn fetch_concert(&self, band_name: &str) -> anyhow::Result<Option<Concert>> {
        let response = self
            .send(self.client.get(self.url(&["concerts", band_name])?))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    pub async fn create_concert(
        &self,
        band_name: &str,
        concert_date: Option<String>,
    ) -> anyhow::Result<Concert> {
        let body = NewConcert {
            band_name: band_name.to_string(),
            concert_date,
        };
        let response = self
            .send(self.client.post(self.url(&["concerts"])?).json(&body))
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn latest_photos(&self, band_name: &str, limit: usize) -> anyhow::Result<Vec<Photo>> {
        let mut url = self.url(&["concerts", band_name, "photos"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let response = self.send(self.client.get(url)).await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn add_photo(&self, band_name: &str, photo_url: &str) -> anyhow::Result<Photo> {
        let body = NewPhoto {
            photo_url: photo_url.to_string(),
        };
        let response = self
            .send(
                self.client
                    .post(self.url(&["concerts", band_name, "photos"])?)
                    .json(&body),
            )
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

impl GallerySource for Api {
    async fn fetch_gallery(&self, band_name: &str) -> anyhow::Result<Vec<GalleryEntry>> {
        let response = self
            .send(self.client.get(self.url(&["concerts", band_name, "gallery"])?))
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn cast_vote(&self, photo_id: i64, vote_type: bool) -> anyhow::Result<Option<bool>> {
        let url = self.url(&["photos", &photo_id.to_string(), "vote"])?;
        let response = self
            .send(self.client.post(url).json(&VoteRequest { vote_type }))
            .await?;
        let body: VoteResponse = check(response).await?.json().await?;
        Ok(body.vote)
    }
}

/// Turns a non-success status into an error carrying the server's message.
async fn check(response: Response) -> anyhow::Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await?;
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if body.retry => anyhow::bail!("Store unavailable ({}): {}", status, body.error),
        Ok(body) => anyhow::bail!("API error ({}): {}", status, body.error),
        Err(_) => anyhow::bail!("API error ({}): {}", status, text),
    }
}
