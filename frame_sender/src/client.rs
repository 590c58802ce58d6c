//! HTTP client of the ASL letter server.
//!
use common::protocol::{
    to_data_url, ErrorResp, PredictFrameReq, PredictFrameResp, RecognizedTextResp,
    UpdateTextReq, UpdateTextResp,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use simple_error::simple_error;

use crate::{sensors::EncodedFrame, Error};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Post a frame and get the letter detected on it.
    pub async fn predict_frame(&self, frame: &EncodedFrame) -> Result<String, Error> {
        let req = PredictFrameReq {
            image: Some(to_data_url(frame.mime, &frame.data)),
        };
        let resp = self
            .client
            .post(self.url("predict_frame"))
            .json(&req)
            .send()
            .await?;
        let resp: PredictFrameResp = parse(resp).await?;

        Ok(resp.letter)
    }

    /// Send one of the edit keys `c`, `s` or `b`.
    pub async fn update_text(&self, key: &str) -> Result<String, Error> {
        let req = UpdateTextReq {
            key: Some(key.to_owned()),
        };
        let resp = self
            .client
            .post(self.url("update_text"))
            .json(&req)
            .send()
            .await?;
        let resp: UpdateTextResp = parse(resp).await?;

        Ok(resp.recognized_text)
    }

    pub async fn recognized_text(&self) -> Result<String, Error> {
        let resp = self.client.get(self.url("recognized_text")).send().await?;
        let resp: RecognizedTextResp = parse(resp).await?;

        Ok(resp.text)
    }
}

/// Parse a successful answer, or turn the error answer into an error.
async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let message = match resp.json::<ErrorResp>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    Err(simple_error!("Server answered {}: {}", status, message).into())
}
