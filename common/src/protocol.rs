//! JSON messages of the HTTP API.
//!
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Body of `POST /predict_frame`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PredictFrameReq {
    #[serde(default)]
    pub image: Option<String>,
}

/// Successful answer of `POST /predict_frame`.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PredictFrameResp {
    /// Detected letter, empty if no hand was found.
    pub letter: String,
}

/// Answer of any endpoint that failed.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorResp {
    pub error: String,
}

/// Body of `POST /update_text`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateTextReq {
    #[serde(default)]
    pub key: Option<String>,
}

/// Answer of `POST /update_text`.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UpdateTextResp {
    pub status: String,
    pub recognized_text: String,
}

impl UpdateTextResp {
    pub fn success(recognized_text: String) -> Self {
        Self {
            status: "success".into(),
            recognized_text,
        }
    }
}

/// Answer of `GET /recognized_text`.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RecognizedTextResp {
    pub text: String,
}

/// Encode raw image bytes as a base64 data URL, the way browsers send canvas captures.
pub fn to_data_url(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// Strip a leading `data:...,` prefix from a data URL, leaving the payload.
///
/// Strings without the prefix are returned unchanged.
pub fn strip_data_url(image: &str) -> &str {
    match image.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(image, |(_, payload)| payload),
        None => image,
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::Error;

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("QUJD"), "QUJD");
        assert_eq!(strip_data_url("data:image/png;base64,"), "");
    }

    #[test]
    fn test_data_url_payload_decodes() -> Result<(), Error> {
        let url = to_data_url("image/jpeg", b"ABC");
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let payload = STANDARD.decode(strip_data_url(&url))?;
        assert_eq!(payload, b"ABC");

        Ok(())
    }

    #[test]
    fn test_missing_fields_deserialize_to_none() -> Result<(), Error> {
        let req: PredictFrameReq = serde_json::from_str("{}")?;
        assert!(req.image.is_none());

        let req: UpdateTextReq = serde_json::from_str(r#"{"key": "b"}"#)?;
        assert_eq!(req.key.as_deref(), Some("b"));

        Ok(())
    }

    #[test]
    fn test_update_text_resp_shape() -> Result<(), Error> {
        let json = serde_json::to_string(&UpdateTextResp::success("HI".into()))?;
        assert_eq!(json, r#"{"status":"success","recognized_text":"HI"}"#);

        Ok(())
    }
}
