use std::io::Cursor;

use image::io::Reader as ImageReader;
use image::ImageFormat;

use crate::error::GenerateError;
use crate::params::GeneratePayload;

#[derive(Debug, Clone)]
pub struct ImageClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ImageClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        ImageClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn generate(&self, payload: &GeneratePayload) -> Result<Vec<u8>, GenerateError> {
        log::info!("POST {}", self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;
        read_image_body(response).await
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, GenerateError> {
        log::debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;
        read_image_body(response).await
    }
}

async fn read_image_body(response: reqwest::Response) -> Result<Vec<u8>, GenerateError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GenerateError::Status { code: status.as_u16() });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GenerateError::Body(e.to_string()))?;
    log::debug!("received {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Sniffs the format and reads the dimensions without decoding pixels.
pub fn inspect_image(bytes: &[u8]) -> Option<ImageInfo> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    let format = reader.format()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(ImageInfo { width, height, format })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Field, ParameterRecord, Psf};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use image::{DynamicImage, ImageOutputFormat, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/generate-image/")
    }

    // Strict JSON extraction rejects bodies with a wrong content type or
    // missing/extra keys, so a 200 means the payload matched exactly.
    fn echo_service() -> Router {
        Router::new().route(
            "/api/generate-image/",
            post(|Json(payload): Json<GeneratePayload>| async move {
                let side = payload.sma as u32;
                let height = if payload.psf == Psf::Nircam360Fm { 2 } else { 1 };
                png(side, height)
            }),
        )
    }

    #[tokio::test]
    async fn test_generate_posts_full_payload() {
        let client = ImageClient::new(serve(echo_service()).await);
        let record = ParameterRecord::default()
            .with_field(Field::Sma, "32")
            .with_field(Field::Psf, "NIRCAM 360FM");
        let bytes = client.generate(&record.to_payload().unwrap()).await.unwrap();
        let info = inspect_image(&bytes).unwrap();
        assert_eq!((info.width, info.height), (32, 2));
        assert_eq!(info.format, ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_status_error() {
        let app = Router::new().route(
            "/api/generate-image/",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = ImageClient::new(serve(app).await);
        let payload = ParameterRecord::default().to_payload().unwrap();
        assert_eq!(
            client.generate(&payload).await,
            Err(GenerateError::Status { code: 500 })
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = ImageClient::new(format!("http://{addr}/api/generate-image/"));
        let payload = ParameterRecord::default().to_payload().unwrap();
        assert!(matches!(
            client.generate(&payload).await,
            Err(GenerateError::Transport(_))
        ));
    }

    #[test]
    fn test_inspect_image() {
        let info = inspect_image(&png(3, 5)).unwrap();
        assert_eq!((info.width, info.height), (3, 5));
        assert!(inspect_image(b"<html>not found</html>").is_none());
        assert!(inspect_image(&[]).is_none());
    }
}
