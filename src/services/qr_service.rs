// src/services/qr_service.rs

use image::{ImageBuffer, Luma};
use qrcode::QrCode;

use crate::common::error::AppError;

/// QR codes das permissões: a URL do serviço externo (gravada na aprovação)
/// e a renderização local do mesmo conteúdo.
#[derive(Debug, Clone)]
pub struct QrService {
    base_url: String,
    size: u32,
}

impl QrService {
    pub fn new(base_url: impl Into<String>, size: u32) -> Self {
        Self { base_url: base_url.into(), size }
    }

    pub fn image_url(&self, data: &str) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}size={}x{}&data={}",
            self.base_url,
            separator,
            self.size,
            self.size,
            urlencoding::encode(data)
        )
    }

    pub fn render(&self, data: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, AppError> {
        let code = QrCode::new(data.as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(code
            .render::<Luma<u8>>()
            .min_dimensions(self.size, self.size)
            .build())
    }

    pub fn render_png(&self, data: &str) -> Result<Vec<u8>, AppError> {
        let image = image::DynamicImage::ImageLuma8(self.render(data)?);

        let mut buffer = Vec::new();
        image
            .write_to(&mut buffer, image::ImageOutputFormat::Png)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
        Ok(buffer)
    }
}
