use crate::utils::error::ClassifierError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};
use ndarray::Array3;
use std::path::Path;

/// 单张图片的最大字节数
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// 图像宽高上限，解码后的像素缓冲随面积线性增长
pub const MAX_IMAGE_DIMENSION: u32 = 8192;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str) -> Result<DynamicImage> {
        // 浏览器 FileReader 产生的数据URL带前缀 (data:image/xxx;base64,)
        let base64_clean = match base64_data.trim().strip_prefix("data:") {
            Some(rest) => rest
                .split_once(',')
                .map(|(_, payload)| payload)
                .ok_or_else(|| ClassifierError::InvalidInput("Malformed data URL".to_string()))?,
            None => base64_data.trim(),
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean)?;

        Self::from_bytes(&image_bytes)
    }

    /// 从字节流加载图像
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ClassifierError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        match Self::detect_format(bytes) {
            Some(format) if Self::is_supported_format(format) => {
                let image = image::load_from_memory_with_format(bytes, format)?;
                Self::validate_dimensions(&image)?;
                Ok(image)
            }
            Some(format) => Err(ClassifierError::UnsupportedFormat(format!("{:?}", format))),
            None => Err(ClassifierError::UnsupportedFormat(
                "unrecognized image data".to_string(),
            )),
        }
    }

    /// 从文件路径加载图像
    pub fn from_path(path: impl AsRef<Path>) -> Result<DynamicImage> {
        let bytes = std::fs::read(path.as_ref())?;
        tracing::debug!(
            "Read {} bytes from {}",
            bytes.len(),
            path.as_ref().display()
        );
        Self::from_bytes(&bytes)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Gif
                | ImageFormat::Tiff
                | ImageFormat::WebP
        )
    }

    /// 验证图像尺寸（零面积图像无法缩放）
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClassifierError::InvalidInput(format!(
                "Degenerate image: {}x{}",
                width, height
            )));
        }

        if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
            return Err(ClassifierError::InvalidInput(format!(
                "Image too large: {}x{} (max {}x{})",
                width, height, MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION
            )));
        }

        Ok(())
    }

    /// 转换DynamicImage为ndarray::Array3<f32> (HWC格式, RGB, 0-255)
    ///
    /// 透明通道被丢弃，灰度图被扩展为三通道。
    pub fn to_array3(image: &DynamicImage) -> Result<Array3<f32>> {
        let rgb_image = image.to_rgb8();
        let (width, height) = rgb_image.dimensions();
        let data: Vec<f32> = rgb_image
            .into_raw()
            .into_iter()
            .map(|v| v as f32)
            .collect();

        Array3::from_shape_vec((height as usize, width as usize, 3), data)
            .map_err(|e| ClassifierError::Internal(format!("Pixel buffer shape error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};
    use std::io::Cursor;

    fn encode_png(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_from_bytes_png() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(8, 4, Rgb([1u8, 2, 3])));
        let loaded = ImageLoader::from_bytes(&encode_png(&image)).unwrap();
        assert_eq!(loaded.dimensions(), (8, 4));
    }

    #[test]
    fn test_from_base64_data_url() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(2, 2, Rgb([9u8, 9, 9])));
        let encoded = base64::engine::general_purpose::STANDARD.encode(encode_png(&image));
        let data_url = format!("data:image/png;base64,{}", encoded);

        assert_eq!(ImageLoader::from_base64(&data_url).unwrap().dimensions(), (2, 2));
        assert_eq!(ImageLoader::from_base64(&encoded).unwrap().dimensions(), (2, 2));
    }

    #[test]
    fn test_invalid_base64() {
        let err = ImageLoader::from_base64("not base64 at all!").unwrap_err();
        assert!(matches!(err, ClassifierError::Base64(_)));
    }

    #[test]
    fn test_unrecognized_bytes() {
        let err = ImageLoader::from_bytes(b"plain text").unwrap_err();
        assert!(matches!(err, ClassifierError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_oversized_payload() {
        let bytes = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = ImageLoader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ClassifierError::FileTooLarge(_, MAX_IMAGE_BYTES)));
    }

    #[test]
    fn test_to_array3_drops_alpha() {
        let image = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(3, 2, Rgba([10u8, 20, 30, 0])));
        let array = ImageLoader::to_array3(&image).unwrap();
        assert_eq!(array.dim(), (2, 3, 3));
        assert_eq!(array[[1, 2, 0]], 10.0);
        assert_eq!(array[[1, 2, 1]], 20.0);
        assert_eq!(array[[1, 2, 2]], 30.0);
    }

    #[test]
    fn test_zero_area_rejected() {
        let image = DynamicImage::new_rgb8(0, 5);
        assert!(matches!(
            ImageLoader::validate_dimensions(&image),
            Err(ClassifierError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_dimension_limit() {
        let at_limit = DynamicImage::new_luma8(MAX_IMAGE_DIMENSION, 1);
        assert!(ImageLoader::validate_dimensions(&at_limit).is_ok());

        for (w, h) in [(MAX_IMAGE_DIMENSION + 1, 1), (1, MAX_IMAGE_DIMENSION + 1)] {
            match ImageLoader::validate_dimensions(&DynamicImage::new_luma8(w, h)) {
                Err(ClassifierError::InvalidInput(msg)) => assert!(msg.contains("too large")),
                other => panic!("expected InvalidInput, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_oversized_dimensions_rejected_after_decode() {
        let wide = DynamicImage::new_luma8(MAX_IMAGE_DIMENSION + 8, 2);
        let err = ImageLoader::from_bytes(&encode_png(&wide)).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));
    }
}
