use crate::image::{ImageLoader, ImageTransforms};
use crate::utils::{TensorTracker, TrackedTensor};
use crate::Result;
use image::DynamicImage;
use ndarray::{Axis, Ix4};

/// 模型输入边长
pub const INPUT_SIZE: usize = 224;

/// 模型输入通道数
pub const INPUT_CHANNELS: usize = 3;

/// 模型输入张量，形状 [1, 224, 224, 3]，取值 [0.0, 1.0]
pub type InputTensor = TrackedTensor<Ix4>;

/// 分类预处理：拉伸缩放、归一化、增加batch维度
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    tracker: TensorTracker,
}

impl ImagePreprocessor {
    pub fn new(tracker: TensorTracker) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &TensorTracker {
        &self.tracker
    }

    /// 预处理流水线
    ///
    /// 中间张量都登记在计数器中，并在返回前释放，只有返回的张量保持存活。
    pub fn preprocess(&self, image: &DynamicImage) -> Result<InputTensor> {
        ImageLoader::validate_dimensions(image)?;

        let pixels = self.tracker.track(ImageLoader::to_array3(image)?);

        let resized = self.tracker.track(ImageTransforms::resize_bilinear(
            &pixels,
            INPUT_SIZE,
            INPUT_SIZE,
        )?);
        drop(pixels);

        let normalized = self.tracker.track(resized.mapv(|v| (v / 255.0).clamp(0.0, 1.0)));
        drop(resized);

        let tensor = self
            .tracker
            .track(normalized.into_array().insert_axis(Axis(0)));

        tracing::debug!(
            "Image {}x{} preprocessed, tensor shape: {:?}",
            image.width(),
            image.height(),
            tensor.shape()
        );

        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ClassifierError;
    use image::{GrayImage, ImageBuffer, Luma, Rgb};

    fn gradient_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn test_fixed_shape_for_any_dimensions() {
        let preprocessor = ImagePreprocessor::default();
        for (w, h) in [(1, 1), (224, 224), (300, 100), (7, 513), (1000, 3)] {
            let tensor = preprocessor.preprocess(&gradient_image(w, h)).unwrap();
            assert_eq!(tensor.shape(), &[1, INPUT_SIZE, INPUT_SIZE, INPUT_CHANNELS]);
            assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_normalization() {
        let preprocessor = ImagePreprocessor::default();
        let white = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(50, 20, Rgb([255u8, 255, 255])));
        let tensor = preprocessor.preprocess(&white).unwrap();
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));

        let black = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(20, 50, Rgb([0u8, 0, 0])));
        let tensor = preprocessor.preprocess(&black).unwrap();
        assert!(tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_channel_order_preserved() {
        let preprocessor = ImagePreprocessor::default();
        let red = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(10, 10, Rgb([255u8, 0, 51])));
        let tensor = preprocessor.preprocess(&red).unwrap();
        assert!((tensor[[0, 100, 100, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 100, 100, 1]], 0.0);
        assert!((tensor[[0, 100, 100, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_grayscale_expanded() {
        let preprocessor = ImagePreprocessor::default();
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(30, 30, Luma([102u8])));
        let tensor = preprocessor.preprocess(&gray).unwrap();
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert!(tensor.iter().all(|&v| (v - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_degenerate_image_rejected() {
        let preprocessor = ImagePreprocessor::default();
        let err = preprocessor.preprocess(&DynamicImage::new_rgb8(0, 0)).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));
        assert_eq!(preprocessor.tracker().live_tensors(), 0);
    }

    #[test]
    fn test_oversized_image_rejected_before_allocation() {
        let tracker = TensorTracker::new();
        let preprocessor = ImagePreprocessor::new(tracker.clone());
        let wide = DynamicImage::new_rgb8(crate::image::loader::MAX_IMAGE_DIMENSION + 1, 4);

        let err = preprocessor.preprocess(&wide).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));
        assert_eq!(tracker.total_allocated(), 0);
    }

        #[test]
    fn test_only_output_tensor_survives() {
        let tracker = TensorTracker::new();
        let preprocessor = ImagePreprocessor::new(tracker.clone());

        let tensor = preprocessor.preprocess(&gradient_image(64, 48)).unwrap();
        assert_eq!(tracker.live_tensors(), 1);
        assert_eq!(tracker.live_bytes(), INPUT_SIZE * INPUT_SIZE * INPUT_CHANNELS * 4);
        assert!(tracker.total_allocated() > 1);

        drop(tensor);
        assert_eq!(tracker.live_tensors(), 0);
        assert_eq!(tracker.live_bytes(), 0);
    }
}
