use crate::utils::error::ClassifierError;
use crate::Result;
use ndarray::Array3;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 双线性插值缩放到固定尺寸（直接拉伸，不保持宽高比）
    ///
    /// 采样坐标为 `dst * (src_len / dst_len)`，越界的邻居钳制到最后一行/列。
    pub fn resize_bilinear(
        image: &Array3<f32>,
        target_height: usize,
        target_width: usize,
    ) -> Result<Array3<f32>> {
        let (orig_h, orig_w, channels) = image.dim();

        if orig_h == 0 || orig_w == 0 {
            return Err(ClassifierError::InvalidInput(format!(
                "Cannot resize degenerate image: {}x{}",
                orig_w, orig_h
            )));
        }
        if target_height == 0 || target_width == 0 {
            return Err(ClassifierError::InvalidInput(format!(
                "Invalid resize target: {}x{}",
                target_width, target_height
            )));
        }

        let scale_h = orig_h as f32 / target_height as f32;
        let scale_w = orig_w as f32 / target_width as f32;

        let mut resized = Array3::<f32>::zeros((target_height, target_width, channels));

        for h in 0..target_height {
            let src_h = h as f32 * scale_h;
            let h1 = (src_h.floor() as usize).min(orig_h - 1);
            let h2 = (h1 + 1).min(orig_h - 1);
            let dh = src_h - h1 as f32;

            for w in 0..target_width {
                let src_w = w as f32 * scale_w;
                let w1 = (src_w.floor() as usize).min(orig_w - 1);
                let w2 = (w1 + 1).min(orig_w - 1);
                let dw = src_w - w1 as f32;

                for c in 0..channels {
                    let v11 = image[[h1, w1, c]];
                    let v12 = image[[h1, w2, c]];
                    let v21 = image[[h2, w1, c]];
                    let v22 = image[[h2, w2, c]];

                    let top = v11 + (v12 - v11) * dw;
                    let bottom = v21 + (v22 - v21) * dw;
                    resized[[h, w, c]] = top + (bottom - top) * dh;
                }
            }
        }

        Ok(resized)
    }
}
