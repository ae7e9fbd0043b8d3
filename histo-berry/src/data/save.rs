//! 掩膜的持久化存储 (诊断侧通道).
//!
//! 掩膜提取的中间结果常需人工核对; 这里提供可复现的落盘形式:
//! 单层切片保存为灰度 png, 整体掩膜保存为 npy.
//! 这些写出操作均不影响算法返回值.

use super::VolumeMask;
use image::ImageResult;
use ndarray_npy::{write_npy, WriteNpyError};
use std::path::Path;

/// 前景像素的可视化灰度值.
const FOREGROUND: u8 = 0b_1111_1111;

/// 背景像素的可视化灰度值.
const BACKGROUND: u8 = 0b_0000_0000;

impl VolumeMask {
    /// 将第 `z_index` 层切片保存为灰度 png. 前景为白色, 背景为黑色.
    ///
    /// 当 `z_index` 越界时 panic.
    pub fn save_slice_png<P: AsRef<Path>>(&self, path: P, z_index: usize) -> ImageResult<()> {
        let (_, height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &p) in self.data().index_axis(ndarray::Axis(0), z_index).indexed_iter() {
            let gray = if p { FOREGROUND } else { BACKGROUND };
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }

    /// 将整个掩膜按原样保存为 npy 文件.
    #[inline]
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteNpyError> {
        write_npy(path, &self.data())
    }
}

#[cfg(test)]
mod tests {
    use crate::VolumeMask;
    use ndarray::Array3;

    #[test]
    fn test_save_npy_roundtrip() {
        let mut raw = Array3::from_elem((1, 2, 2), false);
        raw[(0, 0, 1)] = true;
        let mask = VolumeMask::new(raw.clone());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.npy");
        mask.save_npy(&path).unwrap();

        let loaded: Array3<bool> = ndarray_npy::read_npy(&path).unwrap();
        assert_eq!(loaded, raw);
    }

    #[test]
    fn test_save_slice_png() {
        let mut raw = Array3::from_elem((1, 2, 3), false);
        raw[(0, 1, 2)] = true;
        let mask = VolumeMask::new(raw);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        mask.save_slice_png(&path, 0).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0[0], u8::MAX);
        assert_eq!(img.get_pixel(0, 0).0[0], u8::MIN);
    }
}
