//! 对 `histo_berry::dataset` 的更一层封装. 提供更直接的数据集加载器.

use histo_berry::dataset::{self, SliceLoader};
use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// 获取脑切片图像基本路径.
///
/// 1. 若环境变量 `$HISTO_MRI_IMAGES_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/histo_mri/images`.
pub fn images_dir_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("HISTO_MRI_IMAGES_DIR") {
        PathBuf::from(d)
    } else {
        dataset::home_images_dir().unwrap()
    }
}

/// 获取脑切片配置加载器.
pub fn slice_loader<P: AsRef<Path>>(path: P) -> io::Result<SliceLoader> {
    dataset::slice_loader(path)
}

/// 从 `$HISTO_MRI_IMAGES_DIR` 或者 `$HOME/histo_mri/images` 下加载脑切片配置加载器.
#[inline]
pub fn slice_loader_from_env_or_home() -> io::Result<SliceLoader> {
    slice_loader(images_dir_from_env_or_home())
}
