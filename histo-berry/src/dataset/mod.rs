//! 脑切片数据集操作.
//!
//! 每个脑切片 (如 `TG03`, `WT05`) 在磁盘上是一个目录, 内含若干配准到同一
//! 坐标系的模态 nii 文件 (`t1.nii`, `t2s.nii`, ...) 和一张组织学照片
//! (`histo.png`). [`BrainSlice`] 把这些路径收敛为一个显式的只读配置结构,
//! 由各算法按需读取; 算法之间不共享任何全局状态.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 一个脑切片的只读路径配置.
///
/// 模态映射按名字升序保存, 迭代顺序稳定.
#[derive(Debug, Clone)]
pub struct BrainSlice {
    name: String,
    modalities: Vec<(String, PathBuf)>,
    histo: PathBuf,
}

impl BrainSlice {
    /// 直接由各路径创建配置.
    ///
    /// `modalities` 不允许为空, 也不允许出现重名模态, 否则程序 panic.
    pub fn new<S, I>(name: S, modalities: I, histo: PathBuf) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        let mut modalities: Vec<_> = modalities.into_iter().collect();
        assert!(!modalities.is_empty(), "模态映射不允许为空");
        modalities.sort_by(|a, b| a.0.cmp(&b.0));
        assert!(
            modalities.windows(2).all(|w| w[0].0 != w[1].0),
            "模态映射不允许重名"
        );

        Self {
            name: name.into(),
            modalities,
            histo,
        }
    }

    /// 扫描目录布局, 收集其中所有 nii 模态文件和组织学照片.
    ///
    /// 模态名取 nii 文件的主文件名; 组织学照片取目录下的 `histo.png`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());

        let mut modalities = Vec::with_capacity(4);
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "nii") {
                let stem = path
                    .file_stem()
                    .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
                modalities.push((stem, path));
            }
        }
        if modalities.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("`{}` 下没有任何 nii 模态文件", dir.display()),
            ));
        }

        let histo = dir.join("histo.png");
        if !histo.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("`{}` 下没有组织学照片 histo.png", dir.display()),
            ));
        }

        Ok(Self::new(name, modalities, histo))
    }

    /// 切片名 (一般为动物编号, 如 `TG03`).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 按名字查找模态文件路径.
    pub fn modality_path(&self, modality: &str) -> Option<&Path> {
        self.modalities
            .iter()
            .find(|(m, _)| m == modality)
            .map(|(_, p)| p.as_path())
    }

    /// 按名字升序迭代 (模态名, 路径).
    #[inline]
    pub fn modalities(&self) -> impl ExactSizeIterator<Item = (&str, &Path)> {
        self.modalities
            .iter()
            .map(|(m, p)| (m.as_str(), p.as_path()))
    }

    /// 模态个数. 保证非零.
    #[inline]
    pub fn modality_len(&self) -> usize {
        self.modalities.len()
    }

    /// 组织学照片路径.
    #[inline]
    pub fn histo_path(&self) -> &Path {
        &self.histo
    }
}

/// 从指定根目录创建脑切片配置加载器. 返回的加载器按目录名升序迭代
/// `path` 的所有直接子目录, 并对每个子目录尝试构造 [`BrainSlice`].
///
/// # 注意
///
/// `path` 必须是目录, 否则程序 panic.
pub fn slice_loader<P: AsRef<Path>>(path: P) -> io::Result<SliceLoader> {
    let path = path.as_ref();
    assert!(path.is_dir());

    let mut dirs_rev: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs_rev.sort();
    dirs_rev.reverse();

    Ok(SliceLoader { dirs_rev })
}

/// 脑切片配置加载器.
#[derive(Debug)]
pub struct SliceLoader {
    dirs_rev: Vec<PathBuf>,
}

impl Iterator for SliceLoader {
    type Item = (PathBuf, io::Result<BrainSlice>);

    fn next(&mut self) -> Option<Self::Item> {
        let dir = self.dirs_rev.pop()?;
        let slice = BrainSlice::from_dir(&dir);
        Some((dir, slice))
    }
}

impl ExactSizeIterator for SliceLoader {
    #[inline]
    fn len(&self) -> usize {
        self.dirs_rev.len()
    }
}

/// 获取 `{用户主目录}/histo_mri/images` 目录.
pub fn home_images_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("histo_mri");
    ans.push("images");
    Some(ans)
}

/// 获取 `{用户主目录}/histo_mri/images` 目录下给定继续项组成的全路径.
pub fn home_images_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_images_dir()?;
    ans.extend(it);
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::BrainSlice;
    use std::path::PathBuf;

    fn slice_of(names: &[&str]) -> BrainSlice {
        BrainSlice::new(
            "TG03",
            names
                .iter()
                .map(|m| (m.to_string(), PathBuf::from(format!("{m}.nii")))),
            PathBuf::from("histo.png"),
        )
    }

    #[test]
    fn test_modalities_sorted_and_looked_up() {
        let s = slice_of(&["t2s", "t1", "pd"]);
        let order: Vec<&str> = s.modalities().map(|(m, _)| m).collect();
        assert_eq!(order, ["pd", "t1", "t2s"]);
        assert_eq!(s.modality_len(), 3);

        assert_eq!(
            s.modality_path("t1").unwrap(),
            PathBuf::from("t1.nii").as_path()
        );
        assert!(s.modality_path("flair").is_none());
    }

    #[test]
    #[should_panic(expected = "模态映射不允许为空")]
    fn test_empty_modalities_rejected() {
        let _ = BrainSlice::new("WT04", [], PathBuf::from("histo.png"));
    }

    #[test]
    #[should_panic(expected = "模态映射不允许重名")]
    fn test_duplicated_modalities_rejected() {
        let _ = slice_of(&["t1", "t1"]);
    }
}
