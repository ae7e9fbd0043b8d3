//! 对象的磁盘持久化.
//!
//! 采用 bincode 紧凑二进制编码, 格式只保证同版本进程间互通.
//! 超大负载按每块 `2^31 - 1` 字节分块写出, 规避部分平台的
//! 单次写入上限; 分块与一次性写出的文件内容完全一致.

use crate::consts::MAX_WRITE_BYTES;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// 持久化过程可能出现的错误.
#[derive(Debug)]
pub enum PersistError {
    /// 路径不存在或不是常规文件.
    NotAFile(PathBuf),
    /// 底层 I/O 失败.
    Io(io::Error),
    /// 编解码失败.
    Codec(bincode::Error),
}

impl From<io::Error> for PersistError {
    #[inline]
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for PersistError {
    #[inline]
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e)
    }
}

/// 本模块专用 `Result` 类型.
pub type PersistResult<T> = Result<T, PersistError>;

/// 将对象序列化到 `path`. 目标文件已存在时无条件覆盖.
pub fn save_object<T, P>(obj: &T, path: P) -> PersistResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let bytes = bincode::serialize(obj)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(&bytes)?;
    Ok(())
}

/// 按 `chunk` 字节分块写出全部数据.
fn write_chunks<W: Write>(
    writer: &mut W,
    bytes: &[u8],
    chunk: usize,
) -> io::Result<()> {
    for part in bytes.chunks(chunk) {
        writer.write_all(part)?;
    }
    Ok(())
}

/// 同 [`save_object`], 但按块写出, 适合序列化后体积极大的对象.
pub fn save_object_chunked<T, P>(obj: &T, path: P) -> PersistResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let bytes = bincode::serialize(obj)?;
    let mut file = File::create(path.as_ref())?;
    write_chunks(&mut file, &bytes, MAX_WRITE_BYTES)?;
    Ok(())
}

/// 从 `path` 反序列化对象.
///
/// # 注意
///
/// 反序列化不可信来源的数据是危险的, 调用方必须信任文件出处.
///
/// # 返回值
///
/// `path` 不存在或不是常规文件时返回 [`PersistError::NotAFile`].
pub fn load_object<T, P>(path: P) -> PersistResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PersistError::NotAFile(path.to_path_buf()));
    }
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    Ok(bincode::deserialize(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::{
        load_object, save_object, save_object_chunked, write_chunks,
        PersistError,
    };
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        weights: Vec<f64>,
        tags: Vec<(String, i32)>,
    }

    fn sample() -> Sample {
        Sample {
            name: "slice-07".into(),
            weights: vec![0.25, -1.5, 3.75],
            tags: vec![("t1".into(), 1), ("t2".into(), 2)],
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");

        save_object(&sample(), &path).unwrap();
        let loaded: Sample = load_object(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_chunked_write_matches_plain() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.bin");
        let chunked = dir.path().join("chunked.bin");

        save_object(&sample(), &plain).unwrap();
        save_object_chunked(&sample(), &chunked).unwrap();
        assert_eq!(
            std::fs::read(&plain).unwrap(),
            std::fs::read(&chunked).unwrap()
        );
    }

    #[test]
    fn test_small_chunks_preserve_bytes() {
        // 强制多块写出, 结果必须与原始字节一致.
        let bytes: Vec<u8> = (0..=255).collect();
        let mut out = Vec::new();
        write_chunks(&mut out, &bytes, 7).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");
        let err = load_object::<Sample, _>(&path).unwrap_err();
        assert!(matches!(err, PersistError::NotAFile(p) if p == path));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.bin");

        save_object(&42_u64, &path).unwrap();
        save_object(&7_u64, &path).unwrap();
        assert_eq!(load_object::<u64, _>(&path).unwrap(), 7);
    }
}
