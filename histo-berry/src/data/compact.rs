//! 掩膜的压缩存储.

use super::VolumeMask;
use crate::Idx3d;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::Array3;
use std::io::{Read, Write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 压缩存储的 [`VolumeMask`]; 不透明类型.
///
/// 掩膜的前景占比通常很低, zlib 压缩率可观, 适合长期归档.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactMask {
    /// 压缩的不透明字节流.
    buf: Vec<u8>,

    /// 形状.
    sh: Idx3d,
}

impl VolumeMask {
    /// 压缩数据.
    pub fn compress(&self) -> CompactMask {
        let bytes: Vec<u8> = self.data().iter().map(|&p| p as u8).collect();
        let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
        e.write_all(bytes.as_slice()).expect("Compression error");
        CompactMask {
            buf: e.finish().expect("Compression error"),
            sh: self.shape(),
        }
    }
}

impl CompactMask {
    /// 解压缩数据.
    pub fn decompress(self) -> VolumeMask {
        let Self { buf, sh } = self;
        let mut d = ZlibDecoder::new(buf.as_slice());
        let mut bytes = Vec::with_capacity(sh.0 * sh.1 * sh.2);
        d.read_to_end(&mut bytes).expect("Decompression error");

        let data = bytes.into_iter().map(|b| b != 0).collect();
        // 长度与形状一致由压缩端保证, 可直接 unwrap.
        VolumeMask::new(Array3::from_shape_vec(sh, data).unwrap())
    }

    /// 压缩后字节数.
    #[inline]
    pub fn compressed_len(&self) -> usize {
        self.buf.len()
    }
}
