//! 相机 - 基础设施层
//!
//! 持有唯一的图像来源，只暴露"拍一张"的能力。
//! 相机在进入扫描步骤时获取，离开时（成功、失败或提前返回）无条件释放。

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::CameraError;

/// JPEG 文件头
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// 图像来源
///
/// 职责：
/// - 产出一张 JPEG 静态帧
/// - 释放底层资源
/// - 不认识学生 / 答案
pub trait Camera: Send {
    fn capture(&mut self) -> impl Future<Output = Result<Vec<u8>, CameraError>> + Send;

    /// 停止所有底层资源
    fn release(&mut self);
}

/// 相机会话
///
/// 唯一的相机持有者，Drop 时释放相机
pub struct CameraSession<C: Camera> {
    camera: Option<C>,
}

impl<C: Camera> CameraSession<C> {
    pub fn new(camera: C) -> Self {
        Self {
            camera: Some(camera),
        }
    }

    /// 拍一张静态帧
    pub async fn capture(&mut self) -> Result<Vec<u8>, CameraError> {
        match self.camera.as_mut() {
            Some(camera) => camera.capture().await,
            None => Err(CameraError::Released),
        }
    }

    /// 提前释放相机
    pub fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }
    }
}

impl<C: Camera> Drop for CameraSession<C> {
    fn drop(&mut self) {
        self.release();
    }
}

/// 以图片文件作为“相机”
///
/// 命令行环境下由外部设备拍照，程序读取保存好的 JPEG
pub struct ImageFileCamera {
    path: PathBuf,
}

impl ImageFileCamera {
    /// 打开相机：检查图片是否存在
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CameraError> {
        let path = path.as_ref().to_path_buf();
        let path_str = path.display().to_string();

        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(CameraError::NotFound { path: path_str }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CameraError::NotFound { path: path_str })
            }
            Err(e) => return Err(CameraError::ReadFailed { path: path_str, source: e }),
        }

        info!("📷 相机已就绪: {}", path_str);
        Ok(Self { path })
    }
}

impl Camera for ImageFileCamera {
    async fn capture(&mut self) -> Result<Vec<u8>, CameraError> {
        let path_str = self.path.display().to_string();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CameraError::ReadFailed {
                path: path_str.clone(),
                source: e,
            })?;

        if !bytes.starts_with(&JPEG_MAGIC) {
            return Err(CameraError::NotJpeg { path: path_str });
        }

        debug!("拍摄完成: {} 字节", bytes.len());
        Ok(bytes)
    }

    fn release(&mut self) {
        debug!("📷 相机已释放: {}", self.path.display());
    }
}
