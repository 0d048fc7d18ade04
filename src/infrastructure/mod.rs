//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（相机），只暴露能力

pub mod camera;

pub use camera::{Camera, CameraSession, ImageFileCamera};
