pub mod orientation;
pub mod user;
pub mod video;

pub use orientation::{AspectRatio, Dimensions, OrientationClass, StoredAsset};
pub use user::{User, UserResponse};
pub use video::{CreateVideoRequest, VideoRecord, VideoResponse};
