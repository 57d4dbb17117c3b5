pub mod assets;
pub mod build_info;
pub mod feed_msg;
pub mod path;
pub mod response;
