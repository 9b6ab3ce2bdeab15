mod singbox;

pub use singbox::{parse_singbox_json, SingBoxOutbound};
