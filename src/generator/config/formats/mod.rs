pub mod clash;
pub mod links;
pub mod loon;
pub mod singbox;
