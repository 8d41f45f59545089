mod thumbnails;

pub use thumbnails::{BatchSettings, ThumbnailService};
