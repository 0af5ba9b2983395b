pub mod brand_sentiment;
pub mod utils;
