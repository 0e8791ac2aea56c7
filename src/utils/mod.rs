pub mod jwt;

pub use jwt::encode_access_token;
