//! Crypto backend implementations
pub mod openssl;
