pub mod auth_flow;
pub mod collection;
pub mod details;
pub mod oauth;
pub mod recommend;
pub mod token_store;
pub mod transport;

pub use auth_flow::{AuthFlowController, PendingAuthorization};
pub use collection::CollectionFetcher;
pub use details::ReleaseDetailFetcher;
pub use oauth::OAuthSigner;
pub use token_store::{MemoryTokenStore, TokenStore};
pub use transport::{ReqwestTransport, Transport};
