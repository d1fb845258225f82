pub mod auth;
pub mod collection;
pub mod quiz;
pub mod recommendation;
pub mod release;

pub use auth::OAuthTokenSet;
pub use collection::{Artist, BasicInformation, CollectionItem, CollectionSnapshot, Format, Label, ReleaseFormat};
pub use quiz::{FormatChoice, QuizAnswers};
pub use recommendation::{FilterCriteria, Recommendation, ScoredItem};
pub use release::{Image, ReleaseData, TrackEntry};
