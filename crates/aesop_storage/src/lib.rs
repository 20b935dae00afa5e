//! File-based story document store.
//!
//! One UTF-8 JSON file per story, wrapped in an envelope that carries the
//! story's metadata (name, category, creation time, and the append-only list
//! of user edit requests that have touched it). Saving always backs up the
//! previous version to a timestamped sibling first, then overwrites the
//! current file atomically.
//!
//! # Example
//!
//! ```no_run
//! use aesop_core::{Stock, StoryDocument, Turn};
//! use aesop_storage::StoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StoryStore::new("./stories")?;
//!
//! let document = StoryDocument::try_from(vec![Turn {
//!     turn_number: 1,
//!     result: "A bakery opens".to_string(),
//!     news: "Prices rise".to_string(),
//!     news_tag: "all".to_string(),
//!     stocks: vec![Stock {
//!         name: "Bakery".to_string(),
//!         risk_level: "low".to_string(),
//!         description: String::new(),
//!         before_value: 100.0,
//!         current_value: 105.0,
//!         expectation: "stable".to_string(),
//!     }],
//! }])?;
//!
//! let outcome = store
//!     .save("Dragon Tale", "adventure", &document, Some("initial draft"))
//!     .await?;
//! println!("saved to {}", outcome.path.display());
//!
//! let stored = store.load("Dragon Tale").await?;
//! assert_eq!(stored.document().turns().len(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod store;
mod stored;

pub use aesop_error::{StorageError, StorageErrorKind};
pub use config::StoreConfig;
pub use store::{SaveOutcome, StoryStore};
pub use stored::{StoredStory, StoryMetadata, StorySummary};
