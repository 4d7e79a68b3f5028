//! Credential broker controller: keeps access-token resources consistent with secret material held
//! in an external store, validates them through pluggable service providers, and releases them
//! once no workload binding references them.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod cluster;
pub mod config;
pub mod controller;
pub mod error;
pub mod oauth;
pub mod obs;
pub mod operator;
pub mod provider;
pub mod runtime;
pub mod storage;
pub mod token;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, ErrorKind, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
