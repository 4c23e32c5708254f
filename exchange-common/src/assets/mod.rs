//! Asset identity and resolution of venue symbols.
//!
//! The global asset registry lives outside this crate; the history client
//! only needs the narrow [`AssetResolver`] seam. A symbol resolves to an
//! [`Asset`], or fails as either unknown (never heard of it) or unsupported
//! (known, but deliberately not tracked).

mod resolver;

pub use resolver::{
    default_binance_symbols, default_unsupported_binance_assets, Asset, AssetError,
    AssetResolver, BinanceAssetResolver,
};
