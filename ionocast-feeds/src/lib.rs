//! Ionocast Feeds — provider adapters and the real-time assembly driver.
//!
//! Five independent upstream feeds (TechTIDE HF-INT activity, TechTIDE
//! ionosonde metrics, GFZ geomagnetic/solar indices, NOAA SWPC solar wind +
//! ring current, FMI IMAGE electrojet) are fetched in parallel, parsed into
//! `RawSeries`, and pushed through the `ionocast-core` transform chain to
//! yield one schema-exact feature row plus its availability score.
//!
//! Every adapter splits *fetch* (network, fallible, `FeedError`) from
//! *parse* (pure function of bytes/text) so tests run entirely on canned
//! payloads through the [`FeedSet`] seam.

mod archive;
pub mod assemble;
pub mod feed;
pub mod fmi;
pub mod gfz;
pub mod http;
pub mod noaa;
pub mod techtide;

pub use assemble::{assemble, Assembly, AssembleError, PipelineConfig};
pub use feed::{FeedError, FeedSet, FeedSource};
pub use http::HttpFeeds;
