#![doc(issue_tracker_base_url = "https://github.com/stuartray/skylane/issues/")]

mod backoff;
pub use backoff::Backoff;

mod padded;
pub use padded::CachePadded;
