#![doc(issue_tracker_base_url = "https://github.com/stuartray/skylane/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub use skylane_pipeline::*;
pub use skylane_wire::{Packet, TrafficClass};

pub use skylane_sim as sim;
