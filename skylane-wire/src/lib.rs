#![doc(issue_tracker_base_url = "https://github.com/stuartray/skylane/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod class;
pub use class::TrafficClass;

mod packet;
pub use packet::Packet;
