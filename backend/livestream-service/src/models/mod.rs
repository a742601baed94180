pub mod livecomment;
pub mod livestream;
pub mod ngword;
pub mod reaction;
pub mod report;
pub mod stats;
pub mod tag;
pub mod user;
pub mod viewer;

pub use livecomment::*;
pub use livestream::*;
pub use ngword::*;
pub use reaction::*;
pub use report::*;
pub use stats::*;
pub use tag::Tag;
pub use user::*;
pub use viewer::*;
