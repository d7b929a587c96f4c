pub use formpost_conf::*;
