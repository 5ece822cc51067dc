//! Remote-helper wire protocol
//!
//! The line-oriented command/response dialect of gitremote-helpers(7):
//! commands arrive on stdin, responses leave on stdout.

pub mod command;
pub mod response;

pub use command::Command;
pub use response::{
    Capabilities, ConnectResult, FetchResult, ListValue, ListedRef, OptionStatus, PushResult,
    Response,
};
