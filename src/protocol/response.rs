//! Response rendering
//!
//! Each response variant has a fixed textual form: records terminated by
//! `\n`, blocks closed by a blank line where the protocol requires it.

use std::io::{self, Write};

/// Capability advertisement. Flags render in a fixed order; disabled
/// capabilities are omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub import: bool,
    pub export: bool,
    pub push: bool,
    pub fetch: bool,
    pub connect: bool,
    pub stateless_connect: bool,
    pub check_connectivity: bool,
    pub get: bool,
    pub bidi_import: bool,
    pub signed_tags: bool,
    pub object_format: bool,
    pub no_private_update: bool,
    pub progress: bool,
    pub option: bool,
    pub refspec: Option<String>,
    pub export_marks: Option<String>,
    pub import_marks: Option<String>,
}

impl Capabilities {
    fn flags(&self) -> [(&'static str, bool); 14] {
        [
            ("import", self.import),
            ("export", self.export),
            ("push", self.push),
            ("fetch", self.fetch),
            ("connect", self.connect),
            ("stateless-connect", self.stateless_connect),
            ("check-connectivity", self.check_connectivity),
            ("get", self.get),
            ("bidi-import", self.bidi_import),
            ("signed-tags", self.signed_tags),
            ("object-format", self.object_format),
            ("no-private-update", self.no_private_update),
            ("progress", self.progress),
            ("option", self.option),
        ]
    }
}

/// What a listed ref points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListValue {
    /// `<sha> <name>`
    Sha(String),
    /// `@<target> <name>`
    Symref(String),
    /// `? <name>`
    Unknown,
    /// `:<key> <value> ... <name>`
    Keywords(Vec<(String, String)>),
}

/// One line of a `list` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRef {
    pub value: ListValue,
    pub name: String,
    pub attributes: Vec<String>,
}

impl ListedRef {
    pub fn sha(sha: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            value: ListValue::Sha(sha.into()),
            name: name.into(),
            attributes: Vec::new(),
        }
    }
}

/// Outcome of an `option` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionStatus {
    Ok,
    Unsupported,
    Error(String),
}

/// Outcome of a `fetch` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Complete,
    Lock(String),
    ConnectivityOk,
}

/// One per-refspec result of a `push` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushResult {
    Ok { dst: String },
    Error { dst: String, why: Option<String> },
}

/// Outcome of a `connect` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectResult {
    Established,
    Fallback,
}

/// A renderable response block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Capabilities(Capabilities),
    List(Vec<ListedRef>),
    Option(OptionStatus),
    Fetch(FetchResult),
    Push(Vec<PushResult>),
    Connect(ConnectResult),
}

impl Response {
    /// Write the response in its wire form.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Response::Capabilities(caps) => {
                writeln!(out, "capabilities")?;
                for (name, enabled) in caps.flags() {
                    if enabled {
                        writeln!(out, "{name}")?;
                    }
                }
                if let Some(refspec) = &caps.refspec {
                    writeln!(out, "refspec {refspec}")?;
                }
                if let Some(file) = &caps.export_marks {
                    writeln!(out, "export-marks {file}")?;
                }
                if let Some(file) = &caps.import_marks {
                    writeln!(out, "import-marks {file}")?;
                }
                writeln!(out)
            }
            Response::List(refs) => {
                for entry in refs {
                    match &entry.value {
                        ListValue::Sha(sha) => write!(out, "{sha} {}", entry.name)?,
                        ListValue::Symref(target) => write!(out, "@{target} {}", entry.name)?,
                        ListValue::Unknown => write!(out, "? {}", entry.name)?,
                        ListValue::Keywords(pairs) => {
                            for (key, value) in pairs {
                                write!(out, ":{key} {value} ")?;
                            }
                            write!(out, "{}", entry.name)?;
                        }
                    }
                    for attribute in &entry.attributes {
                        write!(out, " {attribute}")?;
                    }
                    writeln!(out)?;
                }
                writeln!(out)
            }
            Response::Option(status) => match status {
                OptionStatus::Ok => writeln!(out, "ok"),
                OptionStatus::Unsupported => writeln!(out, "unsupported"),
                OptionStatus::Error(message) => writeln!(out, "error {message}"),
            },
            Response::Fetch(result) => match result {
                FetchResult::Complete => writeln!(out),
                FetchResult::Lock(path) => writeln!(out, "lock {path}"),
                FetchResult::ConnectivityOk => writeln!(out, "connectivity-ok"),
            },
            Response::Push(results) => {
                for result in results {
                    match result {
                        PushResult::Ok { dst } => writeln!(out, "ok {dst}")?,
                        PushResult::Error { dst, why } => match why {
                            Some(why) => writeln!(out, "error {dst} {why}")?,
                            None => writeln!(out, "error {dst}")?,
                        },
                    }
                }
                writeln!(out)
            }
            Response::Connect(result) => match result {
                ConnectResult::Established => writeln!(out),
                ConnectResult::Fallback => writeln!(out, "fallback"),
            },
        }
    }

    /// Render to a string, for logs and tests.
    pub fn to_wire(&self) -> String {
        let mut buf = Vec::new();
        self.render(&mut buf).expect("rendering to Vec cannot fail");
        String::from_utf8(buf).expect("responses are valid UTF-8")
    }
}
