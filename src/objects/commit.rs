//! Commit objects.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use super::oid::Oid;
use super::store::{LooseObjectStore, ObjectType, RawObject};
use crate::error::{Error, Result};

/// A signature representing an author or committer.
///
/// Contains the name, email, timestamp, and timezone offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    email: String,
    /// Unix timestamp (seconds since epoch).
    timestamp: i64,
    /// Timezone offset in minutes (e.g., +0900 = 540, -0500 = -300).
    tz_offset: i32,
}

impl Signature {
    /// Creates a new Signature.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the person.
    /// * `email` - The email address.
    /// * `timestamp` - Unix timestamp (seconds since epoch).
    /// * `tz_offset` - Timezone offset in minutes.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: i64,
        tz_offset: i32,
    ) -> Self {
        Signature {
            name: name.into(),
            email: email.into(),
            timestamp,
            tz_offset,
        }
    }

    /// Creates a UTC signature stamped with the current time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Signature::new(name, email, timestamp, 0)
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the Unix timestamp.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the timezone offset in minutes.
    pub fn tz_offset(&self) -> i32 {
        self.tz_offset
    }

    /// Parses `Name <email> timestamp timezone`.
    fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidObject {
            oid: String::new(),
            reason: format!("malformed signature: {}", s),
        };

        let email_start = s.find('<').ok_or_else(invalid)?;
        let email_end = s.rfind('>').ok_or_else(invalid)?;
        if email_start >= email_end {
            return Err(invalid());
        }

        let name = s[..email_start].trim().to_string();
        let email = s[email_start + 1..email_end].to_string();

        let mut parts = s[email_end + 1..].split_whitespace();
        let timestamp: i64 = parts
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(invalid)?;
        let tz_offset = parts
            .next()
            .and_then(parse_timezone)
            .ok_or_else(invalid)?;

        Ok(Signature {
            name,
            email,
            timestamp,
            tz_offset,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tz_offset < 0 { '-' } else { '+' };
        let minutes = self.tz_offset.abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.timestamp,
            sign,
            minutes / 60,
            minutes % 60
        )
    }
}

/// Parses a timezone string like "+0900" or "-0500" into minutes offset.
fn parse_timezone(s: &str) -> Option<i32> {
    if s.len() != 5 || !s.is_ascii() {
        return None;
    }

    let sign = match &s[..1] {
        "+" => 1,
        "-" => -1,
        _ => return None,
    };

    let hours: i32 = s[1..3].parse().ok()?;
    let minutes: i32 = s[3..5].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

/// A commit: a tree snapshot plus its parents and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    oid: Oid,
    tree: Oid,
    /// Parent commit(s). Empty for root commits.
    parents: Vec<Oid>,
    author: Signature,
    committer: Signature,
    message: String,
}

impl Commit {
    /// Parses a Commit from a RawObject with its OID.
    ///
    /// Commit format:
    /// ```text
    /// tree <sha1>
    /// parent <sha1>  (zero or more)
    /// author <signature>
    /// committer <signature>
    ///
    /// <message>
    /// ```
    ///
    /// Everything after the first empty line is the message, byte for byte.
    /// A missing committer line falls back to the author.
    pub fn parse(oid: Oid, raw: RawObject) -> Result<Self> {
        if raw.object_type != ObjectType::Commit {
            return Err(Error::TypeMismatch {
                expected: "commit",
                actual: raw.object_type.as_str(),
            });
        }

        let content = std::str::from_utf8(&raw.content).map_err(|_| Error::InvalidUtf8)?;
        let invalid = |reason: &str| Error::InvalidObject {
            oid: oid.to_hex(),
            reason: reason.to_string(),
        };

        let mut tree: Option<Oid> = None;
        let mut parents = Vec::new();
        let mut author: Option<Signature> = None;
        let mut committer: Option<Signature> = None;
        let mut message = "";

        let mut rest = content;
        loop {
            let (line, tail) = match rest.split_once('\n') {
                Some((line, tail)) => (line, Some(tail)),
                None => (rest, None),
            };

            if line.is_empty() {
                message = tail.unwrap_or("");
                break;
            }

            if let Some(value) = line.strip_prefix("tree ") {
                tree = Some(Oid::from_hex(value)?);
            } else if let Some(value) = line.strip_prefix("parent ") {
                parents.push(Oid::from_hex(value)?);
            } else if let Some(value) = line.strip_prefix("author ") {
                author = Some(Signature::parse(value)?);
            } else if let Some(value) = line.strip_prefix("committer ") {
                committer = Some(Signature::parse(value)?);
            }

            match tail {
                Some(tail) => rest = tail,
                None => break,
            }
        }

        let tree = tree.ok_or_else(|| invalid("missing tree"))?;
        let author = author.ok_or_else(|| invalid("missing author"))?;
        let committer = committer.unwrap_or_else(|| author.clone());

        Ok(Commit {
            oid,
            tree,
            parents,
            author,
            committer,
            message: message.to_string(),
        })
    }

    /// Returns the id of this commit.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Returns the tree object ID.
    pub fn tree(&self) -> &Oid {
        &self.tree
    }

    /// Returns the parent commit IDs.
    pub fn parents(&self) -> &[Oid] {
        &self.parents
    }

    /// Returns the first parent, if any.
    pub fn parent(&self) -> Option<&Oid> {
        self.parents.first()
    }

    /// Returns the author signature.
    pub fn author(&self) -> &Signature {
        &self.author
    }

    /// Returns the committer signature.
    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    /// Returns the full commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the first line of the commit message (the summary).
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Returns true if this is a root commit (no parents).
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns true if this is a merge commit (multiple parents).
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Serializes commit metadata into a commit payload.
pub fn encode_commit(
    tree: &Oid,
    parents: &[Oid],
    author: &Signature,
    committer: &Signature,
    message: &str,
) -> Vec<u8> {
    let mut out = format!("tree {}\n", tree);
    for parent in parents {
        out.push_str(&format!("parent {}\n", parent));
    }
    out.push_str(&format!("author {}\n", author));
    out.push_str(&format!("committer {}\n", committer));
    out.push('\n');
    out.push_str(message);
    out.into_bytes()
}

/// Encodes and stores a commit, returning its id.
///
/// Parents are not checked for existence.
pub fn write_commit(
    store: &LooseObjectStore<'_>,
    tree: &Oid,
    parents: &[Oid],
    author: &Signature,
    committer: &Signature,
    message: &str,
) -> Result<Oid> {
    let payload = encode_commit(tree, parents, author, committer, message);
    store.write(ObjectType::Commit, &payload)
}

/// Loads and parses a commit.
pub fn read_commit(store: &LooseObjectStore<'_>, oid: &Oid) -> Result<Commit> {
    Commit::parse(*oid, store.read(oid)?)
}
