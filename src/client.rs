//! Client operations
//!
//! Each operation builds one request, sends it through [`Conn::call`], and
//! extracts typed fields from the response. Listings are paginated one entry
//! per request so the whole listing reads from a single store revision.

use crate::error::{Result, RevtreeError};
use crate::network::Conn;
use crate::protocol::{Request, Response, Verb};
use crate::types::{basename, Event, FileInfo, FileRev, FLAG_DEL, FLAG_SET};

/// Pull a field the operation requires out of a response
fn required<T>(field: Option<T>, verb: Verb, name: &str) -> Result<T> {
    field.ok_or_else(|| RevtreeError::Decode(format!("{} response without {}", verb, name)))
}

impl Conn {
    // =========================================================================
    // Session
    // =========================================================================

    /// Authenticate the session with a secret token
    pub fn access(&self, token: &str) -> Result<()> {
        self.call(Request::new(Verb::Access).value(token.as_bytes()))?;
        Ok(())
    }

    /// Round trip with no effect on the store
    pub fn nop(&self) -> Result<()> {
        self.call(Request::new(Verb::Nop))?;
        Ok(())
    }

    /// Current revision of the store
    pub fn rev(&self) -> Result<i64> {
        let response = self.call(Request::new(Verb::Rev))?;
        required(response.rev, Verb::Rev, "rev")
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Write `body` to `path` unless it was modified after `old_rev`
    ///
    /// Pass [`REV_CLOBBER`](crate::protocol::REV_CLOBBER) to write
    /// unconditionally. Returns the revision of the write.
    pub fn set(&self, path: &str, old_rev: i64, body: &[u8]) -> Result<i64> {
        let request = Request::new(Verb::Set)
            .path(path)
            .value(body)
            .rev(Some(old_rev));
        let response = self.call(request)?;
        required(response.rev, Verb::Set, "rev")
    }

    /// Delete `path` unless it was modified after `rev`
    pub fn del(&self, path: &str, rev: i64) -> Result<()> {
        self.call(Request::new(Verb::Del).path(path).rev(Some(rev)))?;
        Ok(())
    }

    /// Body and file revision of `path` as of store revision `rev`
    ///
    /// `None` reads the current state.
    pub fn get(&self, path: &str, rev: Option<i64>) -> Result<(Vec<u8>, i64)> {
        let response = self.call(Request::new(Verb::Get).path(path).rev(rev))?;
        let file_rev = required(response.rev, Verb::Get, "rev")?;
        Ok((response.value.unwrap_or_default(), file_rev))
    }

    /// Length and revision of the entry at `path` as of store revision `rev`
    ///
    /// For a directory the length is its number of entries.
    pub fn stat(&self, path: &str, rev: Option<i64>) -> Result<(usize, FileRev)> {
        let response = self.call(Request::new(Verb::Stat).path(path).rev(rev))?;
        let len = required(response.len, Verb::Stat, "len")?;
        let file_rev = required(response.rev, Verb::Stat, "rev")?;
        Ok((len.max(0) as usize, FileRev::from_wire(file_rev)))
    }

    /// Metadata for the entry at `path` as of store revision `rev`
    ///
    /// Fails with [`RevtreeError::NotFound`] if nothing exists there.
    pub fn statinfo(&self, rev: i64, path: &str) -> Result<FileInfo> {
        let (len, file_rev) = self.stat(path, Some(rev))?;
        let (rev, is_dir) = match file_rev {
            FileRev::Missing => return Err(RevtreeError::NotFound(path.to_string())),
            FileRev::Dir => (0, true),
            FileRev::Rev(rev) => (rev, false),
        };

        Ok(FileInfo {
            name: basename(path).to_string(),
            len,
            rev,
            is_set: true,
            is_dir,
        })
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Names in `dir` at revision `rev`, in lexicographic order
    ///
    /// Reads up to `lim` names starting at position `off`. A negative `lim`
    /// reads to the end of the directory.
    pub fn getdir(&self, dir: &str, rev: i64, off: i32, lim: i32) -> Result<Vec<String>> {
        self.paginate(Verb::Getdir, dir, rev, off, lim, |response| {
            required(response.path, Verb::Getdir, "path")
        })
    }

    /// Metadata for entries in `dir` at revision `rev`
    ///
    /// Pagination works as in [`Conn::getdir`]. An entry whose metadata cannot
    /// be read is returned with only its name set.
    pub fn getdirinfo(&self, dir: &str, rev: i64, off: i32, lim: i32) -> Result<Vec<FileInfo>> {
        let names = self.getdir(dir, rev, off, lim)?;

        let prefix = if dir == "/" {
            dir.to_string()
        } else {
            format!("{}/", dir)
        };

        let infos = names
            .into_iter()
            .map(|name| {
                let path = format!("{}{}", prefix, name);
                match self.statinfo(rev, &path) {
                    Ok(info) => info,
                    Err(e) => {
                        tracing::debug!("stat of {} failed, listing name only: {}", path, e);
                        FileInfo {
                            name,
                            ..FileInfo::default()
                        }
                    }
                }
            })
            .collect();

        Ok(infos)
    }

    /// Entries matching `glob` at revision `rev`, in lexicographic order
    ///
    /// Pagination works as in [`Conn::getdir`].
    pub fn walk(&self, glob: &str, rev: i64, off: i32, lim: i32) -> Result<Vec<Event>> {
        self.paginate(Verb::Walk, glob, rev, off, lim, |response| {
            Ok(Event {
                rev: required(response.rev, Verb::Walk, "rev")?,
                path: required(response.path, Verb::Walk, "path")?,
                body: response.value.unwrap_or_default(),
                flag: required(response.flags, Verb::Walk, "flags")?,
            })
        })
    }

    /// Block until the first change to a path matching `glob` at or after `rev`
    pub fn wait(&self, glob: &str, rev: i64) -> Result<Event> {
        let response = self.call(Request::new(Verb::Wait).path(glob).rev(Some(rev)))?;
        let flags = required(response.flags, Verb::Wait, "flags")?;

        Ok(Event {
            rev: required(response.rev, Verb::Wait, "rev")?,
            path: required(response.path, Verb::Wait, "path")?,
            body: response.value.unwrap_or_default(),
            flag: flags & (FLAG_SET | FLAG_DEL),
        })
    }

    /// Issue one `verb` request per entry until `lim` runs out or the store
    /// reports the end of the listing
    fn paginate<T, F>(
        &self,
        verb: Verb,
        path: &str,
        rev: i64,
        mut off: i32,
        mut lim: i32,
        mut extract: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(Response) -> Result<T>,
    {
        let mut entries = Vec::new();

        while lim != 0 {
            let request = Request::new(verb).path(path).rev(Some(rev)).offset(off);
            let response = match self.call(request) {
                Ok(response) => response,
                Err(e) if e.is_range() => break,
                Err(e) => return Err(e),
            };

            entries.push(extract(response)?);
            lim = lim.saturating_sub(1);
            off = match off.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(entries)
    }
}
